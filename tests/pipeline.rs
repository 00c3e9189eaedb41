//! Pipeline tests: login, cookie bridge, route gate, and SSO link issuance
//! driven through the full router against a scripted session store double.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header::{COOKIE, LOCATION, SET_COOKIE},
        Request, Response, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use hubgate::api;
use hubgate::api::handlers::auth::{AuthConfig, AuthState};
use hubgate::store::{Session, SessionStore, StoreError, StoreUser};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tower::ServiceExt;
use uuid::Uuid;

const VALID_ACCESS: &str = "valid-access";
const VALID_REFRESH: &str = "valid-refresh";
const ROTATED_ACCESS: &str = "rotated-access";
const ROTATED_REFRESH: &str = "rotated-refresh";
const PASSWORD: &str = "correct-horse-battery-staple";

/// Session store double scripted for one user, counting mint and revoke
/// calls so tests can assert what was (not) requested upstream.
struct ScriptedStore {
    user: StoreUser,
    mint_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl ScriptedStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            user: StoreUser {
                id: Uuid::new_v4(),
                email: "alice@example.com".to_string(),
            },
            mint_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        })
    }

    fn session(&self, access: &str, refresh: &str) -> Session {
        Session {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_in: 3600,
            user: self.user.clone(),
        }
    }
}

#[async_trait]
impl SessionStore for ScriptedStore {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, StoreError> {
        if email == self.user.email && password == PASSWORD {
            Ok(self.session(VALID_ACCESS, VALID_REFRESH))
        } else {
            Err(StoreError::Unauthorized(
                "Invalid login credentials".to_string(),
            ))
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<StoreUser, StoreError> {
        if access_token == VALID_ACCESS || access_token == ROTATED_ACCESS {
            Ok(self.user.clone())
        } else {
            Err(StoreError::Unauthorized("invalid JWT".to_string()))
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, StoreError> {
        if refresh_token == VALID_REFRESH {
            Ok(self.session(ROTATED_ACCESS, ROTATED_REFRESH))
        } else {
            Err(StoreError::Unauthorized("invalid refresh token".to_string()))
        }
    }

    async fn create_sso_link(
        &self,
        access_token: &str,
        app_slug: &str,
        redirect_path: &str,
    ) -> Result<String, StoreError> {
        let ticket = self.mint_calls.fetch_add(1, Ordering::SeqCst);
        if access_token != VALID_ACCESS && access_token != ROTATED_ACCESS {
            return Err(StoreError::Unauthorized("invalid JWT".to_string()));
        }
        if app_slug == "unknown" {
            return Err(StoreError::Upstream("app not registered".to_string()));
        }
        Ok(format!(
            "https://{app_slug}.apps.hub.tld/sso?ticket=t{ticket}&redir={redirect_path}"
        ))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), StoreError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn app(store: Arc<ScriptedStore>) -> Router {
    api::router(Arc::new(AuthState::new(
        AuthConfig::new("https://hub.tld".to_string()),
        store,
    )))
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request")
}

fn get_with_cookies(path: &str, cookies: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(COOKIE, cookies)
        .body(Body::empty())
        .expect("request")
}

fn post_json(path: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn post_json_with_cookies(path: &str, body: &Value, cookies: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .header(COOKIE, cookies)
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collected")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Collapse a response's Set-Cookie headers into a Cookie header for the
/// next request, the way a browser would.
fn cookie_jar(response: &Response<Body>) -> String {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

fn set_cookie_count(response: &Response<Body>) -> usize {
    response.headers().get_all(SET_COOKIE).iter().count()
}

#[tokio::test]
async fn protected_path_without_cookies_redirects_to_login() {
    let app = app(ScriptedStore::new());

    let response = app.oneshot(get("/admin/apps")).await.expect("response");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirectedFrom=%2Fadmin%2Fapps");
}

#[tokio::test]
async fn protected_root_without_cookies_redirects_to_login() {
    let app = app(ScriptedStore::new());

    let response = app.oneshot(get("/")).await.expect("response");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirectedFrom=%2F");
}

#[tokio::test]
async fn public_paths_pass_through_without_session() {
    let store = ScriptedStore::new();

    for path in [
        "/login",
        "/password-forgot",
        "/password-reset/confirm",
        "/auth/callback",
    ] {
        let response = app(store.clone())
            .oneshot(get(path))
            .await
            .expect("response");
        // Nothing serves these paths here; the point is the gate lets the
        // request through to the 404 fallback instead of redirecting.
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {path}");
        assert!(response.headers().get(LOCATION).is_none(), "path {path}");
    }

    let response = app(store.clone())
        .oneshot(get("/health"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(store)
        .oneshot(get("/v1/openapi.json"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn gate_redirects_on_invalid_session_cookies() {
    let app = app(ScriptedStore::new());

    let response = app
        .oneshot(get_with_cookies(
            "/admin/apps",
            "hubgate_access=garbage; hubgate_refresh=garbage",
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirectedFrom=%2Fadmin%2Fapps");
}

#[tokio::test]
async fn bridge_then_gate_allows_protected_path() {
    let store = ScriptedStore::new();

    let response = app(store.clone())
        .oneshot(post_json(
            "/v1/auth/cookies",
            &json!({ "access_token": VALID_ACCESS, "refresh_token": VALID_REFRESH }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookie_count(&response), 2);
    let jar = cookie_jar(&response);
    assert_eq!(body_json(response).await, json!({ "ok": true }));

    let response = app(store)
        .oneshot(get_with_cookies("/", &jar))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body.get("email").and_then(Value::as_str),
        Some("alice@example.com")
    );
}

#[tokio::test]
async fn bridge_rejects_empty_tokens_with_no_cookies() {
    let store = ScriptedStore::new();

    for body in [
        json!({ "access_token": "", "refresh_token": VALID_REFRESH }),
        json!({ "access_token": VALID_ACCESS, "refresh_token": "" }),
        json!({ "access_token": "", "refresh_token": "" }),
    ] {
        let response = app(store.clone())
            .oneshot(post_json("/v1/auth/cookies", &body))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(set_cookie_count(&response), 0);
    }
}

#[tokio::test]
async fn bridge_surfaces_store_rejection_as_internal_error() {
    let store = ScriptedStore::new();

    let response = app(store)
        .oneshot(post_json(
            "/v1/auth/cookies",
            &json!({ "access_token": "expired", "refresh_token": "revoked" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(set_cookie_count(&response), 0);
    let body = body_json(response).await;
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn login_sets_cookies_and_returns_destination() {
    let store = ScriptedStore::new();

    let response = app(store)
        .oneshot(post_json(
            "/v1/auth/login",
            &json!({
                "email": "alice@example.com",
                "password": PASSWORD,
                "redirected_from": "/admin/apps"
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookie_count(&response), 2);
    let body = body_json(response).await;
    assert_eq!(body.get("ok").and_then(Value::as_bool), Some(true));
    assert_eq!(
        body.get("redirect_to").and_then(Value::as_str),
        Some("/admin/apps")
    );
}

#[tokio::test]
async fn login_relays_upstream_error_without_cookies() {
    let store = ScriptedStore::new();

    let response = app(store)
        .oneshot(post_json(
            "/v1/auth/login",
            &json!({ "email": "alice@example.com", "password": "wrong" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(set_cookie_count(&response), 0);
    let body = body_json(response).await;
    assert_eq!(
        body.get("error").and_then(Value::as_str),
        Some("Invalid login credentials")
    );
}

#[tokio::test]
async fn login_validates_input_before_store() {
    let store = ScriptedStore::new();

    let response = app(store.clone())
        .oneshot(post_json(
            "/v1/auth/login",
            &json!({ "email": "not-an-email", "password": PASSWORD }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(store)
        .oneshot(post_json(
            "/v1/auth/login",
            &json!({ "email": "alice@example.com", "password": "" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_replaces_external_redirect_with_root() {
    let store = ScriptedStore::new();

    for bad in ["https://evil.tld/phish", "//evil.tld/phish", "evil"] {
        let response = app(store.clone())
            .oneshot(post_json(
                "/v1/auth/login",
                &json!({
                    "email": "alice@example.com",
                    "password": PASSWORD,
                    "redirected_from": bad
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body.get("redirect_to").and_then(Value::as_str),
            Some("/"),
            "redirected_from {bad}"
        );
    }
}

#[tokio::test]
async fn redirected_from_round_trips_exactly() {
    let store = ScriptedStore::new();

    // Unauthenticated visit captures the destination.
    let response = app(store.clone())
        .oneshot(get("/admin/apps"))
        .await
        .expect("response");
    let location = location(&response);
    let query = location.split_once('?').map(|(_, q)| q).unwrap_or_default();
    let redirected_from = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "redirectedFrom")
        .map(|(_, value)| value.into_owned())
        .expect("redirectedFrom present");
    assert_eq!(redirected_from, "/admin/apps");

    // Completing the login navigates back to exactly that path.
    let response = app(store)
        .oneshot(post_json(
            "/v1/auth/login",
            &json!({
                "email": "alice@example.com",
                "password": PASSWORD,
                "redirected_from": redirected_from
            }),
        ))
        .await
        .expect("response");
    let body = body_json(response).await;
    assert_eq!(
        body.get("redirect_to").and_then(Value::as_str),
        Some("/admin/apps")
    );
}

#[tokio::test]
async fn gate_propagates_rotated_cookies() {
    let store = ScriptedStore::new();

    // Stale access token, live refresh token: the request is allowed and the
    // rotated pair reaches the client on the same response.
    let response = app(store)
        .oneshot(get_with_cookies(
            "/",
            &format!("hubgate_access=stale; hubgate_refresh={VALID_REFRESH}"),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let jar = cookie_jar(&response);
    assert!(jar.contains(&format!("hubgate_access={ROTATED_ACCESS}")));
    assert!(jar.contains(&format!("hubgate_refresh={ROTATED_REFRESH}")));
}

#[tokio::test]
async fn sso_without_session_is_unauthorized_and_mints_nothing() {
    let store = ScriptedStore::new();

    let response = app(store.clone())
        .oneshot(post_json("/v1/sso/link", &json!({ "app_slug": "billing" })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(
        body.get("error").and_then(Value::as_str),
        Some("unauthorized")
    );
    assert_eq!(store.mint_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sso_with_stale_cookies_is_unauthorized_and_mints_nothing() {
    let store = ScriptedStore::new();

    let response = app(store.clone())
        .oneshot(post_json_with_cookies(
            "/v1/sso/link",
            &json!({ "app_slug": "billing" }),
            "hubgate_access=garbage; hubgate_refresh=garbage",
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.mint_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sso_rejects_missing_app_slug_before_any_store_call() {
    let store = ScriptedStore::new();

    let response = app(store.clone())
        .oneshot(post_json_with_cookies(
            "/v1/sso/link",
            &json!({ "app_slug": "" }),
            &format!("hubgate_access={VALID_ACCESS}; hubgate_refresh={VALID_REFRESH}"),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.mint_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sso_mints_distinct_urls_per_call() {
    let store = ScriptedStore::new();
    let cookies = format!("hubgate_access={VALID_ACCESS}; hubgate_refresh={VALID_REFRESH}");

    let mut urls = Vec::new();
    for _ in 0..2 {
        let response = app(store.clone())
            .oneshot(post_json_with_cookies(
                "/v1/sso/link",
                &json!({ "app_slug": "billing", "redir": "/invoices" }),
                &cookies,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let url = body
            .get("url")
            .and_then(Value::as_str)
            .expect("url present")
            .to_string();
        assert!(url.starts_with("https://billing.apps.hub.tld/sso?ticket="));
        assert!(url.ends_with("&redir=/invoices"));
        urls.push(url);
    }

    assert_ne!(urls[0], urls[1], "every call mints a distinct ticket");
    assert_eq!(store.mint_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn sso_relays_minting_failure_as_bad_request() {
    let store = ScriptedStore::new();

    let response = app(store)
        .oneshot(post_json_with_cookies(
            "/v1/sso/link",
            &json!({ "app_slug": "unknown" }),
            &format!("hubgate_access={VALID_ACCESS}; hubgate_refresh={VALID_REFRESH}"),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body.get("error").and_then(Value::as_str),
        Some("app not registered")
    );
}

#[tokio::test]
async fn sso_defaults_redirect_path_to_root() {
    let store = ScriptedStore::new();

    let response = app(store)
        .oneshot(post_json_with_cookies(
            "/v1/sso/link",
            &json!({ "app_slug": "billing", "redir": "https://evil.tld/" }),
            &format!("hubgate_access={VALID_ACCESS}; hubgate_refresh={VALID_REFRESH}"),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let url = body.get("url").and_then(Value::as_str).expect("url present");
    assert!(url.ends_with("&redir=/"), "external redir collapses to root");
}

#[tokio::test]
async fn session_endpoint_reports_identity_or_no_content() {
    let store = ScriptedStore::new();

    let response = app(store.clone())
        .oneshot(get("/v1/auth/session"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app(store)
        .oneshot(get_with_cookies(
            "/v1/auth/session",
            &format!("hubgate_access={VALID_ACCESS}; hubgate_refresh={VALID_REFRESH}"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body.get("email").and_then(Value::as_str),
        Some("alice@example.com")
    );
}

#[tokio::test]
async fn logout_revokes_and_clears_cookies() {
    let store = ScriptedStore::new();

    let response = app(store.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/auth/logout")
                .header(
                    COOKIE,
                    format!("hubgate_access={VALID_ACCESS}; hubgate_refresh={VALID_REFRESH}"),
                )
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.sign_out_calls.load(Ordering::SeqCst), 1);
    for value in response.headers().get_all(SET_COOKIE) {
        assert!(value
            .to_str()
            .expect("ascii cookie")
            .contains("Max-Age=0"));
    }
}

#[tokio::test]
async fn end_to_end_dashboard_launch() {
    let store = ScriptedStore::new();

    // 1. Invalid credentials: upstream error surfaces, no cookies written.
    let response = app(store.clone())
        .oneshot(post_json(
            "/v1/auth/login",
            &json!({ "email": "alice@example.com", "password": "nope" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(set_cookie_count(&response), 0);

    // 2. Fresh browser on a protected path bounces to login with the
    //    destination captured.
    let response = app(store.clone())
        .oneshot(get("/admin/apps"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirectedFrom=%2Fadmin%2Fapps");

    // 3. Valid credentials: cookies issued, destination echoed back.
    let response = app(store.clone())
        .oneshot(post_json(
            "/v1/auth/login",
            &json!({
                "email": "alice@example.com",
                "password": PASSWORD,
                "redirected_from": "/admin/apps"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let jar = cookie_jar(&response);
    let body = body_json(response).await;
    assert_eq!(
        body.get("redirect_to").and_then(Value::as_str),
        Some("/admin/apps")
    );

    // 4. The gate now lets the session through.
    let response = app(store.clone())
        .oneshot(get_with_cookies("/", &jar))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // 5. Clicking an app tile mints a ticket addressed to that app.
    let response = app(store.clone())
        .oneshot(post_json_with_cookies(
            "/v1/sso/link",
            &json!({ "app_slug": "billing" }),
            &jar,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let url = body.get("url").and_then(Value::as_str).expect("url present");
    assert!(url.starts_with("https://billing.apps.hub.tld/sso?ticket="));
    assert_eq!(store.mint_calls.load(Ordering::SeqCst), 1);
}
