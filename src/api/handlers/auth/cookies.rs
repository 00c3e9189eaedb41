//! Cookie bridge: mirror a client-held session into HTTP cookies.
//!
//! Sign-ins completed directly against the session store (password via the
//! login endpoint excepted, but also magic-link and OTP flows) leave the
//! session in browser-held storage the server cannot see. This endpoint
//! re-issues the token pair as cookies so the route gate and server-rendered
//! requests agree with the client about auth state.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;

use super::{
    session::{authenticate, SessionCookies},
    state::{AuthConfig, AuthState},
    types::{CookieBridgeRequest, ErrorResponse, OkResponse},
};

pub(crate) const ACCESS_COOKIE_NAME: &str = "hubgate_access";
pub(crate) const REFRESH_COOKIE_NAME: &str = "hubgate_refresh";

#[utoipa::path(
    post,
    path = "/v1/auth/cookies",
    request_body = CookieBridgeRequest,
    responses(
        (status = 200, description = "Session cookies issued", body = OkResponse),
        (status = 400, description = "Missing token", body = ErrorResponse),
        (status = 500, description = "Session store rejected the tokens", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn set_cookies(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CookieBridgeRequest>>,
) -> impl IntoResponse {
    let request: CookieBridgeRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Missing payload".to_string(),
                }),
            )
                .into_response()
        }
    };

    // Both tokens are required before the session store is consulted.
    if request.access_token.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing access_token".to_string(),
            }),
        )
            .into_response();
    }

    if request.refresh_token.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing refresh_token".to_string(),
            }),
        )
            .into_response();
    }

    let cookies = SessionCookies {
        access: Some(request.access_token.clone()),
        refresh: Some(request.refresh_token.clone()),
    };

    let verified = match authenticate(auth_state.store(), &cookies).await {
        Ok(verified) => verified,
        Err(err) => {
            // Store rejection means the caller is not logged in; no partial
            // cookie state is persisted.
            error!("Cookie bridge rejected token pair: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
                .into_response();
        }
    };

    // When the check rotated tokens the cookies carry the rotated pair.
    let (access, refresh) = match verified.rotated() {
        Some(session) => (session.access_token.clone(), session.refresh_token.clone()),
        None => (request.access_token, request.refresh_token),
    };

    let mut headers = HeaderMap::new();
    if let Err(err) = append_session_cookies(&mut headers, auth_state.config(), &access, &refresh) {
        error!("Failed to build session cookies: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to build session cookies".to_string(),
            }),
        )
            .into_response();
    }

    (StatusCode::OK, headers, Json(OkResponse { ok: true })).into_response()
}

/// Build one secure `HttpOnly` session cookie.
fn session_cookie(
    config: &AuthConfig,
    name: &str,
    value: &str,
    max_age: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Append the cookie pair for a session onto a header map.
pub(crate) fn append_session_cookies(
    headers: &mut HeaderMap,
    config: &AuthConfig,
    access_token: &str,
    refresh_token: &str,
) -> Result<(), InvalidHeaderValue> {
    headers.append(
        SET_COOKIE,
        session_cookie(
            config,
            ACCESS_COOKIE_NAME,
            access_token,
            config.access_cookie_ttl_seconds(),
        )?,
    );
    headers.append(
        SET_COOKIE,
        session_cookie(
            config,
            REFRESH_COOKIE_NAME,
            refresh_token,
            config.refresh_cookie_ttl_seconds(),
        )?,
    );
    Ok(())
}

/// Expire both session cookies.
pub(crate) fn clear_session_cookies(
    headers: &mut HeaderMap,
    config: &AuthConfig,
) -> Result<(), InvalidHeaderValue> {
    for name in [ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME] {
        headers.append(SET_COOKIE, session_cookie(config, name, "", 0)?);
    }
    Ok(())
}

/// Read the session cookie pair from request headers.
///
/// Returns `None` when neither cookie is present.
pub(crate) fn extract_session_cookies(headers: &HeaderMap) -> Option<SessionCookies> {
    let access = cookie_value(headers, ACCESS_COOKIE_NAME);
    let refresh = cookie_value(headers, REFRESH_COOKIE_NAME);
    if access.is_none() && refresh.is_none() {
        return None;
    }
    Some(SessionCookies { access, refresh })
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}
