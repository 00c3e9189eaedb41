use crate::{
    api::handlers::auth::{types::ErrorResponse, AuthConfig, AuthState},
    cli::globals::GlobalArgs,
    store::HttpSessionStore,
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request, StatusCode,
    },
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;

pub mod gate;
pub mod handlers;

mod openapi;

pub use openapi::openapi;

/// Build the gateway router: routes, the route gate, and shared state.
///
/// Kept separate from [`new`] so tests can drive the full pipeline with an
/// injected session store.
#[must_use]
pub fn router(auth_state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::health::health))
        .route("/v1/auth/login", post(handlers::auth::login::login))
        .route("/v1/auth/cookies", post(handlers::auth::cookies::set_cookies))
        .route("/v1/auth/session", get(handlers::auth::session::session))
        .route("/v1/auth/logout", post(handlers::auth::session::logout))
        .route("/v1/sso/link", post(handlers::auth::sso::sso_link))
        .route("/v1/openapi.json", get(serve_openapi))
        .fallback(not_found)
        .layer(middleware::from_fn(gate::gatekeeper))
        .layer(Extension(auth_state))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, globals: &GlobalArgs, auth_config: AuthConfig) -> Result<()> {
    let store =
        Arc::new(HttpSessionStore::new(globals).context("Failed to build session store client")?);

    let site_origin = site_origin(auth_config.site_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(site_origin))
        .allow_credentials(true);

    let auth_state = Arc::new(AuthState::new(auth_config, store));

    let app = router(auth_state).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

async fn serve_openapi() -> impl IntoResponse {
    Json(openapi::openapi())
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not found".to_string(),
        }),
    )
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn site_origin(site_url: &str) -> Result<HeaderValue> {
    let parsed =
        Url::parse(site_url).with_context(|| format!("Invalid site base URL: {site_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Site base URL must include a valid host: {site_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build site origin header")
}
