//! Route gate: session check for every non-public route.
//!
//! Runs before any handler. Public paths pass through untouched; everything
//! else requires a session the store still considers valid, or the request is
//! answered with a redirect to the login page carrying the original
//! destination in `redirectedFrom`. Every store error counts as "no session"
//! (fail closed, never open). No retries.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::api::handlers::auth::{
    cookies::{append_session_cookies, extract_session_cookies},
    session::authenticate,
    AuthState,
};

pub(crate) const LOGIN_PATH: &str = "/login";

/// Routes the gate must never block, regardless of session state.
/// Fixed at deploy time. Matching is exact or prefix-with-`/`-boundary.
///
/// The `/v1` API namespace is listed because its endpoints perform their own
/// auth and answer 401 instead of redirecting.
const PUBLIC_PATHS: &[&str] = &[
    "/login",
    "/password-forgot",
    "/password-reset",
    "/password-set",
    "/auth/callback",
    "/health",
    "/v1",
    "/assets",
    "/favicon.ico",
];

/// Identity attached to the request once the gate has verified the session.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

pub async fn gatekeeper(
    Extension(auth_state): Extension<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if is_public(&path) {
        return next.run(request).await;
    }

    let Some(cookies) = extract_session_cookies(request.headers()) else {
        return redirect_to_login(&path);
    };

    let verified = match authenticate(auth_state.store(), &cookies).await {
        Ok(verified) => verified,
        Err(err) => {
            debug!("session check failed for {path}: {err}");
            return redirect_to_login(&path);
        }
    };

    let user = verified.user();
    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email.clone(),
    });

    let rotated = verified.rotated().cloned();
    let mut response = next.run(request).await;

    // A silent refresh during the check must reach the client, otherwise its
    // cookies stay on the revoked pair and the next request bounces to login.
    if let Some(session) = rotated {
        if let Err(err) = append_session_cookies(
            response.headers_mut(),
            auth_state.config(),
            &session.access_token,
            &session.refresh_token,
        ) {
            error!("Failed to propagate rotated session cookies: {err}");
        }
    }

    response
}

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS
        .iter()
        .any(|public| path == *public || path.starts_with(&format!("{public}/")))
}

fn redirect_to_login(path: &str) -> Response {
    let encoded: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    Redirect::temporary(&format!("{LOGIN_PATH}?redirectedFrom={encoded}")).into_response()
}
