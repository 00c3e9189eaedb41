//! Session verification shared by the gate and the auth endpoints.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{debug, error};

use super::{
    cookies::{clear_session_cookies, extract_session_cookies},
    state::AuthState,
    types::{ErrorResponse, SessionResponse},
};
use crate::store::{Session, SessionStore, StoreError, StoreUser};

/// Cookie-held token material for one request.
#[derive(Debug)]
pub(crate) struct SessionCookies {
    pub(crate) access: Option<String>,
    pub(crate) refresh: Option<String>,
}

/// Outcome of asking the session store about a cookie pair.
///
/// `Refreshed` means the store rotated the tokens while answering; the new
/// pair must reach the client or its cookies stay on the revoked tokens.
#[derive(Debug)]
pub(crate) enum VerifiedSession {
    Current {
        user: StoreUser,
        access_token: String,
    },
    Refreshed {
        session: Session,
    },
}

impl VerifiedSession {
    pub(crate) fn user(&self) -> &StoreUser {
        match self {
            Self::Current { user, .. } => user,
            Self::Refreshed { session } => &session.user,
        }
    }

    pub(crate) fn access_token(&self) -> &str {
        match self {
            Self::Current { access_token, .. } => access_token,
            Self::Refreshed { session } => &session.access_token,
        }
    }

    pub(crate) fn rotated(&self) -> Option<&Session> {
        match self {
            Self::Current { .. } => None,
            Self::Refreshed { session } => Some(session),
        }
    }
}

/// Resolve a cookie pair into a verified session.
///
/// The access token is validated first; when it is expired or revoked the
/// refresh token is rotated into a fresh session. Errors other than token
/// rejection are propagated untouched.
pub(crate) async fn authenticate(
    store: &dyn SessionStore,
    cookies: &SessionCookies,
) -> Result<VerifiedSession, StoreError> {
    if let Some(access) = &cookies.access {
        match store.get_user(access).await {
            Ok(user) => {
                return Ok(VerifiedSession::Current {
                    user,
                    access_token: access.clone(),
                })
            }
            Err(StoreError::Unauthorized(reason)) => {
                debug!("access token rejected, trying refresh: {reason}");
            }
            Err(err) => return Err(err),
        }
    }

    let Some(refresh) = &cookies.refresh else {
        return Err(StoreError::Unauthorized(
            "no usable session cookie".to_string(),
        ));
    };

    let session = store.refresh_session(refresh).await?;
    Ok(VerifiedSession::Refreshed { session })
}

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Missing cookies are treated as "no session" to avoid leaking auth state.
    let Some(cookies) = extract_session_cookies(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match authenticate(auth_state.store(), &cookies).await {
        Ok(verified) => {
            let user = verified.user();
            let response = SessionResponse {
                user_id: user.id.to_string(),
                email: user.email.clone(),
            };

            let mut response_headers = HeaderMap::new();
            if let Some(rotated) = verified.rotated() {
                if let Err(err) = super::cookies::append_session_cookies(
                    &mut response_headers,
                    auth_state.config(),
                    &rotated.access_token,
                    &rotated.refresh_token,
                ) {
                    error!("Failed to propagate rotated session cookies: {err}");
                }
            }

            (StatusCode::OK, response_headers, Json(response)).into_response()
        }
        Err(StoreError::Unauthorized(_)) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Failed to verify session: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Revocation is best effort; logout never blocks on the store.
    if let Some(cookies) = extract_session_cookies(&headers) {
        if let Some(access) = cookies.access {
            if let Err(err) = auth_state.store().sign_out(&access).await {
                error!("Failed to revoke session: {err}");
            }
        }
    }

    // Always clear the cookies, even if revocation failed.
    let mut response_headers = HeaderMap::new();
    if let Err(err) = clear_session_cookies(&mut response_headers, auth_state.config()) {
        error!("Failed to build clearing cookies: {err}");
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}
