//! SSO ticket issuer.
//!
//! Given an authenticated user and a target sub-application, asks the
//! session store to mint a single-use redirect URL proving identity to that
//! application. The session is re-verified here from the request cookies and
//! never trusted from an earlier check, since this endpoint can be called
//! standalone.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{debug, error};

use super::{
    cookies::{append_session_cookies, extract_session_cookies},
    session::authenticate,
    state::AuthState,
    types::{ErrorResponse, SsoLinkRequest, SsoLinkResponse},
    utils::sanitize_redirect,
};

fn unauthorized() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "unauthorized".to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/sso/link",
    request_body = SsoLinkRequest,
    responses(
        (status = 200, description = "Single-use redirect URL minted", body = SsoLinkResponse),
        (status = 400, description = "Validation or minting error", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "sso"
)]
pub async fn sso_link(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SsoLinkRequest>>,
) -> impl IntoResponse {
    let request: SsoLinkRequest = match payload {
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

    // Validated before any session store call.
    if request.app_slug.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing app_slug".to_string(),
            }),
        )
            .into_response();
    }

    let redirect_path = sanitize_redirect(request.redir.as_deref());

    let Some(cookies) = extract_session_cookies(&headers) else {
        return unauthorized();
    };

    // Fail closed: a store error during the session check is indistinguishable
    // from a missing session as far as minting is concerned.
    let verified = match authenticate(auth_state.store(), &cookies).await {
        Ok(verified) => verified,
        Err(err) => {
            debug!("SSO link refused, session check failed: {err}");
            return unauthorized();
        }
    };

    match auth_state
        .store()
        .create_sso_link(verified.access_token(), &request.app_slug, &redirect_path)
        .await
    {
        Ok(url) => {
            let mut response_headers = HeaderMap::new();
            if let Some(rotated) = verified.rotated() {
                if let Err(err) = append_session_cookies(
                    &mut response_headers,
                    auth_state.config(),
                    &rotated.access_token,
                    &rotated.refresh_token,
                ) {
                    error!("Failed to propagate rotated session cookies: {err}");
                }
            }
            (
                StatusCode::OK,
                response_headers,
                Json(SsoLinkResponse { url }),
            )
                .into_response()
        }
        // Minting errors abort the redirect; the cause is relayed, never a
        // fabricated URL.
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}
