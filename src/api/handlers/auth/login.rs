//! Password login endpoint.
//!
//! Performs the credential exchange with the session store, writes the
//! session cookie pair on the same response, and hands back the sanitized
//! post-login destination captured earlier by the route gate.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;

use super::{
    cookies::append_session_cookies,
    state::AuthState,
    types::{ErrorResponse, LoginRequest, LoginResponse},
    utils::{normalize_email, sanitize_redirect},
};
use crate::api::handlers::valid_email;
use crate::store::StoreError;

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in, cookies issued", body = LoginResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Credentials rejected", body = ErrorResponse),
        (status = 500, description = "Session store failure", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
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

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid email".to_string(),
            }),
        )
            .into_response();
    }

    if request.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing password".to_string(),
            }),
        )
            .into_response();
    }

    let session = match auth_state
        .store()
        .sign_in_with_password(&email, &request.password)
        .await
    {
        Ok(session) => session,
        // The store's message is relayed verbatim so the login form can
        // surface it inline (wrong password, unverified email, ...).
        Err(StoreError::Unauthorized(message)) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse { error: message }),
            )
                .into_response()
        }
        Err(err) => {
            error!("Sign-in failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
                .into_response();
        }
    };

    let mut headers = HeaderMap::new();
    if let Err(err) = append_session_cookies(
        &mut headers,
        auth_state.config(),
        &session.access_token,
        &session.refresh_token,
    ) {
        error!("Failed to build session cookies: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to build session cookies".to_string(),
            }),
        )
            .into_response();
    }

    let redirect_to = sanitize_redirect(request.redirected_from.as_deref());

    (
        StatusCode::OK,
        headers,
        Json(LoginResponse {
            ok: true,
            redirect_to,
        }),
    )
        .into_response()
}
