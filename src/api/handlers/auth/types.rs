//! Request/response types for auth and SSO endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Destination captured by the route gate on an earlier redirect.
    #[serde(default)]
    pub redirected_from: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub ok: bool,
    /// Sanitized same-site path the client should navigate to.
    pub redirect_to: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CookieBridgeRequest {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SsoLinkRequest {
    pub app_slug: String,
    /// Post-redirect path inside the target application.
    #[serde(default)]
    pub redir: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SsoLinkResponse {
    pub url: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
