use crate::api::handlers::auth::types::{
    CookieBridgeRequest, ErrorResponse, LoginRequest, LoginResponse, OkResponse, SessionResponse,
    SsoLinkRequest, SsoLinkResponse,
};
use utoipa::OpenApi;

// Info (title, version, description) is filled from Cargo.toml metadata.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health,
        crate::api::handlers::auth::login::login,
        crate::api::handlers::auth::cookies::set_cookies,
        crate::api::handlers::auth::session::session,
        crate::api::handlers::auth::session::logout,
        crate::api::handlers::auth::sso::sso_link,
    ),
    components(schemas(
        LoginRequest,
        LoginResponse,
        CookieBridgeRequest,
        OkResponse,
        SsoLinkRequest,
        SsoLinkResponse,
        SessionResponse,
        ErrorResponse,
    )),
    tags(
        (name = "hubgate", description = "Session-gated SSO gateway"),
        (name = "auth", description = "Session bootstrap and introspection"),
        (name = "sso", description = "Single-use SSO link minting")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
