use axum::{
    extract::Extension,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::api::gate::CurrentUser;

/// Landing route behind the gate; answers the signed-in identity.
pub async fn root(user: Option<Extension<CurrentUser>>) -> impl IntoResponse {
    match user {
        Some(Extension(user)) => Json(json!({
            "user_id": user.id,
            "email": user.email,
        }))
        .into_response(),
        None => Json(json!({
            "name": env!("CARGO_PKG_NAME"),
        }))
        .into_response(),
    }
}
