//! Session store client.
//!
//! The store owns credentials, sessions, and SSO ticket minting. The gateway
//! talks to it over HTTPS and never holds auth state of its own, so every
//! consumer takes the store as a trait object and can be tested with a fake.

pub mod http;

pub use self::http::HttpSessionStore;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Authenticated user identity as reported by the session store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreUser {
    pub id: Uuid,
    pub email: String,
}

/// Access/refresh token pair with its owner, as issued by the session store.
///
/// Cookie copies of a session can go stale relative to the store; validity is
/// only ever decided by asking the store.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: u64,
    pub user: StoreUser,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store rejected the presented credentials or tokens.
    #[error("{0}")]
    Unauthorized(String),
    /// The store answered with an error outside the credential path.
    #[error("{0}")]
    Upstream(String),
    /// The store could not be reached or returned an unreadable response.
    #[error("session store unreachable: {0}")]
    Transport(String),
}

/// Operations the gateway requests from the session store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Exchange credentials for a session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, StoreError>;

    /// Resolve an access token to its user, failing if expired or revoked.
    async fn get_user(&self, access_token: &str) -> Result<StoreUser, StoreError>;

    /// Rotate a refresh token into a fresh session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, StoreError>;

    /// Mint a single-use SSO redirect URL for a registered sub-application.
    ///
    /// Every call mints a distinct ticket; the ticket's expiry and single-use
    /// enforcement are owned by the store and the target application.
    async fn create_sso_link(
        &self,
        access_token: &str,
        app_slug: &str,
        redirect_path: &str,
    ) -> Result<String, StoreError>;

    /// Revoke the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), StoreError>;
}
