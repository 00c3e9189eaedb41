//! Gateway auth state and configuration.

use crate::store::SessionStore;
use std::sync::Arc;

const DEFAULT_ACCESS_COOKIE_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_REFRESH_COOKIE_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    site_url: String,
    access_cookie_ttl_seconds: i64,
    refresh_cookie_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(site_url: String) -> Self {
        Self {
            site_url,
            access_cookie_ttl_seconds: DEFAULT_ACCESS_COOKIE_TTL_SECONDS,
            refresh_cookie_ttl_seconds: DEFAULT_REFRESH_COOKIE_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_access_cookie_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_cookie_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_cookie_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_cookie_ttl_seconds = seconds;
        self
    }

    pub(crate) fn site_url(&self) -> &str {
        &self.site_url
    }

    pub(crate) fn access_cookie_ttl_seconds(&self) -> i64 {
        self.access_cookie_ttl_seconds
    }

    pub(crate) fn refresh_cookie_ttl_seconds(&self) -> i64 {
        self.refresh_cookie_ttl_seconds
    }

    /// Only mark cookies secure when the site is served over HTTPS.
    pub(crate) fn cookie_secure(&self) -> bool {
        self.site_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    store: Arc<dyn SessionStore>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, store: Arc<dyn SessionStore>) -> Self {
        Self { config, store }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }
}
