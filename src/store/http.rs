//! HTTP client for the session store.

use super::{Session, SessionStore, StoreError, StoreUser};
use crate::cli::globals::GlobalArgs;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument};
use url::Url;

pub struct HttpSessionStore {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl HttpSessionStore {
    /// Build a client from the store connection material.
    /// # Errors
    /// Returns an error if the base URL cannot be parsed.
    pub fn new(globals: &GlobalArgs) -> Result<Self> {
        let client = Client::builder().user_agent(crate::APP_USER_AGENT).build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&globals.store_url)?,
            anon_key: globals.store_anon_key.clone(),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }
}

/// Reduce the store URL to `scheme://host:port` so endpoints can be appended.
fn normalize_base_url(store_url: &str) -> Result<String> {
    let url = Url::parse(store_url)?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| anyhow!("Error parsing URL: no host specified"))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(anyhow!("Error parsing URL: unsupported scheme {}", scheme)),
        },
    };

    Ok(format!("{scheme}://{host}:{port}"))
}

/// Pull a human-readable message out of a store error body.
fn error_message(value: &Value) -> String {
    for key in ["error_description", "msg", "message", "error"] {
        if let Some(text) = value.get(key).and_then(Value::as_str) {
            return text.to_string();
        }
    }
    "unknown session store error".to_string()
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

/// Read the error body of a failed response and map it onto the taxonomy.
/// Credential-shaped statuses become `Unauthorized`, the rest `Upstream`.
async fn reject(response: Response) -> StoreError {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = error_message(&body);

    debug!("session store rejected request: {} - {}", status, message);

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::Unauthorized(message)
        }
        _ => StoreError::Upstream(message),
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, StoreError> {
        let url = self.endpoint_url("/auth/v1/token?grant_type=password");

        let mut map = HashMap::new();
        map.insert("email", email);
        map.insert("password", password);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&map)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        response.json::<Session>().await.map_err(transport)
    }

    #[instrument(skip(self, access_token))]
    async fn get_user(&self, access_token: &str) -> Result<StoreUser, StoreError> {
        let url = self.endpoint_url("/auth/v1/user");

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        response.json::<StoreUser>().await.map_err(transport)
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, StoreError> {
        let url = self.endpoint_url("/auth/v1/token?grant_type=refresh_token");

        let mut map = HashMap::new();
        map.insert("refresh_token", refresh_token);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&map)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        response.json::<Session>().await.map_err(transport)
    }

    #[instrument(skip(self, access_token))]
    async fn create_sso_link(
        &self,
        access_token: &str,
        app_slug: &str,
        redirect_path: &str,
    ) -> Result<String, StoreError> {
        let url = self.endpoint_url("/rest/v1/rpc/create_sso_link");

        let mut map = HashMap::new();
        map.insert("app_slug", app_slug);
        map.insert("redir", redirect_path);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .json(&map)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        let body: Value = response.json().await.map_err(transport)?;

        // The minting RPC answers either a bare string or an object with a
        // url field; anything else means no ticket was issued.
        let link = match &body {
            Value::String(link) => Some(link.clone()),
            Value::Object(_) => body
                .get("url")
                .and_then(Value::as_str)
                .map(ToString::to_string),
            _ => None,
        };

        link.filter(|link| !link.is_empty())
            .ok_or_else(|| StoreError::Upstream("session store returned no url".to_string()))
    }

    #[instrument(skip(self, access_token))]
    async fn sign_out(&self, access_token: &str) -> Result<(), StoreError> {
        let url = self.endpoint_url("/auth/v1/logout");

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        Ok(())
    }
}

impl std::fmt::Debug for HttpSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The anon key is public but still kept out of logs.
        f.debug_struct("HttpSessionStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
