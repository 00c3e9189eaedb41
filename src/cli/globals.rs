use secrecy::SecretString;

/// Session store connection material shared across handlers.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub store_url: String,
    pub store_anon_key: String,
    /// Privileged credential for admin-only collaborators. Carried in
    /// configuration, never used by the gateway itself.
    pub store_service_key: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(store_url: String) -> Self {
        Self {
            store_url,
            store_anon_key: String::new(),
            store_service_key: SecretString::default(),
        }
    }

    pub fn set_anon_key(&mut self, key: String) {
        self.store_anon_key = key;
    }

    pub fn set_service_key(&mut self, key: SecretString) {
        self.store_service_key = key;
    }
}
