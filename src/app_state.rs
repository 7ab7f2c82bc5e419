use std::sync::Arc;

use crate::auth::{AccessPolicy, TokenVerifier};
use crate::config::Config;
use crate::db::queries::person::PersonStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PersonStore>,
    pub verifier: Arc<TokenVerifier>,
    pub policy: AccessPolicy,
    /// Client whose `resource_access` roles are read from tokens.
    pub client_id: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PersonStore>,
        verifier: TokenVerifier,
        policy: AccessPolicy,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            verifier: Arc::new(verifier),
            policy,
            client_id: client_id.into(),
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn PersonStore>) -> Self {
        Self::new(
            store,
            TokenVerifier::from_config(config),
            config.access_policy(),
            config.client_id.clone(),
        )
    }
}
