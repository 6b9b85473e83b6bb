//! Service graph shared by every handler.

use itrax_auth::{TokenService, hash_password, verify_password};
use itrax_infra::Stores;

use crate::app::errors::ApiError;
use crate::config::AppConfig;

/// Wired once at startup and handed to handlers as `Extension<Arc<AppServices>>`.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub config: AppConfig,
    pub stores: Stores,
    pub tokens: TokenService,
}

impl AppServices {
    pub fn new(config: AppConfig, stores: Stores) -> Self {
        let tokens = TokenService::new(config.jwt_secret.clone(), config.jwt_refresh_secret.clone());
        Self { config, stores, tokens }
    }

    /// Hash on the blocking pool; bcrypt is deliberately slow.
    pub async fn hash_password(&self, plain: &str) -> Result<String, ApiError> {
        let plain = plain.to_string();
        let cost = self.config.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || hash_password(&plain, cost))
            .await
            .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))??;
        Ok(hash)
    }

    pub async fn verify_password(&self, plain: &str, hash: &str) -> Result<bool, ApiError> {
        let plain = plain.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
            .await
            .map_err(|e| ApiError::Internal(format!("password check task failed: {e}")))
    }
}
