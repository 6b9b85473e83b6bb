//! Process configuration, read once from the environment at startup.

use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use itrax_auth::password::DEFAULT_COST;
use itrax_core::OrgId;
use itrax_infra::BackendMode;

const DEFAULT_PORT: &str = "4000";
const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017/itrax";
const DEFAULT_MONGO_DB: &str = "itrax";
const DEFAULT_JWT_SECRET: &str = "change_me";
const DEFAULT_CLIENT_URL: &str = "http://localhost:5173";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub mongo_uri: String,
    pub mongo_db: String,
    pub store_backend: BackendMode,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    /// Organization that self-service signups join.
    pub default_org_id: OrgId,
    /// Allowed CORS origin.
    pub client_url: String,
    /// Marks the refresh cookie `Secure`.
    pub production: bool,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set; using insecure dev default");
            DEFAULT_JWT_SECRET.to_string()
        });
        let jwt_refresh_secret = var("JWT_REFRESH_SECRET").unwrap_or_else(|| format!("{jwt_secret}_refresh"));

        let default_org_id = match var("DEFAULT_ORG_ID") {
            Some(raw) => parse("DEFAULT_ORG_ID", raw)?,
            None => {
                let org = OrgId::new();
                warn!(org_id = %org, "DEFAULT_ORG_ID not set; signups join a fresh org for this process");
                org
            }
        };

        Ok(Self {
            port: load(&var, "PORT", DEFAULT_PORT)?,
            mongo_uri: var("MONGO_URI").unwrap_or_else(|| DEFAULT_MONGO_URI.to_string()),
            mongo_db: var("MONGO_DB").unwrap_or_else(|| DEFAULT_MONGO_DB.to_string()),
            store_backend: load(&var, "STORE_BACKEND", "auto")?,
            jwt_secret,
            jwt_refresh_secret,
            default_org_id,
            client_url: var("CLIENT_URL").unwrap_or_else(|| DEFAULT_CLIENT_URL.to_string()),
            production: var("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production")),
            bcrypt_cost: load(&var, "BCRYPT_COST", &DEFAULT_COST.to_string())?,
        })
    }
}

fn load<T>(var: &impl Fn(&str) -> Option<String>, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    parse(key, raw)
}

fn parse<T>(key: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value: raw,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.store_backend, BackendMode::Auto);
        assert_eq!(cfg.jwt_secret, "change_me");
        assert_eq!(cfg.jwt_refresh_secret, "change_me_refresh");
        assert_eq!(cfg.bcrypt_cost, DEFAULT_COST);
        assert!(!cfg.production);
    }

    #[test]
    fn refresh_secret_derives_from_access_secret() {
        let cfg = config(&[("JWT_SECRET", "s3cret"), ("APP_ENV", "Production")]).unwrap();
        assert_eq!(cfg.jwt_refresh_secret, "s3cret_refresh");
        assert!(cfg.production);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
        assert!(config(&[("STORE_BACKEND", "postgres")]).is_err());
        assert!(config(&[("DEFAULT_ORG_ID", "nope")]).is_err());
    }

    #[test]
    fn default_org_id_is_parsed() {
        let org = OrgId::new();
        let cfg = config(&[("DEFAULT_ORG_ID", &org.to_string()), ("STORE_BACKEND", "memory")]).unwrap();
        assert_eq!(cfg.default_org_id, org);
        assert_eq!(cfg.store_backend, BackendMode::Memory);
    }
}
