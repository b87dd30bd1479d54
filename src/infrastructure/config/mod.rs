use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::{AppError, Result};

pub const CONFIG_FILE: &str = "contact_bridge.toml";
pub const ENV_PREFIX: &str = "CONTACT_BRIDGE_";

/// Service configuration.
///
/// Sources, later ones winning: built-in defaults, `contact_bridge.toml` in
/// the working directory, then `CONTACT_BRIDGE_*` environment variables
/// (a `.env` file is loaded into the environment first).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    /// Inbound webhook base URL, e.g. `https://portal.example.com/rest/1/secret`
    #[validate(url(message = "webhook_url must be an absolute URL"))]
    pub webhook_url: String,

    /// Calls per `batch` request; the CRM accepts at most 50
    #[validate(range(min = 1, max = 50))]
    pub batch_chunk_size: usize,

    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            webhook_url: String::new(),
            batch_chunk_size: 50,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_layers_file_and_env_over_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "port = 8080\nbatch_chunk_size = 25\n")?;
            jail.set_env("CONTACT_BRIDGE_WEBHOOK_URL", "https://portal.example.com/rest/1/abc");
            jail.set_env("CONTACT_BRIDGE_PORT", "9090");

            let config = AppConfig::from_figment(AppConfig::figment()).unwrap();

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 9090);
            assert_eq!(config.batch_chunk_size, 25);
            assert_eq!(config.webhook_url, "https://portal.example.com/rest/1/abc");
            Ok(())
        });
    }

    #[test]
    fn test_missing_webhook_is_rejected() {
        Jail::expect_with(|_jail| {
            let err = AppConfig::from_figment(AppConfig::figment()).unwrap_err();
            assert!(matches!(err, AppError::Config(_)));
            Ok(())
        });
    }

    #[test]
    fn test_chunk_size_above_limit_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("CONTACT_BRIDGE_WEBHOOK_URL", "https://portal.example.com/rest/1/abc");
            jail.set_env("CONTACT_BRIDGE_BATCH_CHUNK_SIZE", "51");

            let err = AppConfig::from_figment(AppConfig::figment()).unwrap_err();
            assert!(err.to_string().contains("batch_chunk_size"));
            Ok(())
        });
    }
}
