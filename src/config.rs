use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub dry_run: DryRunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// REST endpoint of the ledger bridge
    pub base_url: String,
    /// API key id for signed requests (secret comes from the environment)
    #[serde(default)]
    pub api_key_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Connected wallet address, if any. Operations that need one fail
    /// with NotConnected when absent.
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DryRunConfig {
    /// Enable dry run mode (in-memory ledger, no real submissions)
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("dry_run.enabled", true)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Environment-specific config (e.g. config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("PROPDESK_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (PROPDESK_LEDGER__BASE_URL, etc.)
            .add_source(
                Environment::with_prefix("PROPDESK")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Create a default configuration for CLI usage
    pub fn default_config(dry_run: bool) -> Self {
        Self {
            ledger: LedgerConfig {
                base_url: "https://bridge.propdesk.example/api/v1".to_string(),
                api_key_id: None,
            },
            session: SessionConfig::default(),
            dry_run: DryRunConfig { enabled: dry_run },
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.ledger.base_url.is_empty() {
            errors.push("ledger.base_url must be set".to_string());
        } else if url::Url::parse(&self.ledger.base_url).is_err() {
            errors.push(format!(
                "ledger.base_url is not a valid URL: {}",
                self.ledger.base_url
            ));
        }

        if let Some(addr) = &self.session.address {
            if crate::domain::Address::parse(addr).is_err() {
                errors.push(format!("session.address is not a valid address: {}", addr));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = AppConfig::default_config(true);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_session_address_is_flagged() {
        let mut config = AppConfig::default_config(true);
        config.session.address = Some("not-an-address".to_string());
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn bad_base_url_is_flagged() {
        let mut config = AppConfig::default_config(true);
        config.ledger.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
