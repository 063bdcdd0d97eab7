use std::env;
use std::path::PathBuf;

use crate::errors::{ConfigError, CoreError};

const DEFAULT_PREFIX: &str = "RULEBUILDER_";
const DEFAULT_MOUNT: &str = "#rule-builder";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime environment used by the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Settings a host needs to mount a rule builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Identifier of the mount point the builder renders into.
    pub mount: String,
    /// Optional field catalog file; the built-in catalog is used when absent.
    pub fields_path: Option<PathBuf>,
    pub log_level: String,
    pub environment: Environment,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            mount: DEFAULT_MOUNT.to_string(),
            fields_path: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            environment: Environment::Development,
        }
    }
}

impl BuilderConfig {
    /// Loads configuration from `RULEBUILDER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_with_prefix(DEFAULT_PREFIX)
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `ALERTS_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let mount = match env::var(key("MOUNT")) {
            Ok(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::InvalidEnvVar {
                    key: key("MOUNT"),
                    value: raw,
                })
            }
            Ok(raw) => raw,
            Err(_) => DEFAULT_MOUNT.to_string(),
        };

        let fields_path = env::var(key("FIELDS"))
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);

        let log_level = env::var(key("LOG")).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

        let environment = env::var(key("ENV"))
            .map(|raw| Environment::parse(&raw))
            .unwrap_or_default();

        Ok(Self {
            mount,
            fields_path,
            log_level,
            environment,
        })
    }

    /// Whether the host is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

/// Helper that loads config and converts to the canonical core error type.
pub fn load_builder_config() -> Result<BuilderConfig, CoreError> {
    Ok(BuilderConfig::from_env()?)
}
