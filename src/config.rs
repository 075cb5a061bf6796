//! Layered settings: defaults < `config/default` < `config/<env>` <
//! `CHURN_API__*` environment variables.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_PREFIX: &str = "CHURN_API";
/// Selects the `config/<env>` overlay file.
pub const ENV_NAME_VAR: &str = "CHURN_API_ENV";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_churn_path")]
    pub churn_path: String,
    #[serde(default = "default_clv_path")]
    pub clv_path: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            churn_path: default_churn_path(),
            clv_path: default_clv_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_churn_path() -> String {
    "best_churn_model_trf.json".to_string()
}

fn default_clv_path() -> String {
    "best_clv_model_lnr.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Must be non-zero".to_string(),
            });
        }
        if self.models.churn_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "models.churn_path".to_string(),
                message: "Must not be empty".to_string(),
            });
        }
        if self.models.clv_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "models.clv_path".to_string(),
                message: "Must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Loads settings from `config_dir` and the environment.
pub fn load_settings(config_dir: &str, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder =
        Config::builder().add_source(File::with_name(&format!("{config_dir}/default")).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("{config_dir}/{env_name}")).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("server.cors_origins"),
    );

    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;

    // Process environment is shared across test threads.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert_eq!(s.server.port, 8000);
        assert_eq!(s.bind_addr(), "127.0.0.1:8000");
        assert!(s.server.cors_origins.is_empty());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut s = Settings::default();
        s.server.port = 0;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.models.clv_path = "  ".into();
        assert!(matches!(s.validate(), Err(ConfigError::InvalidValue { ref field, .. }) if field == "models.clv_path"));
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings(dir.path().to_str().unwrap(), Some("nope")).unwrap();
        assert_eq!(s.models, ModelsConfig::default());
    }

    #[test]
    fn test_env_file_overrides_default_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[server]\nport = 9000\n[models]\nchurn_path = \"a.json\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("prod.toml"), "[server]\nport = 9100\n").unwrap();

        let s = load_settings(dir.path().to_str().unwrap(), Some("prod")).unwrap();
        assert_eq!(s.server.port, 9100);
        assert_eq!(s.models.churn_path, "a.json");
        assert_eq!(s.models.clv_path, default_clv_path());
    }

    #[test]
    fn test_env_vars_override_files() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[server]\nport = 9000\n").unwrap();

        std::env::set_var("CHURN_API__SERVER__PORT", "9001");
        std::env::set_var(
            "CHURN_API__SERVER__CORS_ORIGINS",
            "http://a.example,http://b.example",
        );
        let loaded = load_settings(dir.path().to_str().unwrap(), None);
        std::env::remove_var("CHURN_API__SERVER__PORT");
        std::env::remove_var("CHURN_API__SERVER__CORS_ORIGINS");

        let s = loaded.unwrap();
        assert_eq!(s.server.port, 9001);
        assert_eq!(
            s.server.cors_origins,
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
    }
}
