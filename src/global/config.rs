use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::global::error::ConfigError;
use crate::mongo::MongoConfiguration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub app: AppSettings,
    #[serde(default)]
    pub server: ServerConfig,
    pub mongo: MongoConfiguration,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppSettings {
    pub log_level: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_to_file")]
    pub log_to_file: bool,
    #[serde(default = "default_log_directory")]
    pub log_directory: String,
    #[serde(default = "default_log_file_prefix")]
    pub log_file_prefix: String,
    #[serde(default = "default_log_rotation")]
    pub log_rotation: LogRotation,
    #[serde(default = "default_log_to_console")]
    pub log_to_console: bool,
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Daily,
    Hourly,
    Never,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_log_to_file() -> bool {
    false
}

fn default_log_directory() -> String {
    "./logs".to_string()
}

fn default_log_file_prefix() -> String {
    "mongo-bundle".to_string()
}

fn default_log_rotation() -> LogRotation {
    LogRotation::Daily
}

fn default_log_to_console() -> bool {
    true
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8081
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_to_file: default_log_to_file(),
            log_directory: default_log_directory(),
            log_file_prefix: default_log_file_prefix(),
            log_rotation: default_log_rotation(),
            log_to_console: default_log_to_console(),
            json: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from config.toml, overridden by `APP__*` env vars
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(config::Config::builder().add_source(config::File::with_name("config")))
    }

    /// Load configuration from an explicit file, overridden by `APP__*` env vars
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::LoadFailed(format!("{} does not exist", path.display())));
        }
        Self::from_builder(config::Config::builder().add_source(config::File::from(path)))
    }

    /// Parse configuration from TOML text, overridden by `APP__*` env vars
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Self::from_builder(
            config::Config::builder().add_source(config::File::from_str(contents, config::FileFormat::Toml)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config = builder
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Catch the errors that would otherwise only show up once the bundle runs
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mongo
            .validate()
            .map(|_| ())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[app]
log_level = "debug"

[server]
port = 9000

[mongo]
database = "app"
writeConcern = "MAJORITY"

[[mongo.seeds]]
host = "db1"
port = 27017

[[mongo.seeds]]
host = "db2"

[mongo.credentials]
userName = "svc"
password = "pw"
"#;

    #[test]
    fn test_from_toml() {
        temp_env::with_vars_unset(["APP__SERVER__PORT", "APP__MONGO__DATABASE"], || {
            let config = AppConfig::from_toml(SAMPLE).unwrap();

            assert_eq!(config.app.log_level, "debug");
            assert!(!config.app.logging.log_to_file);
            assert_eq!(config.server.port, 9000);
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.mongo.database, "app");
            assert_eq!(config.mongo.seeds.len(), 2);
            assert_eq!(config.mongo.seeds[0].to_string(), "db1:27017");
            assert_eq!(config.mongo.seeds[1].to_string(), "db2:27017");
            assert_eq!(config.mongo.write_concern, "MAJORITY");
            assert_eq!(config.mongo.credentials.as_ref().unwrap().user_name, "svc");
            assert_eq!(config.server_address(), "127.0.0.1:9000");
        });
    }

    #[test]
    fn test_env_overrides_file() {
        temp_env::with_vars(
            [
                ("APP__SERVER__PORT", Some("9100")),
                ("APP__MONGO__DATABASE", Some("override")),
            ],
            || {
                let config = AppConfig::from_toml(SAMPLE).unwrap();
                assert_eq!(config.server.port, 9100);
                assert_eq!(config.mongo.database, "override");
            },
        );
    }

    #[test]
    fn test_invalid_write_concern_is_rejected() {
        let contents = SAMPLE.replace("MAJORITY", "BOGUS");
        temp_env::with_vars_unset(["APP__SERVER__PORT", "APP__MONGO__DATABASE"], || {
            let err = AppConfig::from_toml(&contents).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));
        });
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load_from("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed(_)));
    }
}
