use std::fmt;
use std::time::Duration;

use mongodb::options::ServerAddress;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::write_concern::WriteConcernLevel;
use crate::global::error::MongoError;

pub const DEFAULT_PORT: u16 = 27017;

/// Connection settings for a MongoDB deployment, as read from host configuration.
///
/// Field names follow the camelCase layout of the inbound configuration
/// (`seeds`, `credentials.userName`, `writeConcern`, ...). Lowercase and
/// snake_case aliases are accepted as well since some configuration sources
/// normalise key case.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MongoConfiguration {
    pub seeds: Vec<ServerConfiguration>,
    #[serde(default)]
    pub credentials: Option<CredentialsConfiguration>,
    pub database: String,
    #[serde(default = "default_write_concern", alias = "writeconcern", alias = "write_concern")]
    pub write_concern: String,
    #[serde(default, alias = "appname", alias = "app_name")]
    pub app_name: Option<String>,
    #[serde(
        default = "default_connect_timeout_secs",
        alias = "connecttimeoutsecs",
        alias = "connect_timeout_secs"
    )]
    pub connect_timeout_secs: u64,
    #[serde(
        default = "default_server_selection_timeout_secs",
        alias = "serverselectiontimeoutsecs",
        alias = "server_selection_timeout_secs"
    )]
    pub server_selection_timeout_secs: u64,
    #[serde(
        default = "default_health_check_timeout_ms",
        alias = "healthchecktimeoutms",
        alias = "health_check_timeout_ms"
    )]
    pub health_check_timeout_ms: u64,
    #[serde(
        default = "default_shutdown_timeout_secs",
        alias = "shutdowntimeoutsecs",
        alias = "shutdown_timeout_secs"
    )]
    pub shutdown_timeout_secs: u64,
    /// Resolve every seed through DNS while building the client instead of
    /// leaving it to the driver's first connection attempt.
    #[serde(default, alias = "resolveseeds", alias = "resolve_seeds")]
    pub resolve_seeds: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServerConfiguration {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfiguration {
    #[serde(alias = "username", alias = "user_name")]
    pub user_name: String,
    pub password: Password,
}

/// A password that never shows up in logs or serialized output.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

fn default_write_concern() -> String {
    WriteConcernLevel::Acknowledged.as_str().to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_server_selection_timeout_secs() -> u64 {
    30
}

fn default_health_check_timeout_ms() -> u64 {
    2000
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

impl MongoConfiguration {
    /// Anonymous configuration with a single seed and the default write concern.
    pub fn new(database: impl Into<String>, seeds: Vec<ServerConfiguration>) -> Self {
        Self {
            seeds,
            credentials: None,
            database: database.into(),
            write_concern: default_write_concern(),
            app_name: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            server_selection_timeout_secs: default_server_selection_timeout_secs(),
            health_check_timeout_ms: default_health_check_timeout_ms(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            resolve_seeds: false,
        }
    }

    pub fn with_credentials(mut self, user_name: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(CredentialsConfiguration {
            user_name: user_name.into(),
            password: Password::new(password),
        });
        self
    }

    pub fn with_write_concern(mut self, write_concern: impl Into<String>) -> Self {
        self.write_concern = write_concern.into();
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn with_health_check_timeout(mut self, timeout: Duration) -> Self {
        self.health_check_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Check the invariants that must hold before any client is built.
    ///
    /// Returns the parsed write concern so callers don't parse it twice.
    pub fn validate(&self) -> Result<WriteConcernLevel, MongoError> {
        if self.seeds.is_empty() {
            return Err(MongoError::Configuration(
                "at least one seed server is required".to_string(),
            ));
        }

        for (index, seed) in self.seeds.iter().enumerate() {
            if seed.host.trim().is_empty() {
                return Err(MongoError::Configuration(format!(
                    "seed server #{} has an empty host",
                    index
                )));
            }
            seed.address()?;
        }

        if self.database.trim().is_empty() {
            return Err(MongoError::Configuration(
                "database name must not be empty".to_string(),
            ));
        }

        if let Some(credentials) = &self.credentials {
            if credentials.user_name.is_empty() {
                return Err(MongoError::Configuration(
                    "credentials userName must not be empty".to_string(),
                ));
            }
            if credentials.password.is_empty() {
                return Err(MongoError::Configuration(format!(
                    "credentials password for {} must not be empty",
                    credentials.user_name
                )));
            }
        }

        let timeouts = [
            ("connectTimeoutSecs", self.connect_timeout_secs),
            ("serverSelectionTimeoutSecs", self.server_selection_timeout_secs),
            ("healthCheckTimeoutMs", self.health_check_timeout_ms),
            ("shutdownTimeoutSecs", self.shutdown_timeout_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, value)| *value == 0) {
            return Err(MongoError::Configuration(format!("{} must be greater than 0", name)));
        }

        let level = self.write_concern.parse::<WriteConcernLevel>()?;
        Ok(level)
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_millis(self.health_check_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for MongoConfiguration {
    fn default() -> Self {
        Self::new("default", vec![ServerConfiguration::default()])
    }
}

impl ServerConfiguration {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Driver address for this seed. The host must be a bare hostname or IP,
    /// without scheme, port or whitespace.
    pub fn address(&self) -> Result<ServerAddress, MongoError> {
        let malformed = |reason: &str| {
            MongoError::Configuration(format!("seed server '{}' is malformed: {}", self, reason))
        };

        if self.port == 0 {
            return Err(malformed("port must not be 0"));
        }
        if self.host.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(malformed("host contains whitespace or '/'"));
        }

        let address = ServerAddress::parse(self.to_string()).map_err(|e| malformed(&e.to_string()))?;
        match &address {
            ServerAddress::Tcp { port: Some(port), .. } if *port == self.port => Ok(address),
            _ => Err(malformed("host must not carry its own port")),
        }
    }
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PORT)
    }
}

impl fmt::Display for ServerConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(****)")
    }
}

impl Serialize for Password {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("****")
    }
}

impl<'de> Deserialize<'de> for Password {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_seed_config() -> MongoConfiguration {
        MongoConfiguration::new(
            "app",
            vec![
                ServerConfiguration::new("db1", 27017),
                ServerConfiguration::new("db2", 27017),
            ],
        )
    }

    #[test]
    fn test_deserialize_camel_case_layout() {
        let json = serde_json::json!({
            "seeds": [{ "host": "db1", "port": 27017 }, { "host": "db2" }],
            "credentials": { "userName": "svc", "password": "pw" },
            "database": "app",
            "writeConcern": "MAJORITY"
        });

        let config: MongoConfiguration = serde_json::from_value(json).unwrap();
        assert_eq!(config.seeds.len(), 2);
        assert_eq!(config.seeds[1].port, DEFAULT_PORT);
        assert_eq!(config.credentials.as_ref().unwrap().user_name, "svc");
        assert_eq!(config.credentials.as_ref().unwrap().password.expose(), "pw");
        assert_eq!(config.write_concern, "MAJORITY");
        assert_eq!(config.health_check_timeout_ms, 2000);
        assert!(!config.resolve_seeds);
    }

    #[test]
    fn test_deserialize_lowercased_keys() {
        let json = serde_json::json!({
            "seeds": [{ "host": "db1", "port": 27018 }],
            "credentials": { "username": "svc", "password": "pw" },
            "database": "app",
            "writeconcern": "W2"
        });

        let config: MongoConfiguration = serde_json::from_value(json).unwrap();
        assert_eq!(config.write_concern, "W2");
        assert_eq!(config.credentials.unwrap().user_name, "svc");
    }

    #[test]
    fn test_write_concern_defaults_to_acknowledged() {
        let json = serde_json::json!({
            "seeds": [{ "host": "db1" }],
            "database": "app"
        });

        let config: MongoConfiguration = serde_json::from_value(json).unwrap();
        assert_eq!(config.write_concern, "ACKNOWLEDGED");
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_password_is_redacted() {
        let config = two_seed_config().with_credentials("svc", "hunter2");

        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));

        let serialized = serde_json::to_string(&config).unwrap();
        assert!(!serialized.contains("hunter2"));
    }

    #[test]
    fn test_validate_accepts_valid_config() {
        let level = two_seed_config()
            .with_credentials("svc", "pw")
            .with_write_concern("MAJORITY")
            .validate()
            .unwrap();
        assert_eq!(level, WriteConcernLevel::Majority);
    }

    #[test]
    fn test_validate_rejects_empty_seeds() {
        let config = MongoConfiguration::new("app", vec![]);
        assert!(matches!(config.validate(), Err(MongoError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_bad_seed() {
        let config = MongoConfiguration::new("app", vec![ServerConfiguration::new(" ", 27017)]);
        assert!(matches!(config.validate(), Err(MongoError::Configuration(_))));

        let config = MongoConfiguration::new("app", vec![ServerConfiguration::new("db1", 0)]);
        assert!(matches!(config.validate(), Err(MongoError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_malformed_seed_host() {
        for host in ["db1:27017", "mongodb://db1", "[::1", "db 1", " db1"] {
            let config = MongoConfiguration::new(
                "app",
                vec![ServerConfiguration::new("db0", 27017), ServerConfiguration::new(host, 27017)],
            );
            match config.validate() {
                Err(MongoError::Configuration(message)) => assert!(message.contains("malformed"), "{host}: {message}"),
                other => panic!("{host} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_seed_address_keeps_host_and_port() {
        let address = ServerConfiguration::new("db1.internal", 27018).address().unwrap();
        assert_eq!(address.to_string(), "db1.internal:27018");

        let address = ServerConfiguration::new("10.0.0.5", 27017).address().unwrap();
        assert_eq!(address.to_string(), "10.0.0.5:27017");
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = two_seed_config();
        config.health_check_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(MongoError::Configuration(m)) if m.contains("healthCheckTimeoutMs")));

        let mut config = two_seed_config();
        config.shutdown_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(MongoError::Configuration(m)) if m.contains("shutdownTimeoutSecs")));

        let mut config = two_seed_config();
        config.server_selection_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(MongoError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_empty_credentials() {
        let config = two_seed_config().with_credentials("", "pw");
        assert!(matches!(config.validate(), Err(MongoError::Configuration(_))));

        let config = two_seed_config().with_credentials("svc", "");
        assert!(matches!(config.validate(), Err(MongoError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_empty_database() {
        let config = MongoConfiguration::new("", vec![ServerConfiguration::default()]);
        assert!(matches!(config.validate(), Err(MongoError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_write_concern() {
        let err = two_seed_config().with_write_concern("BOGUS").validate().unwrap_err();
        match err {
            MongoError::Configuration(message) => assert!(message.contains("BOGUS")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
