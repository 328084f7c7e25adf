use super::model::ParseEnumError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Mongo(#[from] MongoError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("managed object '{name}' failed to start: {reason}")]
    Lifecycle { name: String, reason: String },

    #[error("server error: {0}")]
    Server(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while building or accessing the MongoDB client.
#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("mongo configuration error: {0}")]
    Configuration(String),

    #[error("mongo connection error: {0}")]
    Connection(String),

    #[error("mongo client is not initialized, the bundle has not run yet")]
    NotYetInitialized,

    #[error("mongo bundle is already running")]
    AlreadyRunning,
}

impl From<ParseEnumError> for MongoError {
    fn from(err: ParseEnumError) -> Self {
        MongoError::Configuration(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
