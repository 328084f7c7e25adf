use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use super::client::{ClientFactory, ClientHandle};
use super::configuration::MongoConfiguration;
use super::health::MongoHealthCheck;
use super::manager::MongoClientManager;
use crate::global::environment::{ConfiguredBundle, Environment};
use crate::global::error::{AppError, MongoError};

pub const DEFAULT_HEALTH_CHECK_NAME: &str = "mongo";

/// Extracts the mongo section from the host's configuration type
pub type ConfigurationAccessor<C> = Box<dyn Fn(&C) -> MongoConfiguration + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleState {
    Uninitialized,
    Running,
    Stopped,
}

/// Provides a managed, health-checked MongoDB client to a host application.
///
/// ```ignore
/// let bundle = MongoBundle::builder()
///     .with_configuration(|config: &AppConfig| config.mongo.clone())
///     .with_health_check_name("primary-mongo")
///     .build()?;
///
/// bundle.run(&config, &mut environment).await?;
/// let client = bundle.client()?;
/// ```
pub struct MongoBundle<C> {
    accessor: ConfigurationAccessor<C>,
    health_check_name: String,
    running: OnceLock<Running>,
}

struct Running {
    handle: ClientHandle,
    manager: Arc<MongoClientManager>,
}

pub struct MongoBundleBuilder<C> {
    accessor: Option<ConfigurationAccessor<C>>,
    health_check_name: String,
}

impl<C> MongoBundleBuilder<C> {
    pub fn with_configuration<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&C) -> MongoConfiguration + Send + Sync + 'static,
    {
        self.accessor = Some(Box::new(accessor));
        self
    }

    pub fn with_health_check_name(mut self, name: impl Into<String>) -> Self {
        self.health_check_name = name.into();
        self
    }

    pub fn build(self) -> Result<MongoBundle<C>, MongoError> {
        let accessor = self
            .accessor
            .ok_or_else(|| MongoError::Configuration("configuration accessor is required".to_string()))?;

        if self.health_check_name.trim().is_empty() {
            return Err(MongoError::Configuration(
                "health check name must not be empty".to_string(),
            ));
        }

        Ok(MongoBundle {
            accessor,
            health_check_name: self.health_check_name,
            running: OnceLock::new(),
        })
    }
}

impl<C> MongoBundle<C> {
    pub fn builder() -> MongoBundleBuilder<C> {
        MongoBundleBuilder {
            accessor: None,
            health_check_name: DEFAULT_HEALTH_CHECK_NAME.to_string(),
        }
    }

    /// Bundle with the default health check name
    pub fn new<F>(accessor: F) -> Self
    where
        F: Fn(&C) -> MongoConfiguration + Send + Sync + 'static,
    {
        Self {
            accessor: Box::new(accessor),
            health_check_name: DEFAULT_HEALTH_CHECK_NAME.to_string(),
            running: OnceLock::new(),
        }
    }

    pub fn health_check_name(&self) -> &str {
        &self.health_check_name
    }

    pub fn state(&self) -> BundleState {
        match self.running.get() {
            None => BundleState::Uninitialized,
            Some(running) if running.handle.is_stopped() => BundleState::Stopped,
            Some(_) => BundleState::Running,
        }
    }

    /// The client, once `run` has completed.
    pub fn client(&self) -> Result<ClientHandle, MongoError> {
        self.running
            .get()
            .map(|running| running.handle.clone())
            .ok_or(MongoError::NotYetInitialized)
    }

    /// Release the client outside the host's lifecycle. Safe to call more
    /// than once, and a no-op before `run`.
    pub async fn stop(&self) {
        if let Some(running) = self.running.get() {
            running.manager.release().await;
        }
    }

    async fn start(&self, configuration: &C, environment: &mut Environment) -> Result<(), MongoError> {
        if self.running.get().is_some() {
            return Err(MongoError::AlreadyRunning);
        }

        let config = (self.accessor)(configuration);
        info!(health_check = %self.health_check_name, database = %config.database, "Starting mongo bundle");

        let handle = ClientFactory::build(&config).await?;
        let manager = Arc::new(MongoClientManager::new(handle.clone(), config.shutdown_timeout()));
        let check = Arc::new(MongoHealthCheck::new(handle.clone(), config.health_check_timeout()));

        if let Err(e) = environment
            .health_checks()
            .register(self.health_check_name.clone(), check)
        {
            warn!(health_check = %self.health_check_name, error = %e, "Could not register mongo health check");
            manager.release().await;
            return Err(e);
        }
        environment.lifecycle().manage(manager.clone());

        if let Err(rejected) = self.running.set(Running { handle, manager }) {
            // another run won the race; its client is the one exposed
            warn!(health_check = %self.health_check_name, "Mongo bundle started twice, releasing the extra client");
            rejected.manager.release().await;
            return Err(MongoError::AlreadyRunning);
        }

        info!(health_check = %self.health_check_name, "Mongo bundle running");
        Ok(())
    }
}

#[async_trait::async_trait]
impl<C: Send + Sync> ConfiguredBundle<C> for MongoBundle<C> {
    fn initialize(&self) {}

    async fn run(&self, configuration: &C, environment: &mut Environment) -> Result<(), AppError> {
        self.start(configuration, environment).await?;
        Ok(())
    }
}
