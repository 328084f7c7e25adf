use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::error::{AppError, MongoError};

/// An object whose start and stop are driven by the host process
#[async_trait::async_trait]
pub trait Managed: Send + Sync {
    /// Name for logging
    fn name(&self) -> &str;

    async fn start(&self) -> Result<(), AppError>;

    async fn stop(&self) -> Result<(), AppError>;
}

/// A named probe polled by the host's health surface
#[async_trait::async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> HealthResult;
}

/// Extension point a bundle implements to hook into host startup
#[async_trait::async_trait]
pub trait ConfiguredBundle<C: Send + Sync>: Send + Sync {
    /// Called before configuration is available
    fn initialize(&self) {}

    /// Called once configuration is loaded
    async fn run(&self, configuration: &C, environment: &mut Environment) -> Result<(), AppError>;
}

/// Outcome of a single health check
#[derive(Debug, Clone, Serialize)]
pub struct HealthResult {
    pub healthy: bool,
    pub message: String,
    pub response_time_ms: u64,
    pub checked_at: DateTime<Utc>,
}

impl HealthResult {
    pub fn healthy(message: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            healthy: true,
            message: message.into(),
            response_time_ms,
            checked_at: Utc::now(),
        }
    }

    pub fn unhealthy(message: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            healthy: false,
            message: message.into(),
            response_time_ms,
            checked_at: Utc::now(),
        }
    }
}

/// Registry of managed objects, started in order and stopped in reverse
#[derive(Default)]
pub struct LifecycleEnvironment {
    managed: Vec<Arc<dyn Managed>>,
}

impl LifecycleEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manage(&mut self, managed: Arc<dyn Managed>) {
        debug!(managed = %managed.name(), "Registering managed object");
        self.managed.push(managed);
    }

    pub fn len(&self) -> usize {
        self.managed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managed.is_empty()
    }

    /// Start every managed object; the first failure aborts startup
    pub async fn start_all(&self) -> Result<(), AppError> {
        for managed in &self.managed {
            info!(managed = %managed.name(), "Starting managed object");
            if let Err(e) = managed.start().await {
                error!(managed = %managed.name(), error = %e, "Managed object failed to start");
                return Err(AppError::Lifecycle {
                    name: managed.name().to_string(),
                    reason: e.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Stop every managed object in reverse registration order.
    /// Failures are logged so the rest of shutdown still runs.
    pub async fn stop_all(&self) {
        for managed in self.managed.iter().rev() {
            info!(managed = %managed.name(), "Stopping managed object");
            if let Err(e) = managed.stop().await {
                warn!(managed = %managed.name(), error = %e, "Failed to stop managed object");
            }
        }
    }
}

/// Named health checks
#[derive(Default)]
pub struct HealthCheckRegistry {
    checks: BTreeMap<String, Arc<dyn HealthCheck>>,
}

impl HealthCheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, check: Arc<dyn HealthCheck>) -> Result<(), MongoError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MongoError::Configuration("health check name must not be empty".to_string()));
        }
        if self.checks.contains_key(&name) {
            return Err(MongoError::Configuration(format!(
                "a health check named '{}' is already registered",
                name
            )));
        }

        debug!(health_check = %name, "Registering health check");
        self.checks.insert(name, check);
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.checks.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub async fn run(&self, name: &str) -> Option<HealthResult> {
        let check = self.checks.get(name)?;
        Some(check.check().await)
    }

    /// Run every check concurrently
    pub async fn run_all(&self) -> BTreeMap<String, HealthResult> {
        let futures = self.checks.iter().map(|(name, check)| {
            let name = name.clone();
            let check = check.clone();
            async move { (name, check.check().await) }
        });

        let results = futures::future::join_all(futures).await;
        for (name, result) in &results {
            if !result.healthy {
                warn!(health_check = %name, message = %result.message, "Health check failed");
            }
        }
        results.into_iter().collect()
    }
}

/// What a bundle sees of the host while it runs
#[derive(Default)]
pub struct Environment {
    lifecycle: LifecycleEnvironment,
    health_checks: HealthCheckRegistry,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lifecycle(&mut self) -> &mut LifecycleEnvironment {
        &mut self.lifecycle
    }

    pub fn health_checks(&mut self) -> &mut HealthCheckRegistry {
        &mut self.health_checks
    }

    /// Split into the registries the host keeps after startup
    pub fn into_parts(self) -> (LifecycleEnvironment, HealthCheckRegistry) {
        (self.lifecycle, self.health_checks)
    }
}
