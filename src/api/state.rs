use std::sync::Arc;

use crate::global::environment::HealthCheckRegistry;
use crate::mongo::ClientHandle;

/// Application state shared across API handlers
#[derive(Clone)]
pub struct ApiState {
    pub health_checks: Arc<HealthCheckRegistry>,
    pub mongo: Option<ClientHandle>,
}

impl ApiState {
    pub fn new(health_checks: Arc<HealthCheckRegistry>) -> Self {
        Self {
            health_checks,
            mongo: None,
        }
    }

    pub fn with_mongo(mut self, client: ClientHandle) -> Self {
        self.mongo = Some(client);
        self
    }
}
