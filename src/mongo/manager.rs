use std::future::IntoFuture;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::client::ClientHandle;
use crate::global::environment::Managed;
use crate::global::error::AppError;

/// Ties the MongoDB client to the host's start/stop sequence.
pub struct MongoClientManager {
    handle: ClientHandle,
    shutdown_timeout: Duration,
}

impl MongoClientManager {
    pub fn new(handle: ClientHandle, shutdown_timeout: Duration) -> Self {
        Self {
            handle,
            shutdown_timeout,
        }
    }

    /// Release the client. Only the first call does any work; shutdown
    /// problems are logged because shutdown has to carry on regardless.
    pub async fn release(&self) {
        if !self.handle.mark_stopped() {
            debug!(database = %self.handle.database_name(), "Mongo client already stopped");
            return;
        }

        info!(database = %self.handle.database_name(), "Closing mongo client");
        let client = self.handle.client().clone();
        let shutdown = client.shutdown().into_future();
        match tokio::time::timeout(self.shutdown_timeout, shutdown).await {
            Ok(_) => info!(database = %self.handle.database_name(), "Mongo client closed"),
            Err(_) => warn!(
                database = %self.handle.database_name(),
                timeout_secs = self.shutdown_timeout.as_secs(),
                "Timed out waiting for mongo client to close"
            ),
        }
    }
}

#[async_trait::async_trait]
impl Managed for MongoClientManager {
    fn name(&self) -> &str {
        "mongo-client"
    }

    async fn start(&self) -> Result<(), AppError> {
        // the driver connects on its own
        debug!(database = %self.handle.database_name(), "Mongo client manager started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), AppError> {
        self.release().await;
        Ok(())
    }
}
