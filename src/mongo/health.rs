use std::future::IntoFuture;
use std::time::{Duration, Instant};

use mongodb::bson::doc;
use tracing::debug;

use super::client::ClientHandle;
use crate::global::environment::{HealthCheck, HealthResult};

/// Pings the configured database.
pub struct MongoHealthCheck {
    handle: ClientHandle,
    timeout: Duration,
}

impl MongoHealthCheck {
    pub fn new(handle: ClientHandle, timeout: Duration) -> Self {
        Self { handle, timeout }
    }
}

#[async_trait::async_trait]
impl HealthCheck for MongoHealthCheck {
    async fn check(&self) -> HealthResult {
        let database = self.handle.database_name();
        if self.handle.is_stopped() {
            return HealthResult::unhealthy("mongo client is stopped", 0);
        }

        let start = Instant::now();
        let db = self.handle.database();
        let ping = db.run_command(doc! { "ping": 1 }).into_future();
        let outcome = tokio::time::timeout(self.timeout, ping).await;
        let elapsed = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(_)) => {
                debug!(database = %database, response_time_ms = elapsed, "Mongo ping succeeded");
                HealthResult::healthy(format!("database {} is reachable", database), elapsed)
            }
            Ok(Err(e)) => HealthResult::unhealthy(
                format!("database {} is unreachable: {}", database, e),
                elapsed,
            ),
            Err(_) => HealthResult::unhealthy(
                format!(
                    "database {} did not answer within {}ms",
                    database,
                    self.timeout.as_millis()
                ),
                elapsed,
            ),
        }
    }
}
