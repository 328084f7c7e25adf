use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use mongo_bundle::api::{server, state::ApiState};
use mongo_bundle::global::{config::AppConfig, logging};
use mongo_bundle::{ConfiguredBundle, Environment, MongoBundle};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            eprintln!("Please ensure config.toml exists in the working directory");
            return Err(e.into());
        }
    };

    let _log_guard = logging::init(&config.app);

    info!("Starting mongo-bundle host...");
    debug!(?config, "Loaded configuration");

    let bundle = MongoBundle::builder()
        .with_configuration(|config: &AppConfig| config.mongo.clone())
        .build()?;
    bundle.initialize();

    let mut environment = Environment::new();
    bundle.run(&config, &mut environment).await?;

    let (lifecycle, health_checks) = environment.into_parts();
    if let Err(e) = lifecycle.start_all().await {
        error!(error = %e, "Startup failed, releasing managed objects");
        lifecycle.stop_all().await;
        return Err(e.into());
    }

    let state = ApiState::new(Arc::new(health_checks)).with_mongo(bundle.client()?);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        warn!("Shutdown signal received, initiating graceful shutdown");
    };

    info!("Application running, press Ctrl+C to shutdown");
    let served = server::start_api_server(state, &config.server_address(), shutdown).await;
    if let Err(e) = &served {
        error!(error = %e, "API server stopped with an error");
    }

    lifecycle.stop_all().await;
    info!("Shutdown complete");

    served.map_err(Into::into)
}
