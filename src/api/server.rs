use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api::{routes, state::ApiState};
use crate::global::error::AppError;

/// Serve the API until `shutdown` resolves
pub async fn start_api_server<F>(state: ApiState, address: &str, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_app(state);

    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| AppError::Server(format!("invalid server address {}: {}", address, e)))?;

    info!(address = %address, "Starting API server");

    let listener = TcpListener::bind(socket_addr).await?;

    info!(address = %address, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| {
            error!(error = %e, "API server error");
            AppError::Io(e)
        })
}

/// Create the Axum application with middleware
pub fn create_app(state: ApiState) -> Router {
    let router = routes::create_router(state);

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
