//! Managed, health-checked MongoDB client for host applications.
//!
//! A host builds a [`MongoBundle`] with an accessor that pulls a
//! [`MongoConfiguration`] out of its own configuration type, then runs it
//! against an [`Environment`] during startup:
//!
//! ```ignore
//! use mongo_bundle::{ConfiguredBundle, Environment, MongoBundle};
//!
//! let bundle = MongoBundle::new(|config: &AppConfig| config.mongo.clone());
//! let mut environment = Environment::new();
//! bundle.run(&config, &mut environment).await?;
//!
//! let (lifecycle, health_checks) = environment.into_parts();
//! lifecycle.start_all().await?;
//! let users = bundle.client()?.database().collection::<Document>("users");
//! // ...
//! lifecycle.stop_all().await;
//! ```

pub mod api;
pub mod global;
pub mod mongo;

pub use global::environment::{
    ConfiguredBundle, Environment, HealthCheck, HealthCheckRegistry, HealthResult, LifecycleEnvironment, Managed,
};
pub use global::error::{AppError, ConfigError, MongoError};
pub use mongo::{
    BundleState, ClientFactory, ClientHandle, MongoBundle, MongoBundleBuilder, MongoConfiguration, MongoHealthCheck,
    ServerConfiguration, WriteConcernLevel,
};
