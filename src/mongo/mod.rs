//! Managed MongoDB client for host applications.
//!
//! [`MongoBundle`] reads a [`MongoConfiguration`] from the host's configuration,
//! builds the driver client through [`ClientFactory`], and registers a
//! [`MongoClientManager`] and a [`MongoHealthCheck`] with the host [`Environment`].
//!
//! [`Environment`]: crate::global::environment::Environment

mod bundle;
mod client;
mod configuration;
mod health;
mod manager;
mod write_concern;

pub use bundle::{BundleState, ConfigurationAccessor, DEFAULT_HEALTH_CHECK_NAME, MongoBundle, MongoBundleBuilder};
pub use client::{ClientFactory, ClientHandle};
pub use configuration::{CredentialsConfiguration, DEFAULT_PORT, MongoConfiguration, Password, ServerConfiguration};
pub use health::MongoHealthCheck;
pub use manager::MongoClientManager;
pub use write_concern::WriteConcernLevel;

// Re-export driver types for convenience
pub use mongodb::{Client, Collection, Database};
