pub mod config;
pub mod environment;
pub mod error;
pub mod logging;
pub mod model;
