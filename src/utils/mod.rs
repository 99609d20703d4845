//! Utility modules for configuration and logging

pub mod config;
pub mod logging;

pub use config::{ConfigError, MapConfig, RangingConfig, ReferenceConfig, TrackingConfig};
pub use logging::init_logging;
