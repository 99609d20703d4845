//! Error types reported by the external device subsystems

use thiserror::Error;

/// Failures reported by the beacon ranging subsystem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangingError {
    /// A beacon layout descriptor was rejected
    #[error("invalid beacon layout '{layout}': {reason}")]
    InvalidLayout { layout: String, reason: String },
    /// Monitoring or ranging could not be started for the region
    #[error("failed to start {operation} for region '{region}': {reason}")]
    StartFailed {
        operation: String,
        region: String,
        reason: String,
    },
    /// Monitoring or ranging could not be stopped for the region
    #[error("failed to stop {operation} for region '{region}': {reason}")]
    StopFailed {
        operation: String,
        region: String,
        reason: String,
    },
    /// Scanning hardware is unavailable (adapter off, scan throttled, ...)
    #[error("scanner unavailable: {0}")]
    ScannerUnavailable(String),
}

/// Result type for ranging subsystem operations
pub type RangingResult<T> = Result<T, RangingError>;

/// Failures reported by the device location provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    /// The provider refused the update request
    #[error("location update request rejected: {0}")]
    RequestRejected(String),
    /// The subscription handle is not known to the provider
    #[error("unknown location subscription {0}")]
    UnknownSubscription(u64),
    /// Location services are switched off
    #[error("location provider disabled")]
    ProviderDisabled,
}

/// Result type for location provider operations
pub type LocationResult<T> = Result<T, LocationError>;

impl RangingError {
    pub fn start_failed(operation: &str, region: &str, reason: impl Into<String>) -> Self {
        RangingError::StartFailed {
            operation: operation.to_string(),
            region: region.to_string(),
            reason: reason.into(),
        }
    }

    pub fn stop_failed(operation: &str, region: &str, reason: impl Into<String>) -> Self {
        RangingError::StopFailed {
            operation: operation.to_string(),
            region: region.to_string(),
            reason: reason.into(),
        }
    }
}
