//! Beacon Positioning Core
//!
//! Estimates a device position from Bluetooth Low Energy beacon ranging
//! using an inverse-distance weighted average of known beacon locations,
//! and relays live GPS fixes to the same map.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod utils;
pub mod hardware;
pub mod api;

// Re-export commonly used types
pub use core::{BeaconRecord, DetectedBeaconSample, EstimatedPosition, GpsFix, ResolvedObservation};
pub use algorithms::{estimate, estimate_observations, EstimateError};
pub use processing::{load_all, DirectorySource, LoadReport, ReferenceBeaconIndex, ReferenceError, ReferenceSource};
pub use hardware::{
    BeaconRangingSubsystem, LocationProvider, MapDisplay, MarkerKey, PlatformStatus,
    RangingEvent, Region,
};
pub use api::{
    ApiResult, LocationUpdateRelay, RangingSessionController, SessionState, TrackingCoordinator,
    TrackingError,
};
pub use utils::{init_logging, ConfigError, TrackingConfig};
