//! Boundary to the external device subsystems
//!
//! The positioning core never talks to Bluetooth, GPS or the map directly.
//! Each collaborator is a trait implemented by the hosting application;
//! `mock` provides in-memory implementations for tests and demos.

pub mod ranging;
pub mod gps;
pub mod map;
pub mod platform;
pub mod mock;
pub mod error;

pub use ranging::{BeaconLayout, BeaconRangingSubsystem, RangeHandler, RangingEvent, Region, RegionState};
pub use gps::{FixHandler, LocationPriority, LocationProvider, LocationRequest, SubscriptionId};
pub use map::{MapDisplay, MarkerKey};
pub use platform::{Permission, PlatformStatus};
pub use mock::{GatedMap, MockLocationProvider, MockPlatform, MockRangingSubsystem, RecordingMap};
pub use error::{LocationError, LocationResult, RangingError, RangingResult};
