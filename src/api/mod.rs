//! Session controllers and tracking commands
//!
//! The ranging controller and the GPS relay are independent start/stop
//! state machines fed by callbacks from their subsystems; the coordinator
//! exposes them as the `begin_tracking` / `end_tracking` commands.

pub mod ranging_session;
pub mod location_relay;
pub mod tracking;
pub mod types;

pub use types::{ApiResult, SessionState, TrackingError};
pub use ranging_session::{resolve_samples, RangingSessionController, RangingStats};
pub use location_relay::LocationUpdateRelay;
pub use tracking::TrackingCoordinator;
