//! Device location provider interface

use crate::core::{GpsFix, GPS_INTERVAL_MS, GPS_MAX_DELAY_MS, GPS_MIN_INTERVAL_MS};
use crate::hardware::LocationResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Power/accuracy trade-off requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationPriority {
    HighAccuracy,
    Balanced,
    LowPower,
}

/// Parameters of a periodic location subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationRequest {
    pub priority: LocationPriority,
    /// Desired interval between fixes (ms)
    pub interval_ms: u64,
    /// Fastest interval the relay accepts (ms)
    pub min_interval_ms: u64,
    /// Maximum delay before batched fixes are delivered (ms)
    pub max_delay_ms: u64,
    /// Minimum displacement between fixes (m)
    pub min_distance_m: f64,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            priority: LocationPriority::HighAccuracy,
            interval_ms: GPS_INTERVAL_MS,
            min_interval_ms: GPS_MIN_INTERVAL_MS,
            max_delay_ms: GPS_MAX_DELAY_MS,
            min_distance_m: 0.0,
        }
    }
}

/// Handle identifying one active location subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handler invoked on the provider's thread for every fix
pub type FixHandler = Arc<dyn Fn(GpsFix) + Send + Sync>;

/// External GPS / fused location service
pub trait LocationProvider: Send + Sync {
    fn request_updates(
        &self,
        request: &LocationRequest,
        handler: FixHandler,
    ) -> LocationResult<SubscriptionId>;

    fn remove_updates(&self, subscription: SubscriptionId) -> LocationResult<()>;
}
