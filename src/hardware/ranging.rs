//! Beacon ranging subsystem interface

use crate::core::DetectedBeaconSample;
use crate::hardware::{RangingError, RangingResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Advertisement layout the ranging subsystem should decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeaconLayout {
    EddystoneUid,
    EddystoneTlm,
    EddystoneUrl,
    /// Raw layout expression understood by the ranging library
    Custom(String),
}

impl BeaconLayout {
    /// Layout expression handed to the ranging library
    pub fn descriptor(&self) -> &str {
        match self {
            BeaconLayout::EddystoneUid => "s:0-1=feaa,m:2-2=00,p:3-3:-41,i:4-13,i:14-19",
            BeaconLayout::EddystoneTlm => "x,s:0-1=feaa,m:2-2=20,d:3-3,d:4-5,d:6-7,d:8-11,d:12-15",
            BeaconLayout::EddystoneUrl => "s:0-1=feaa,m:2-2=10,p:3-3:-41,i:4-21v",
            BeaconLayout::Custom(expr) => expr,
        }
    }

    /// Layouts registered when nothing else is configured
    pub fn defaults() -> Vec<BeaconLayout> {
        vec![
            BeaconLayout::EddystoneUid,
            BeaconLayout::EddystoneTlm,
            BeaconLayout::EddystoneUrl,
        ]
    }

    pub fn validate(&self) -> RangingResult<()> {
        if self.descriptor().trim().is_empty() {
            return Err(RangingError::InvalidLayout {
                layout: self.descriptor().to_string(),
                reason: "empty layout expression".to_string(),
            });
        }
        Ok(())
    }
}

/// Filter describing which beacons to monitor and range
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    pub unique_id: String,
    pub id1: Option<String>,
    pub id2: Option<String>,
    pub id3: Option<String>,
}

impl Region {
    /// Region without identifier criteria; matches every detectable beacon
    pub fn all_beacons(unique_id: impl Into<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
            id1: None,
            id2: None,
            id3: None,
        }
    }

    pub fn matches_all(&self) -> bool {
        self.id1.is_none() && self.id2.is_none() && self.id3.is_none()
    }
}

/// Monitoring state of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    Inside,
    Outside,
}

/// Events pushed by the ranging subsystem from its own dispatch thread
#[derive(Debug, Clone, PartialEq)]
pub enum RangingEvent {
    /// One ranging cycle worth of detections
    BeaconsDetected(Vec<DetectedBeaconSample>),
    RegionStateChanged { region: String, state: RegionState },
    Error(RangingError),
}

/// Handler installed into the ranging subsystem
pub type RangeHandler = Arc<dyn Fn(RangingEvent) + Send + Sync>;

/// External BLE scanning library
pub trait BeaconRangingSubsystem: Send + Sync {
    /// Register advertisement layouts to decode
    fn configure_layouts(&self, layouts: &[BeaconLayout]) -> RangingResult<()>;

    fn start_monitoring(&self, region: &Region) -> RangingResult<()>;

    fn start_ranging(&self, region: &Region) -> RangingResult<()>;

    fn stop_monitoring(&self, region: &Region) -> RangingResult<()>;

    fn stop_ranging(&self, region: &Region) -> RangingResult<()>;

    /// Install the handler receiving ranging events.
    /// Delivery may continue briefly after the handler is cleared.
    fn set_range_handler(&self, handler: RangeHandler);

    fn clear_range_handler(&self);
}
