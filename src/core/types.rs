//! Core data types for the positioning system

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Known physical beacon with its surveyed location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconRecord {
    /// Stable key reported by the ranging subsystem (Bluetooth address)
    #[serde(rename = "beaconUid")]
    pub identifier: String,
    /// Backend record id, not used in computation
    #[serde(default)]
    pub id: Option<Value>,
    /// WGS84 latitude in degrees
    pub latitude: f64,
    /// WGS84 longitude in degrees
    pub longitude: f64,
    /// Remaining descriptive fields (name, floor, ...)
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl BeaconRecord {
    pub fn new(identifier: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            identifier: identifier.into(),
            id: None,
            latitude,
            longitude,
            metadata: Map::new(),
        }
    }

    /// Human readable name, if the reference file carried one
    pub fn name(&self) -> Option<&str> {
        self.metadata.get("name").and_then(Value::as_str)
    }
}

/// Single live observation from one ranging cycle
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedBeaconSample {
    pub identifier: String,
    /// Distance in meters as computed by the ranging subsystem
    pub measured_distance: f64,
}

impl DetectedBeaconSample {
    pub fn new(identifier: impl Into<String>, measured_distance: f64) -> Self {
        Self {
            identifier: identifier.into(),
            measured_distance,
        }
    }
}

/// Detected beacon matched against its reference record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedObservation {
    pub latitude: f64,
    pub longitude: f64,
    pub distance: f64,
}

/// Beacon-derived position estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatedPosition {
    pub latitude: f64,
    pub longitude: f64,
}

/// One location sample from the device positioning provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}
