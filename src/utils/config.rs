use crate::core::{ALL_BEACONS_REGION, DEFAULT_CENTER_SCALE, DEFAULT_REFERENCE_FILES};
use crate::hardware::{BeaconLayout, LocationRequest, Region};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Complete configuration of the tracking core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Where the reference beacon documents are read from
    pub reference: ReferenceConfig,
    /// Beacon ranging session parameters
    pub ranging: RangingConfig,
    /// GPS subscription parameters
    pub gps: LocationRequest,
    /// Map marker behaviour
    pub map: MapConfig,
}

/// Reference beacon documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Directory holding the bundled documents
    pub directory: PathBuf,
    /// Document names, in load order (later duplicates win)
    pub files: Vec<String>,
}

/// Ranging session parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangingConfig {
    /// Unique id of the unconstrained region
    pub region_id: String,
    /// Advertisement layouts registered on start
    pub layouts: Vec<BeaconLayout>,
}

/// Map marker behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Recenter the camera on every marker update
    pub center_on_update: bool,
    /// Camera scale used when recentering
    pub center_scale: f64,
    /// Remove a session's marker when the session stops
    pub clear_markers_on_stop: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            reference: ReferenceConfig::default(),
            ranging: RangingConfig::default(),
            gps: LocationRequest::default(),
            map: MapConfig::default(),
        }
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("assets"),
            files: DEFAULT_REFERENCE_FILES.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl Default for RangingConfig {
    fn default() -> Self {
        Self {
            region_id: ALL_BEACONS_REGION.to_string(),
            layouts: BeaconLayout::defaults(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_on_update: true,
            center_scale: DEFAULT_CENTER_SCALE,
            clear_markers_on_stop: false,
        }
    }
}

impl RangingConfig {
    /// Region covering every detectable beacon
    pub fn region(&self) -> Region {
        Region::all_beacons(self.region_id.clone())
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn invalid(parameter: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl TrackingConfig {
    /// Parse and validate a JSON configuration; missing sections take defaults
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: TrackingConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.as_ref().to_string_lossy().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ranging.region_id.trim().is_empty() {
            return Err(invalid("ranging.region_id", "\"\"", "region id must not be empty"));
        }
        if self.ranging.layouts.is_empty() {
            return Err(invalid("ranging.layouts", "[]", "at least one beacon layout is required"));
        }
        for layout in &self.ranging.layouts {
            if layout.validate().is_err() {
                return Err(invalid("ranging.layouts", layout.descriptor(), "empty layout expression"));
            }
        }

        let gps = &self.gps;
        if gps.interval_ms == 0 {
            return Err(invalid("gps.interval_ms", gps.interval_ms, "must be positive"));
        }
        if gps.min_interval_ms == 0 || gps.min_interval_ms > gps.interval_ms {
            return Err(invalid(
                "gps.min_interval_ms",
                gps.min_interval_ms,
                "must be positive and not exceed gps.interval_ms",
            ));
        }
        if gps.max_delay_ms < gps.interval_ms {
            return Err(invalid("gps.max_delay_ms", gps.max_delay_ms, "must be at least gps.interval_ms"));
        }
        if !gps.min_distance_m.is_finite() || gps.min_distance_m < 0.0 {
            return Err(invalid("gps.min_distance_m", gps.min_distance_m, "must be a non-negative distance"));
        }

        if !self.map.center_scale.is_finite() || self.map.center_scale <= 0.0 {
            return Err(invalid("map.center_scale", self.map.center_scale, "must be positive"));
        }

        Ok(())
    }
}
