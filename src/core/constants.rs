//! Fixed parameters shared across the positioning core

/// Lower bound applied to measured distances before inverting them (m)
pub const DISTANCE_EPSILON: f64 = 1e-6;

/// Identifier of the unconstrained ranging region
pub const ALL_BEACONS_REGION: &str = "all-beacons-region";

/// Camera scale used when recentering the map on a fresh marker
pub const DEFAULT_CENTER_SCALE: f64 = 1000.0;

/// Desired GPS update interval (ms)
pub const GPS_INTERVAL_MS: u64 = 500;
/// Fastest GPS update interval accepted (ms)
pub const GPS_MIN_INTERVAL_MS: u64 = 250;
/// Maximum batching delay for GPS updates (ms)
pub const GPS_MAX_DELAY_MS: u64 = 1000;

/// Reference files bundled with the application, in load order
pub const DEFAULT_REFERENCE_FILES: [&str; 7] = [
    "beacons_gg0.txt",
    "beacons_gg1.txt",
    "beacons_gg2b1.txt",
    "beacons_gg3b2.txt",
    "beacons_gg3b3.txt",
    "beacons_gg4.txt",
    "beacons_gg_out.txt",
];
