//! Map display adapter interface

use std::fmt;

/// Logical markers drawn by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKey {
    /// Position estimated from beacon ranging
    BeaconEstimate,
    /// Raw device GPS fix
    Gps,
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKey::BeaconEstimate => write!(f, "beacon-estimate"),
            MarkerKey::Gps => write!(f, "gps"),
        }
    }
}

/// Map surface receiving marker and camera commands.
///
/// Calls arrive from the ranging and location dispatch threads;
/// implementations marshal them to their UI thread themselves.
pub trait MapDisplay: Send + Sync {
    /// Add the marker or move it if already present
    fn set_marker(&self, key: MarkerKey, latitude: f64, longitude: f64);

    fn remove_marker(&self, key: MarkerKey);

    fn center_on(&self, latitude: f64, longitude: f64, scale: f64);
}
