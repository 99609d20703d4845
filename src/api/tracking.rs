//! Tracking commands
//!
//! `begin_tracking` and `end_tracking` drive the ranging controller and
//! the GPS relay together, after confirming the platform preconditions.

use crate::api::location_relay::LocationUpdateRelay;
use crate::api::ranging_session::{RangingSessionController, RangingStats};
use crate::api::types::{ApiResult, TrackingError};
use crate::hardware::{BeaconRangingSubsystem, LocationProvider, MapDisplay, PlatformStatus};
use crate::processing::{load_all, DirectorySource, LoadReport, ReferenceBeaconIndex};
use crate::utils::TrackingConfig;
use log::{info, warn};
use std::sync::Arc;

/// Owns both session controllers and the platform status they depend on
pub struct TrackingCoordinator {
    ranging: RangingSessionController,
    relay: LocationUpdateRelay,
    platform: Arc<dyn PlatformStatus>,
}

impl TrackingCoordinator {
    /// Wire the controllers around an already loaded reference index
    pub fn new(
        config: &TrackingConfig,
        index: Arc<ReferenceBeaconIndex>,
        ranging: Arc<dyn BeaconRangingSubsystem>,
        location: Arc<dyn LocationProvider>,
        map: Arc<dyn MapDisplay>,
        platform: Arc<dyn PlatformStatus>,
    ) -> Self {
        Self {
            ranging: RangingSessionController::new(
                ranging,
                Arc::clone(&map),
                index,
                config.ranging.clone(),
                config.map.clone(),
            ),
            relay: LocationUpdateRelay::new(
                location,
                Arc::clone(&platform),
                map,
                config.gps.clone(),
                config.map.clone(),
            ),
            platform,
        }
    }

    /// Load the configured reference documents from disk, then wire the
    /// controllers. Unreadable documents are skipped and listed in the
    /// returned report.
    pub fn load(
        config: &TrackingConfig,
        ranging: Arc<dyn BeaconRangingSubsystem>,
        location: Arc<dyn LocationProvider>,
        map: Arc<dyn MapDisplay>,
        platform: Arc<dyn PlatformStatus>,
    ) -> (Self, LoadReport) {
        let source = DirectorySource::new(&config.reference.directory);
        let report = load_all(&source, &config.reference.files);
        let index = Arc::clone(&report.index);
        let coordinator = Self::new(config, index, ranging, location, map, platform);
        (coordinator, report)
    }

    /// Confirm permissions and Bluetooth, then start ranging and GPS relay.
    ///
    /// Nothing is started when a precondition fails. If the relay fails to
    /// start after ranging came up, ranging is left running and the relay
    /// error is returned; calling again retries only what is idle.
    pub fn begin_tracking(&mut self) -> ApiResult<()> {
        self.check_preconditions()?;
        self.ranging.start()?;
        self.relay.start()?;
        info!("Tracking started");
        Ok(())
    }

    /// Stop both controllers. Safe to call when nothing is running.
    pub fn end_tracking(&mut self) -> ApiResult<()> {
        let ranging = self.ranging.stop();
        let relay = self.relay.stop();
        info!("Tracking stopped");
        ranging.and(relay)
    }

    /// React to the Bluetooth adapter being switched on or off.
    ///
    /// Turning it on with the permissions in place starts a fresh ranging
    /// session; turning it off leaves the controllers alone.
    pub fn on_bluetooth_state_changed(&mut self, enabled: bool) -> ApiResult<()> {
        if !enabled {
            info!("Bluetooth disabled");
            return Ok(());
        }
        let missing = self.platform.missing_permissions();
        if !missing.is_empty() {
            warn!("Bluetooth enabled but permissions are missing");
            return Err(TrackingError::PermissionDenied(missing));
        }
        info!("Bluetooth enabled, starting beacon scanning");
        self.ranging.start()
    }

    fn check_preconditions(&self) -> ApiResult<()> {
        let missing_permissions = self.platform.missing_permissions();
        let bluetooth_enabled = self.platform.is_bluetooth_enabled();

        match (missing_permissions.is_empty(), bluetooth_enabled) {
            (true, true) => Ok(()),
            (true, false) => {
                warn!("Cannot start tracking: Bluetooth is disabled");
                Err(TrackingError::BluetoothDisabled)
            }
            (false, true) => {
                warn!("Cannot start tracking: missing permissions");
                Err(TrackingError::PermissionDenied(missing_permissions))
            }
            (false, false) => {
                warn!("Cannot start tracking: missing permissions and Bluetooth is disabled");
                Err(TrackingError::PreconditionsNotMet {
                    missing_permissions,
                    bluetooth_enabled,
                })
            }
        }
    }

    pub fn ranging(&self) -> &RangingSessionController {
        &self.ranging
    }

    pub fn relay(&self) -> &LocationUpdateRelay {
        &self.relay
    }

    pub fn ranging_stats(&self) -> RangingStats {
        self.ranging.stats()
    }

    /// True when both controllers are running
    pub fn is_tracking(&self) -> bool {
        self.ranging.is_active() && self.relay.is_active()
    }
}
