//! GPS fix relay
//!
//! Forwards every fix from the device location provider to the map,
//! unfiltered and unsmoothed.

use crate::api::types::{ApiResult, SessionGuard, SessionState, TrackingError};
use crate::core::GpsFix;
use crate::hardware::{
    FixHandler, LocationProvider, LocationRequest, MapDisplay, MarkerKey, Permission,
    PlatformStatus, SubscriptionId,
};
use crate::utils::MapConfig;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Start/stop state machine around the device location provider
pub struct LocationUpdateRelay {
    provider: Arc<dyn LocationProvider>,
    platform: Arc<dyn PlatformStatus>,
    map: Arc<dyn MapDisplay>,
    request: LocationRequest,
    map_config: MapConfig,
    state: SessionState,
    subscription: Option<SubscriptionId>,
    live: Option<SessionGuard>,
    fixes_forwarded: Arc<AtomicU64>,
}

impl LocationUpdateRelay {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        platform: Arc<dyn PlatformStatus>,
        map: Arc<dyn MapDisplay>,
        request: LocationRequest,
        map_config: MapConfig,
    ) -> Self {
        Self {
            provider,
            platform,
            map,
            request,
            map_config,
            state: SessionState::Idle,
            subscription: None,
            live: None,
            fixes_forwarded: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Number of fixes handed to the map so far
    pub fn fixes_forwarded(&self) -> u64 {
        self.fixes_forwarded.load(Ordering::Relaxed)
    }

    /// Subscribe to periodic fixes. No-op if active.
    ///
    /// Fails with [`TrackingError::PermissionDenied`] without touching the
    /// provider when fine location access has not been granted.
    pub fn start(&mut self) -> ApiResult<()> {
        if self.state.is_active() {
            debug!("Location updates already active");
            return Ok(());
        }

        if !self.platform.is_permission_granted(Permission::FineLocation) {
            warn!("No permission for GPS location updates");
            return Err(TrackingError::PermissionDenied(vec![Permission::FineLocation]));
        }

        let live = SessionGuard::open();
        let subscription = self
            .provider
            .request_updates(&self.request, self.make_handler(live.clone()))
            .map_err(|e| {
                live.close();
                warn!("Location update request failed: {}", e);
                TrackingError::from(e)
            })?;

        self.subscription = Some(subscription);
        self.live = Some(live);
        self.state = SessionState::Active;
        info!(
            "Location updates started (interval {} ms, fastest {} ms)",
            self.request.interval_ms, self.request.min_interval_ms
        );
        Ok(())
    }

    /// Unsubscribe from fixes. No-op if idle.
    pub fn stop(&mut self) -> ApiResult<()> {
        if !self.state.is_active() {
            debug!("Location updates already idle");
            return Ok(());
        }

        if let Some(live) = self.live.take() {
            live.close();
        }
        let result = match self.subscription.take() {
            Some(subscription) => self.provider.remove_updates(subscription),
            None => Ok(()),
        };
        self.state = SessionState::Idle;

        if self.map_config.clear_markers_on_stop {
            self.map.remove_marker(MarkerKey::Gps);
        }

        info!("Location updates stopped");
        result.map_err(|e| {
            error!("Failed to remove location updates: {}", e);
            e.into()
        })
    }

    fn make_handler(&self, live: SessionGuard) -> FixHandler {
        let map = Arc::clone(&self.map);
        let map_config = self.map_config.clone();
        let forwarded = Arc::clone(&self.fixes_forwarded);
        Arc::new(move |fix: GpsFix| {
            let relayed = live.run_if_open(|| {
                map.set_marker(MarkerKey::Gps, fix.latitude, fix.longitude);
                if map_config.center_on_update {
                    map.center_on(fix.latitude, fix.longitude, map_config.center_scale);
                }
                forwarded.fetch_add(1, Ordering::Relaxed);
            });
            if relayed.is_none() {
                debug!("Ignoring location fix delivered after stop");
            }
        })
    }
}

impl Drop for LocationUpdateRelay {
    fn drop(&mut self) {
        if self.state.is_active() {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::MapCommand;
    use crate::hardware::{
        GatedMap, LocationError, MockLocationProvider, MockPlatform, RecordingMap,
    };
    use std::thread;

    fn setup(
        platform: MockPlatform,
        map_config: MapConfig,
    ) -> (LocationUpdateRelay, Arc<MockLocationProvider>, Arc<RecordingMap>) {
        let provider = Arc::new(MockLocationProvider::new());
        let map = Arc::new(RecordingMap::new());
        let relay = LocationUpdateRelay::new(
            provider.clone(),
            Arc::new(platform),
            map.clone(),
            LocationRequest::default(),
            map_config,
        );
        (relay, provider, map)
    }

    #[test]
    fn test_fix_forwarded_unmodified() {
        let (mut relay, provider, map) = setup(MockPlatform::ready(), MapConfig::default());
        relay.start().unwrap();

        provider.push_fix(GpsFix::new(54.352025, 18.646638));
        assert_eq!(map.marker(MarkerKey::Gps), Some((54.352025, 18.646638)));
        assert_eq!(
            map.commands(),
            vec![
                MapCommand::SetMarker { key: MarkerKey::Gps, latitude: 54.352025, longitude: 18.646638 },
                MapCommand::CenterOn { latitude: 54.352025, longitude: 18.646638, scale: 1000.0 },
            ]
        );
        assert_eq!(relay.fixes_forwarded(), 1);
    }

    #[test]
    fn test_request_uses_configured_intervals() {
        let (mut relay, provider, _map) = setup(MockPlatform::ready(), MapConfig::default());
        relay.start().unwrap();
        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].interval_ms, 500);
        assert_eq!(requests[0].min_interval_ms, 250);
        assert_eq!(requests[0].max_delay_ms, 1000);
    }

    #[test]
    fn test_missing_permission_does_not_subscribe() {
        let platform = MockPlatform::ready();
        platform.revoke(Permission::FineLocation);
        let (mut relay, provider, _map) = setup(platform, MapConfig::default());

        assert_eq!(
            relay.start(),
            Err(TrackingError::PermissionDenied(vec![Permission::FineLocation]))
        );
        assert!(provider.requests().is_empty());
        assert_eq!(relay.state(), SessionState::Idle);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let (mut relay, provider, _map) = setup(MockPlatform::ready(), MapConfig::default());
        relay.stop().unwrap();

        relay.start().unwrap();
        relay.start().unwrap();
        assert_eq!(provider.requests().len(), 1);
        assert_eq!(provider.active_subscriptions(), 1);

        relay.stop().unwrap();
        relay.stop().unwrap();
        assert_eq!(provider.active_subscriptions(), 0);
        assert!(!relay.is_active());
    }

    #[test]
    fn test_late_fix_after_stop_is_ignored() {
        let map_config = MapConfig { clear_markers_on_stop: true, ..MapConfig::default() };
        let (mut relay, provider, map) = setup(MockPlatform::ready(), map_config);
        relay.start().unwrap();
        provider.push_fix(GpsFix::new(1.0, 2.0));
        relay.stop().unwrap();
        assert_eq!(map.marker(MarkerKey::Gps), None);

        assert_eq!(provider.push_late_fix(GpsFix::new(3.0, 4.0)), 1);
        assert_eq!(map.marker(MarkerKey::Gps), None);
        assert_eq!(relay.fixes_forwarded(), 1);
    }

    #[test]
    fn test_stop_waits_for_in_flight_fix() {
        let (gated, entered, release) = GatedMap::new();
        let map = Arc::new(gated);
        let provider = Arc::new(MockLocationProvider::new());
        let map_config = MapConfig { clear_markers_on_stop: true, ..MapConfig::default() };
        let mut relay = LocationUpdateRelay::new(
            provider.clone(),
            Arc::new(MockPlatform::ready()),
            map.clone(),
            LocationRequest::default(),
            map_config,
        );
        relay.start().unwrap();

        thread::scope(|scope| {
            scope.spawn(|| provider.push_fix(GpsFix::new(1.0, 2.0)));
            entered.recv().unwrap();
            let stopper = scope.spawn(|| relay.stop());
            release.send(()).unwrap();
            stopper.join().unwrap().unwrap();
        });

        assert!(!relay.is_active());
        assert_eq!(map.recorded().marker(MarkerKey::Gps), None);
        assert_eq!(
            map.recorded().commands().last(),
            Some(&MapCommand::RemoveMarker(MarkerKey::Gps))
        );
        assert_eq!(relay.fixes_forwarded(), 1);
    }

    #[test]
    fn test_provider_failure_is_reported() {
        let (mut relay, provider, _map) = setup(MockPlatform::ready(), MapConfig::default());
        provider.set_disabled(true);
        assert_eq!(
            relay.start(),
            Err(TrackingError::Location(LocationError::ProviderDisabled))
        );
        assert!(!relay.is_active());

        provider.set_disabled(false);
        relay.start().unwrap();
        assert!(relay.is_active());
    }
}
