//! Mock device subsystems for testing and development

use crate::core::{DetectedBeaconSample, GpsFix};
use crate::hardware::{
    BeaconLayout, BeaconRangingSubsystem, FixHandler, LocationError, LocationProvider,
    LocationRequest, LocationResult, MapDisplay, MarkerKey, Permission, PlatformStatus,
    RangeHandler, RangingError, RangingEvent, RangingResult, Region, SubscriptionId,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Calls received by [`MockRangingSubsystem`]
#[derive(Debug, Clone, PartialEq)]
pub enum RangingCall {
    ConfigureLayouts(Vec<BeaconLayout>),
    StartMonitoring(String),
    StartRanging(String),
    StopMonitoring(String),
    StopRanging(String),
    SetHandler,
    ClearHandler,
}

/// Mock ranging subsystem that records calls and lets tests push events
#[derive(Default)]
pub struct MockRangingSubsystem {
    calls: Mutex<Vec<RangingCall>>,
    handler: Mutex<Option<RangeHandler>>,
    /// Handler kept after `clear_range_handler`, to replay late deliveries
    last_handler: Mutex<Option<RangeHandler>>,
    fail_ranging: AtomicBool,
}

impl MockRangingSubsystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `start_ranging` fail until reset
    pub fn fail_ranging(&self, enable: bool) {
        self.fail_ranging.store(enable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RangingCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub fn has_handler(&self) -> bool {
        lock(&self.handler).is_some()
    }

    /// Handler currently installed, if any
    pub fn current_handler(&self) -> Option<RangeHandler> {
        lock(&self.handler).clone()
    }

    /// Deliver an event to the installed handler; returns false if none
    pub fn deliver(&self, event: RangingEvent) -> bool {
        let handler = lock(&self.handler).clone();
        match handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    /// Deliver one ranging cycle
    pub fn deliver_batch(&self, samples: Vec<DetectedBeaconSample>) -> bool {
        self.deliver(RangingEvent::BeaconsDetected(samples))
    }

    /// Deliver to the most recent handler even if it was already cleared,
    /// as a real scanner may do while unsubscription is in flight
    pub fn deliver_late(&self, event: RangingEvent) -> bool {
        let handler = lock(&self.last_handler).clone();
        match handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    fn record(&self, call: RangingCall) {
        lock(&self.calls).push(call);
    }
}

impl BeaconRangingSubsystem for MockRangingSubsystem {
    fn configure_layouts(&self, layouts: &[BeaconLayout]) -> RangingResult<()> {
        for layout in layouts {
            layout.validate()?;
        }
        self.record(RangingCall::ConfigureLayouts(layouts.to_vec()));
        Ok(())
    }

    fn start_monitoring(&self, region: &Region) -> RangingResult<()> {
        self.record(RangingCall::StartMonitoring(region.unique_id.clone()));
        Ok(())
    }

    fn start_ranging(&self, region: &Region) -> RangingResult<()> {
        if self.fail_ranging.load(Ordering::SeqCst) {
            return Err(RangingError::start_failed(
                "ranging",
                &region.unique_id,
                "simulated scanner failure",
            ));
        }
        self.record(RangingCall::StartRanging(region.unique_id.clone()));
        Ok(())
    }

    fn stop_monitoring(&self, region: &Region) -> RangingResult<()> {
        self.record(RangingCall::StopMonitoring(region.unique_id.clone()));
        Ok(())
    }

    fn stop_ranging(&self, region: &Region) -> RangingResult<()> {
        self.record(RangingCall::StopRanging(region.unique_id.clone()));
        Ok(())
    }

    fn set_range_handler(&self, handler: RangeHandler) {
        *lock(&self.last_handler) = Some(handler.clone());
        *lock(&self.handler) = Some(handler);
        self.record(RangingCall::SetHandler);
    }

    fn clear_range_handler(&self) {
        *lock(&self.handler) = None;
        self.record(RangingCall::ClearHandler);
    }
}

/// Mock location provider holding subscriptions in memory
#[derive(Default)]
pub struct MockLocationProvider {
    subscriptions: Mutex<HashMap<SubscriptionId, FixHandler>>,
    requests: Mutex<Vec<LocationRequest>>,
    removed: Mutex<Vec<FixHandler>>,
    next_id: AtomicU64,
    disabled: AtomicBool,
}

impl MockLocationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate location services being switched off
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<LocationRequest> {
        lock(&self.requests).clone()
    }

    pub fn active_subscriptions(&self) -> usize {
        lock(&self.subscriptions).len()
    }

    /// Push a fix to every active subscription; returns how many received it
    pub fn push_fix(&self, fix: GpsFix) -> usize {
        let handlers: Vec<FixHandler> = lock(&self.subscriptions).values().cloned().collect();
        for handler in &handlers {
            handler(fix);
        }
        handlers.len()
    }

    /// Push a fix to subscriptions that were already removed
    pub fn push_late_fix(&self, fix: GpsFix) -> usize {
        let handlers: Vec<FixHandler> = lock(&self.removed).clone();
        for handler in &handlers {
            handler(fix);
        }
        handlers.len()
    }
}

impl LocationProvider for MockLocationProvider {
    fn request_updates(
        &self,
        request: &LocationRequest,
        handler: FixHandler,
    ) -> LocationResult<SubscriptionId> {
        if self.disabled.load(Ordering::SeqCst) {
            return Err(LocationError::ProviderDisabled);
        }
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        lock(&self.requests).push(request.clone());
        lock(&self.subscriptions).insert(id, handler);
        Ok(id)
    }

    fn remove_updates(&self, subscription: SubscriptionId) -> LocationResult<()> {
        match lock(&self.subscriptions).remove(&subscription) {
            Some(handler) => {
                lock(&self.removed).push(handler);
                Ok(())
            }
            None => Err(LocationError::UnknownSubscription(subscription.0)),
        }
    }
}

/// Command received by [`RecordingMap`]
#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    SetMarker { key: MarkerKey, latitude: f64, longitude: f64 },
    RemoveMarker(MarkerKey),
    CenterOn { latitude: f64, longitude: f64, scale: f64 },
}

/// Map adapter that records every command it receives
#[derive(Default)]
pub struct RecordingMap {
    commands: Mutex<Vec<MapCommand>>,
    markers: Mutex<HashMap<MarkerKey, (f64, f64)>>,
}

impl RecordingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<MapCommand> {
        lock(&self.commands).clone()
    }

    /// Current position of a marker, if drawn
    pub fn marker(&self, key: MarkerKey) -> Option<(f64, f64)> {
        lock(&self.markers).get(&key).copied()
    }

    pub fn marker_updates(&self, key: MarkerKey) -> usize {
        lock(&self.commands)
            .iter()
            .filter(|c| matches!(c, MapCommand::SetMarker { key: k, .. } if *k == key))
            .count()
    }
}

impl MapDisplay for RecordingMap {
    fn set_marker(&self, key: MarkerKey, latitude: f64, longitude: f64) {
        lock(&self.markers).insert(key, (latitude, longitude));
        lock(&self.commands).push(MapCommand::SetMarker { key, latitude, longitude });
    }

    fn remove_marker(&self, key: MarkerKey) {
        lock(&self.markers).remove(&key);
        lock(&self.commands).push(MapCommand::RemoveMarker(key));
    }

    fn center_on(&self, latitude: f64, longitude: f64, scale: f64) {
        lock(&self.commands).push(MapCommand::CenterOn { latitude, longitude, scale });
    }
}

/// Map that parks the first `set_marker` call until the test opens the gate
pub struct GatedMap {
    inner: RecordingMap,
    entered: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl GatedMap {
    /// Returns the map, a receiver signalled once a caller is parked at the
    /// gate, and the sender that lets it through
    pub fn new() -> (Self, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let map = Self {
            inner: RecordingMap::new(),
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(release_rx),
        };
        (map, entered_rx, release_tx)
    }

    pub fn recorded(&self) -> &RecordingMap {
        &self.inner
    }
}

impl MapDisplay for GatedMap {
    fn set_marker(&self, key: MarkerKey, latitude: f64, longitude: f64) {
        if let Some(entered) = lock(&self.entered).take() {
            let _ = entered.send(());
            let _ = lock(&self.release).recv();
        }
        self.inner.set_marker(key, latitude, longitude);
    }

    fn remove_marker(&self, key: MarkerKey) {
        self.inner.remove_marker(key);
    }

    fn center_on(&self, latitude: f64, longitude: f64, scale: f64) {
        self.inner.center_on(latitude, longitude, scale);
    }
}

/// Platform state with switchable permissions and Bluetooth adapter
pub struct MockPlatform {
    granted: Mutex<HashSet<Permission>>,
    bluetooth_enabled: AtomicBool,
}

impl MockPlatform {
    /// All permissions granted, Bluetooth on
    pub fn ready() -> Self {
        Self {
            granted: Mutex::new(Permission::REQUIRED.iter().copied().collect()),
            bluetooth_enabled: AtomicBool::new(true),
        }
    }

    /// Nothing granted, Bluetooth off
    pub fn locked_down() -> Self {
        Self {
            granted: Mutex::new(HashSet::new()),
            bluetooth_enabled: AtomicBool::new(false),
        }
    }

    pub fn grant(&self, permission: Permission) {
        lock(&self.granted).insert(permission);
    }

    pub fn revoke(&self, permission: Permission) {
        lock(&self.granted).remove(&permission);
    }

    pub fn set_bluetooth_enabled(&self, enabled: bool) {
        self.bluetooth_enabled.store(enabled, Ordering::SeqCst);
    }
}

impl PlatformStatus for MockPlatform {
    fn is_permission_granted(&self, permission: Permission) -> bool {
        lock(&self.granted).contains(&permission)
    }

    fn is_bluetooth_enabled(&self) -> bool {
        self.bluetooth_enabled.load(Ordering::SeqCst)
    }
}
