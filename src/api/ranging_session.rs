//! Beacon ranging session controller
//!
//! While active, every detection batch pushed by the ranging subsystem is
//! resolved against the reference index and turned into one position
//! estimate for the map. Unknown beacons are dropped silently and a batch
//! without any known beacon publishes nothing.

use crate::algorithms::estimate_observations;
use crate::api::types::{ApiResult, SessionGuard, SessionState};
use crate::core::{DetectedBeaconSample, EstimatedPosition, ResolvedObservation};
use crate::hardware::{
    BeaconRangingSubsystem, MapDisplay, MarkerKey, RangeHandler, RangingEvent, Region,
};
use crate::processing::ReferenceBeaconIndex;
use crate::utils::{MapConfig, RangingConfig};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters describing what a controller has done so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangingStats {
    /// Detection batches handled while active
    pub batches_processed: u64,
    /// Samples matched against the reference index
    pub samples_resolved: u64,
    /// Samples from beacons without a reference record
    pub samples_unresolved: u64,
    /// Estimates handed to the map
    pub positions_published: u64,
    /// Events delivered after the session was stopped
    pub events_ignored: u64,
    /// Error events reported by the subsystem
    pub errors_reported: u64,
}

#[derive(Default)]
struct StatCounters {
    batches_processed: AtomicU64,
    samples_resolved: AtomicU64,
    samples_unresolved: AtomicU64,
    positions_published: AtomicU64,
    events_ignored: AtomicU64,
    errors_reported: AtomicU64,
}

impl StatCounters {
    fn snapshot(&self) -> RangingStats {
        RangingStats {
            batches_processed: self.batches_processed.load(Ordering::Relaxed),
            samples_resolved: self.samples_resolved.load(Ordering::Relaxed),
            samples_unresolved: self.samples_unresolved.load(Ordering::Relaxed),
            positions_published: self.positions_published.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            errors_reported: self.errors_reported.load(Ordering::Relaxed),
        }
    }
}

/// Match detected beacons against the index.
///
/// Returns the resolved observations in detection order and the number of
/// samples that had no reference record.
pub fn resolve_samples(
    index: &ReferenceBeaconIndex,
    samples: &[DetectedBeaconSample],
) -> (Vec<ResolvedObservation>, usize) {
    let mut resolved = Vec::with_capacity(samples.len());
    let mut unresolved = 0;

    for sample in samples {
        match index.get(&sample.identifier) {
            Some(record) => resolved.push(ResolvedObservation {
                latitude: record.latitude,
                longitude: record.longitude,
                distance: sample.measured_distance,
            }),
            None => unresolved += 1,
        }
    }

    (resolved, unresolved)
}

/// State shared between the controller and the handler it installs
struct BatchPipeline {
    index: Arc<ReferenceBeaconIndex>,
    map: Arc<dyn MapDisplay>,
    map_config: MapConfig,
    stats: StatCounters,
}

impl BatchPipeline {
    fn handle_event(&self, live: &SessionGuard, event: RangingEvent) {
        // unsubscription is not instantaneous; anything after stop() is dropped
        let handled = live.run_if_open(|| match event {
            RangingEvent::BeaconsDetected(samples) => {
                self.process_batch(&samples);
            }
            RangingEvent::RegionStateChanged { region, state } => {
                info!("Beacon region {} state: {:?}", region, state);
            }
            RangingEvent::Error(e) => {
                self.stats.errors_reported.fetch_add(1, Ordering::Relaxed);
                error!("Ranging subsystem reported an error: {}", e);
            }
        });

        if handled.is_none() {
            self.stats.events_ignored.fetch_add(1, Ordering::Relaxed);
            debug!("Ignoring ranging event delivered after stop");
        }
    }

    fn process_batch(&self, samples: &[DetectedBeaconSample]) -> Option<EstimatedPosition> {
        self.stats.batches_processed.fetch_add(1, Ordering::Relaxed);

        let (resolved, unresolved) = resolve_samples(&self.index, samples);
        self.stats
            .samples_resolved
            .fetch_add(resolved.len() as u64, Ordering::Relaxed);
        self.stats
            .samples_unresolved
            .fetch_add(unresolved as u64, Ordering::Relaxed);

        debug!(
            "Ranging batch: {} detected, {} resolved",
            samples.len(),
            resolved.len()
        );

        if resolved.is_empty() {
            return None;
        }

        match estimate_observations(&resolved) {
            Ok(position) if !(position.latitude.is_finite() && position.longitude.is_finite()) => {
                warn!("Discarding non-finite position estimate from {} beacons", resolved.len());
                None
            }
            Ok(position) => {
                self.publish(position);
                Some(position)
            }
            Err(e) => {
                error!("Position estimate failed: {}", e);
                None
            }
        }
    }

    fn publish(&self, position: EstimatedPosition) {
        self.map
            .set_marker(MarkerKey::BeaconEstimate, position.latitude, position.longitude);
        if self.map_config.center_on_update {
            self.map
                .center_on(position.latitude, position.longitude, self.map_config.center_scale);
        }
        self.stats.positions_published.fetch_add(1, Ordering::Relaxed);
    }
}

/// Start/stop state machine around the beacon ranging subsystem
pub struct RangingSessionController {
    subsystem: Arc<dyn BeaconRangingSubsystem>,
    pipeline: Arc<BatchPipeline>,
    config: RangingConfig,
    region: Region,
    state: SessionState,
    /// Liveness guard of the running session, shared with its handler
    live: Option<SessionGuard>,
}

impl RangingSessionController {
    pub fn new(
        subsystem: Arc<dyn BeaconRangingSubsystem>,
        map: Arc<dyn MapDisplay>,
        index: Arc<ReferenceBeaconIndex>,
        config: RangingConfig,
        map_config: MapConfig,
    ) -> Self {
        let region = config.region();
        Self {
            subsystem,
            pipeline: Arc::new(BatchPipeline {
                index,
                map,
                map_config,
                stats: StatCounters::default(),
            }),
            config,
            region,
            state: SessionState::Idle,
            live: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn index(&self) -> &ReferenceBeaconIndex {
        &self.pipeline.index
    }

    pub fn stats(&self) -> RangingStats {
        self.pipeline.stats.snapshot()
    }

    /// Begin monitoring and ranging every beacon in range. No-op if active.
    ///
    /// On failure the partially started session is torn down, the
    /// controller stays idle and the error is returned.
    pub fn start(&mut self) -> ApiResult<()> {
        if self.state.is_active() {
            debug!("Ranging session already active");
            return Ok(());
        }

        self.subsystem.configure_layouts(&self.config.layouts)?;

        let live = SessionGuard::open();
        self.subsystem.set_range_handler(self.make_handler(live.clone()));

        if let Err(e) = self.subsystem.start_monitoring(&self.region) {
            self.abort_start(&live, false);
            warn!("Failed to start beacon monitoring: {}", e);
            return Err(e.into());
        }
        if let Err(e) = self.subsystem.start_ranging(&self.region) {
            self.abort_start(&live, true);
            warn!("Failed to start beacon ranging: {}", e);
            return Err(e.into());
        }

        self.live = Some(live);
        self.state = SessionState::Active;
        info!(
            "Beacon ranging started for region {} ({} reference beacons)",
            self.region.unique_id,
            self.pipeline.index.len()
        );
        Ok(())
    }

    /// Stop ranging and monitoring. No-op if idle.
    ///
    /// The controller is idle afterwards even if the subsystem reports a
    /// failure while tearing down; the first such failure is returned.
    pub fn stop(&mut self) -> ApiResult<()> {
        if !self.state.is_active() {
            debug!("Ranging session already idle");
            return Ok(());
        }

        if let Some(live) = self.live.take() {
            live.close();
        }
        self.subsystem.clear_range_handler();

        let ranging = self.subsystem.stop_ranging(&self.region);
        let monitoring = self.subsystem.stop_monitoring(&self.region);
        self.state = SessionState::Idle;

        if self.pipeline.map_config.clear_markers_on_stop {
            self.pipeline.map.remove_marker(MarkerKey::BeaconEstimate);
        }

        info!("Beacon ranging stopped for region {}", self.region.unique_id);

        if let Err(ref e) = ranging {
            error!("Failed to stop beacon ranging: {}", e);
        }
        if let Err(ref e) = monitoring {
            error!("Failed to stop beacon monitoring: {}", e);
        }
        ranging.and(monitoring).map_err(Into::into)
    }

    fn make_handler(&self, live: SessionGuard) -> RangeHandler {
        let pipeline = Arc::clone(&self.pipeline);
        Arc::new(move |event: RangingEvent| pipeline.handle_event(&live, event))
    }

    fn abort_start(&self, live: &SessionGuard, monitoring_started: bool) {
        live.close();
        self.subsystem.clear_range_handler();
        if monitoring_started {
            if let Err(e) = self.subsystem.stop_monitoring(&self.region) {
                error!("Failed to roll back beacon monitoring: {}", e);
            }
        }
    }
}

impl Drop for RangingSessionController {
    fn drop(&mut self) {
        if self.state.is_active() {
            let _ = self.stop();
        }
    }
}
