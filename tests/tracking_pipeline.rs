use std::fs;
use std::sync::Arc;
use std::thread;

use beacon_positioning::hardware::{
    MockLocationProvider, MockPlatform, MockRangingSubsystem, RecordingMap,
};
use beacon_positioning::{
    init_logging, DetectedBeaconSample, GpsFix, MarkerKey, RangingEvent, TrackingConfig,
    TrackingCoordinator,
};

const FLOOR_0: &str = r#"{
    "items": [
        {"beaconUid": "D1:00:00:00:00:01", "id": 101, "latitude": 54.371000, "longitude": 18.612000, "name": "Lobby"},
        {"beaconUid": "D1:00:00:00:00:02", "id": 102, "latitude": 54.371200, "longitude": 18.612200, "name": "Stairs"}
    ],
    "totalPages": 1,
    "itemsFrom": 1,
    "itemsTo": 2,
    "totalItemsCount": 2
}"#;

const FLOOR_1: &str = r#"{
    "items": [
        {"beaconUid": "D1:00:00:00:00:02", "id": 202, "latitude": 54.371400, "longitude": 18.612400, "name": "Stairs (moved)"},
        {"beaconUid": "D1:00:00:00:00:03", "id": 203, "latitude": 54.371600, "longitude": 18.612600}
    ],
    "totalPages": 1,
    "itemsFrom": 1,
    "itemsTo": 2,
    "totalItemsCount": 2
}"#;

fn write_reference_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("beacons_gg0.txt"), FLOOR_0).unwrap();
    fs::write(dir.join("beacons_gg1.txt"), FLOOR_1).unwrap();
    fs::write(dir.join("beacons_gg2b1.txt"), "<html>not json</html>").unwrap();
    dir
}

#[test]
fn test_tracking_pipeline() {
    init_logging();

    let dir = write_reference_dir("tracking-pipeline");
    let mut config = TrackingConfig::default();
    config.reference.directory = dir.clone();

    let ranging = Arc::new(MockRangingSubsystem::new());
    let location = Arc::new(MockLocationProvider::new());
    let map = Arc::new(RecordingMap::new());

    let (mut coordinator, report) = TrackingCoordinator::load(
        &config,
        ranging.clone(),
        location.clone(),
        map.clone(),
        Arc::new(MockPlatform::ready()),
    );

    // two good documents; one corrupt and four absent
    assert_eq!(report.summaries.len(), 2);
    assert_eq!(report.failures.len(), 5);
    assert_eq!(report.index.len(), 3);
    assert_eq!(report.duplicates_replaced, 1);
    let stairs = report.index.get("D1:00:00:00:00:02").unwrap();
    assert_eq!(stairs.latitude, 54.3714);
    assert_eq!(stairs.name(), Some("Stairs (moved)"));

    coordinator.begin_tracking().unwrap();
    assert!(coordinator.is_tracking());

    // both subsystems deliver from their own threads
    thread::scope(|scope| {
        let ranging = &ranging;
        let location = &location;
        scope.spawn(move || {
            for _ in 0..5 {
                ranging.deliver_batch(vec![
                    DetectedBeaconSample::new("D1:00:00:00:00:01", 1.0),
                    DetectedBeaconSample::new("D1:00:00:00:00:03", 1.0),
                    DetectedBeaconSample::new("EE:EE:EE:EE:EE:EE", 0.2),
                ]);
            }
        });
        scope.spawn(move || {
            for i in 0..5 {
                location.push_fix(GpsFix::new(54.35 + i as f64 * 0.001, 18.64));
            }
        });
    });

    let (lat, lon) = map.marker(MarkerKey::BeaconEstimate).unwrap();
    assert!((lat - 54.3713).abs() < 1e-9);
    assert!((lon - 18.6123).abs() < 1e-9);
    assert_eq!(map.marker_updates(MarkerKey::BeaconEstimate), 5);
    assert_eq!(map.marker_updates(MarkerKey::Gps), 5);
    let (gps_lat, gps_lon) = map.marker(MarkerKey::Gps).unwrap();
    assert!((gps_lat - 54.354).abs() < 1e-9);
    assert_eq!(gps_lon, 18.64);

    let stats = coordinator.ranging_stats();
    assert_eq!(stats.batches_processed, 5);
    assert_eq!(stats.samples_resolved, 10);
    assert_eq!(stats.samples_unresolved, 5);

    coordinator.end_tracking().unwrap();
    assert!(!coordinator.is_tracking());

    // nothing reaches the map once tracking has ended
    ranging.deliver_late(RangingEvent::BeaconsDetected(vec![
        DetectedBeaconSample::new("D1:00:00:00:00:01", 0.1),
    ]));
    location.push_late_fix(GpsFix::new(0.0, 0.0));
    assert_eq!(map.marker_updates(MarkerKey::BeaconEstimate), 5);
    assert_eq!(map.marker_updates(MarkerKey::Gps), 5);

    let _ = fs::remove_dir_all(dir);
}
