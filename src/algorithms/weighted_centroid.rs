//! Inverse-distance weighted centroid of known beacon positions
//!
//! Every resolved beacon contributes its surveyed coordinate with weight
//! `1 / max(distance, DISTANCE_EPSILON)`, so the closest beacons dominate
//! the estimate. Latitude and longitude are averaged independently.

use crate::core::{EstimatedPosition, ResolvedObservation, DISTANCE_EPSILON};
use nalgebra::Vector2;
use thiserror::Error;

/// Precondition violations for the estimator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
    /// No observations were supplied; there is no position to report
    #[error("cannot estimate a position from zero observations")]
    NoObservations,
    /// The parallel input sequences do not describe the same beacons
    #[error("input length mismatch: {latitudes} latitudes, {longitudes} longitudes, {distances} distances")]
    LengthMismatch {
        latitudes: usize,
        longitudes: usize,
        distances: usize,
    },
}

/// Result type for estimator calls
pub type EstimateResult<T> = Result<T, EstimateError>;

/// Weight given to an observation at `distance` meters.
pub fn inverse_distance_weight(distance: f64) -> f64 {
    1.0 / distance.max(DISTANCE_EPSILON)
}

/// Estimate a position from parallel sequences where index `i` in each
/// slice describes the same beacon observation.
pub fn estimate(
    latitudes: &[f64],
    longitudes: &[f64],
    distances: &[f64],
) -> EstimateResult<EstimatedPosition> {
    if latitudes.len() != longitudes.len() || latitudes.len() != distances.len() {
        return Err(EstimateError::LengthMismatch {
            latitudes: latitudes.len(),
            longitudes: longitudes.len(),
            distances: distances.len(),
        });
    }

    weighted_centroid(
        latitudes
            .iter()
            .zip(longitudes)
            .zip(distances)
            .map(|((&lat, &lon), &dist)| (Vector2::new(lat, lon), dist)),
    )
}

/// Estimate a position from already resolved observations.
pub fn estimate_observations(
    observations: &[ResolvedObservation],
) -> EstimateResult<EstimatedPosition> {
    weighted_centroid(
        observations
            .iter()
            .map(|obs| (Vector2::new(obs.latitude, obs.longitude), obs.distance)),
    )
}

fn weighted_centroid<I>(points: I) -> EstimateResult<EstimatedPosition>
where
    I: Iterator<Item = (Vector2<f64>, f64)> + Clone,
{
    if points.clone().next().is_none() {
        return Err(EstimateError::NoObservations);
    }

    let total_weight: f64 = points
        .clone()
        .map(|(_, dist)| inverse_distance_weight(dist))
        .sum();

    // Normalizing each weight first keeps a lone observation (w / w == 1)
    // and equal weights (w / 2w == 0.5) exact.
    let centroid = points.fold(Vector2::<f64>::zeros(), |acc, (coord, dist)| {
        acc + coord * (inverse_distance_weight(dist) / total_weight)
    });

    Ok(EstimatedPosition {
        latitude: centroid.x,
        longitude: centroid.y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {} within {}, got {}",
            expected,
            tolerance,
            actual
        );
    }

    #[test]
    fn test_single_sample_is_exact() {
        for &dist in &[0.3, 1.0, 7.25, 1234.5] {
            let pos = estimate(&[54.372158], &[18.612849], &[dist]).unwrap();
            assert_eq!(pos.latitude, 54.372158);
            assert_eq!(pos.longitude, 18.612849);
        }
    }

    #[test]
    fn test_equal_distances_give_midpoint() {
        let pos = estimate(&[10.0, 20.0], &[10.0, 20.0], &[5.0, 5.0]).unwrap();
        assert_eq!(pos, EstimatedPosition { latitude: 15.0, longitude: 15.0 });
    }

    #[test]
    fn test_zero_distance_is_clamped() {
        let pos = estimate(&[10.0, 20.0], &[30.0, 40.0], &[0.0, 10.0]).unwrap();
        assert!(pos.latitude.is_finite() && pos.longitude.is_finite());
        assert_close(pos.latitude, 10.0, 1e-5);
        assert_close(pos.longitude, 30.0, 1e-5);
        // the far beacon still pulls the estimate a little
        assert!(pos.latitude > 10.0);
    }

    #[test]
    fn test_closer_beacon_dominates() {
        let pos = estimate(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 3.0]).unwrap();
        // weights 1 and 1/3 -> 0.25 of the way towards the far beacon
        assert_close(pos.latitude, 0.25, 1e-12);
        assert_close(pos.longitude, 0.25, 1e-12);
    }

    #[test]
    fn test_result_is_convex_combination() {
        let cases: Vec<(Vec<f64>, Vec<f64>, Vec<f64>)> = vec![
            (vec![54.1, 54.3, 54.2], vec![18.5, 18.7, 18.9], vec![1.0, 2.0, 3.0]),
            (vec![-33.9, -33.8], vec![151.2, 151.3], vec![0.01, 250.0]),
            (vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 1.0, 0.0, 1.0], vec![4.0, 0.5, 9.0, 2.5]),
            (vec![89.9, -89.9, 12.0], vec![-179.9, 179.9, 0.0], vec![1e-3, 1e3, 17.0]),
        ];

        for (lats, lons, dists) in cases {
            let pos = estimate(&lats, &lons, &dists).unwrap();
            let (min_lat, max_lat) = bounds(&lats);
            let (min_lon, max_lon) = bounds(&lons);
            assert!(pos.latitude >= min_lat - 1e-9 && pos.latitude <= max_lat + 1e-9);
            assert!(pos.longitude >= min_lon - 1e-9 && pos.longitude <= max_lon + 1e-9);
        }
    }

    fn bounds(values: &[f64]) -> (f64, f64) {
        values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(estimate(&[], &[], &[]), Err(EstimateError::NoObservations));
        assert_eq!(estimate_observations(&[]), Err(EstimateError::NoObservations));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let result = estimate(&[1.0, 2.0], &[1.0], &[1.0, 1.0]);
        assert_eq!(
            result,
            Err(EstimateError::LengthMismatch { latitudes: 2, longitudes: 1, distances: 2 })
        );
    }

    #[test]
    fn test_observations_match_parallel_form() {
        let observations = [
            ResolvedObservation { latitude: 54.0, longitude: 18.0, distance: 2.0 },
            ResolvedObservation { latitude: 54.2, longitude: 18.4, distance: 6.0 },
        ];
        let a = estimate_observations(&observations).unwrap();
        let b = estimate(&[54.0, 54.2], &[18.0, 18.4], &[2.0, 6.0]).unwrap();
        assert_eq!(a, b);
    }

    fn observation() -> impl Strategy<Value = (f64, f64, f64)> {
        (-90.0f64..90.0, -180.0f64..180.0, 0.0f64..5000.0)
    }

    proptest! {
        /// The estimate never leaves the bounding box of its beacons
        #[test]
        fn prop_estimate_is_convex_combination(
            observations in prop::collection::vec(observation(), 1..32),
        ) {
            let lats: Vec<f64> = observations.iter().map(|o| o.0).collect();
            let lons: Vec<f64> = observations.iter().map(|o| o.1).collect();
            let dists: Vec<f64> = observations.iter().map(|o| o.2).collect();

            let pos = estimate(&lats, &lons, &dists).unwrap();
            let (min_lat, max_lat) = bounds(&lats);
            let (min_lon, max_lon) = bounds(&lons);
            prop_assert!(pos.latitude >= min_lat - 1e-9 && pos.latitude <= max_lat + 1e-9);
            prop_assert!(pos.longitude >= min_lon - 1e-9 && pos.longitude <= max_lon + 1e-9);
        }

        /// One beacon is reported exactly, whatever its distance
        #[test]
        fn prop_single_observation_is_exact((lat, lon, dist) in observation()) {
            let pos = estimate(&[lat], &[lon], &[dist]).unwrap();
            prop_assert_eq!(pos, EstimatedPosition { latitude: lat, longitude: lon });
        }

        /// Lists of different lengths are always rejected
        #[test]
        fn prop_length_mismatch_is_rejected(a in 0usize..8, b in 0usize..8) {
            prop_assume!(a != b);
            let result = estimate(&vec![0.0; a], &vec![0.0; b], &vec![1.0; a]);
            let is_mismatch = matches!(result, Err(EstimateError::LengthMismatch { .. }));
            prop_assert!(is_mismatch);
        }
    }
}
