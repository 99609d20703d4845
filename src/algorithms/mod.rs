//! Core positioning algorithms

pub mod weighted_centroid;

pub use weighted_centroid::{estimate, estimate_observations, EstimateError, EstimateResult};
