//! Core types and constants for the beacon positioning core

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
