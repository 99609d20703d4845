//! Reference data processing

pub mod reference_store;

pub use reference_store::{
    load_all, parse_document, BeaconResponse, DirectorySource, LoadReport, ReferenceBeaconIndex,
    ReferenceError, ReferenceFileSummary, ReferenceSource,
};
