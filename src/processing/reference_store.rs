//! Reference beacon store
//!
//! Loads the bundled beacon reference documents and merges them into a
//! single read-only index keyed by beacon identifier. A missing or
//! corrupt document only reduces coverage; loading never aborts.

use crate::core::BeaconRecord;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// One page of beacon records as exported by the beacon backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconResponse {
    pub items: Vec<BeaconRecord>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub items_from: u32,
    #[serde(default)]
    pub items_to: u32,
    #[serde(default)]
    pub total_items_count: u32,
}

/// Errors raised while loading a single reference document
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("failed to read reference file '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse reference file '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ReferenceError {
    /// Name of the reference document that failed
    pub fn file_name(&self) -> &str {
        match self {
            ReferenceError::Io { name, .. } | ReferenceError::Parse { name, .. } => name.as_str(),
        }
    }
}

/// Source of named reference documents (bundled assets, a directory, ...)
pub trait ReferenceSource {
    /// Read the full text of the named document
    fn read(&self, name: &str) -> io::Result<String>;
}

/// Reads reference documents from files inside one directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ReferenceSource for DirectorySource {
    fn read(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.root.join(name))
    }
}

/// In-memory documents keyed by name
impl ReferenceSource for HashMap<String, String> {
    fn read(&self, name: &str) -> io::Result<String> {
        self.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no document named '{}'", name))
        })
    }
}

/// Read-only lookup of known beacons by identifier
#[derive(Debug, Clone, Default)]
pub struct ReferenceBeaconIndex {
    records: HashMap<String, BeaconRecord>,
}

impl ReferenceBeaconIndex {
    /// Build the index; a later record with the same identifier replaces
    /// the earlier one.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = BeaconRecord>,
    {
        Self::build(records).0
    }

    fn build<I>(records: I) -> (Self, usize)
    where
        I: IntoIterator<Item = BeaconRecord>,
    {
        let mut map = HashMap::new();
        let mut replaced = 0;
        for record in records {
            if let Some(previous) = map.insert(record.identifier.clone(), record) {
                debug!("Reference beacon {} redefined by a later record", previous.identifier);
                replaced += 1;
            }
        }
        (Self { records: map }, replaced)
    }

    pub fn get(&self, identifier: &str) -> Option<&BeaconRecord> {
        self.records.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.records.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BeaconRecord> {
        self.records.values()
    }
}

/// Per-document diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceFileSummary {
    pub name: String,
    /// Records actually parsed from the document
    pub records_loaded: usize,
    pub total_pages: u32,
    pub items_from: u32,
    pub items_to: u32,
    pub total_items_count: u32,
}

/// Outcome of loading every reference document
#[derive(Debug)]
pub struct LoadReport {
    /// Merged index, shared with whoever consumes it
    pub index: Arc<ReferenceBeaconIndex>,
    pub summaries: Vec<ReferenceFileSummary>,
    pub failures: Vec<ReferenceError>,
    /// Records that overwrote an earlier record with the same identifier
    pub duplicates_replaced: usize,
}

impl LoadReport {
    pub fn into_index(self) -> Arc<ReferenceBeaconIndex> {
        self.index
    }
}

/// Parse one reference document.
pub fn parse_document(name: &str, content: &str) -> Result<BeaconResponse, ReferenceError> {
    serde_json::from_str(content).map_err(|source| ReferenceError::Parse {
        name: name.to_string(),
        source,
    })
}

fn load_document<S>(source: &S, name: &str) -> Result<BeaconResponse, ReferenceError>
where
    S: ReferenceSource + ?Sized,
{
    let content = source.read(name).map_err(|source| ReferenceError::Io {
        name: name.to_string(),
        source,
    })?;
    parse_document(name, &content)
}

/// Load every named document from `source` and merge them into one index.
///
/// Documents are processed in order. A document that cannot be read or
/// parsed is logged, recorded in [`LoadReport::failures`] and skipped.
pub fn load_all<S, N>(source: &S, file_names: &[N]) -> LoadReport
where
    S: ReferenceSource + ?Sized,
    N: AsRef<str>,
{
    let mut records = Vec::new();
    let mut summaries = Vec::new();
    let mut failures = Vec::new();

    for name in file_names.iter().map(AsRef::as_ref) {
        match load_document(source, name) {
            Ok(response) => {
                debug!("Loaded {} reference beacons from {}", response.items.len(), name);
                summaries.push(ReferenceFileSummary {
                    name: name.to_string(),
                    records_loaded: response.items.len(),
                    total_pages: response.total_pages,
                    items_from: response.items_from,
                    items_to: response.items_to,
                    total_items_count: response.total_items_count,
                });
                records.extend(response.items);
            }
            Err(e) => {
                error!("Error loading beacons from {}: {}", name, e);
                failures.push(e);
            }
        }
    }

    let (index, duplicates_replaced) = ReferenceBeaconIndex::build(records);
    info!(
        "Reference beacon index ready: {} beacons from {} of {} files",
        index.len(),
        summaries.len(),
        file_names.len()
    );

    LoadReport {
        index: Arc::new(index),
        summaries,
        failures,
        duplicates_replaced,
    }
}
