//! Persist batch results as GeoJSON and JSON files.
//!
//! A batch produces one `{provider}_routes.geojson` collection per provider
//! (written even when empty), `od_points.geojson` with the sampled pairs and
//! `stats.json` keyed by pair id.

mod artefacts;

use std::collections::BTreeMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use routecompare_core::{BatchResult, BatchStore, CoverageStat};
use thiserror::Error;

use crate::fs::{create_dir_all, open_dir_and_file};

pub use artefacts::{
    StoredRoute, manual_result, od_points, parse_route_collection, route_collection,
    routes_file_name, stats_by_pair,
};

/// Origin/destination points artefact.
pub const OD_POINTS_FILE: &str = "od_points.geojson";
/// Coverage statistics artefact.
pub const STATS_FILE: &str = "stats.json";
/// Directory the CLI writes to unless told otherwise.
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Errors raised while writing or reading artefacts.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Creating the output directory failed.
    #[error("failed to create output directory {path}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Writing an artefact failed.
    #[error("failed to write {path}")]
    Write {
        /// Destination file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Reading an artefact failed.
    #[error("failed to read {path}")]
    Read {
        /// Source file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Serialising an artefact failed.
    #[error("failed to encode {artefact}")]
    Encode {
        /// Artefact being encoded.
        artefact: String,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// The text is not valid GeoJSON.
    #[error("failed to decode GeoJSON")]
    Decode {
        /// Source error produced by `geojson`.
        #[source]
        source: geojson::Error,
    },
    /// The statistics file is not valid JSON of the expected shape.
    #[error("failed to decode {path}")]
    DecodeStats {
        /// Source file.
        path: Utf8PathBuf,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// A feature lacks the geometry or properties of a stored route.
    #[error("feature {index} is not a stored route: {message}")]
    InvalidFeature {
        /// Position of the feature in its collection.
        index: usize,
        /// What was wrong with it.
        message: String,
    },
}

/// Writes batch artefacts into one directory, creating it when missing.
///
/// # Examples
/// ```no_run
/// use routecompare_data::GeoJsonDirectoryStore;
///
/// let store = GeoJsonDirectoryStore::new("data");
/// assert_eq!(store.dir().as_str(), "data");
/// ```
#[derive(Debug, Clone)]
pub struct GeoJsonDirectoryStore {
    dir: Utf8PathBuf,
}

impl GeoJsonDirectoryStore {
    /// Store artefacts under `dir`.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Path of the route collection written for a provider.
    pub fn routes_path(&self, kind: routecompare_core::ProviderKind) -> Utf8PathBuf {
        self.dir.join(routes_file_name(kind))
    }

    /// Path of the statistics file.
    pub fn stats_path(&self) -> Utf8PathBuf {
        self.dir.join(STATS_FILE)
    }
}

impl BatchStore for GeoJsonDirectoryStore {
    type Error = StoreError;

    fn save(&self, result: &BatchResult) -> Result<(), Self::Error> {
        let files = artefacts::batch_artefacts(result)?;
        let dir = create_dir_all(&self.dir).map_err(|source| StoreError::CreateDirectory {
            path: self.dir.clone(),
            source,
        })?;
        for (name, body) in files {
            dir.write(&name, body)
                .map_err(|source| StoreError::Write {
                    path: self.dir.join(&name),
                    source,
                })?;
        }
        info!(
            "saved {} pairs for {} providers to {}",
            result.pairs.len(),
            result.providers.len(),
            self.dir
        );
        Ok(())
    }
}

fn read_text(path: &Utf8Path) -> Result<String, StoreError> {
    open_dir_and_file(path)
        .and_then(|(dir, name)| dir.read_to_string(name))
        .map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a route collection written by [`GeoJsonDirectoryStore`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a route collection.
pub fn read_route_collection(path: &Utf8Path) -> Result<Vec<StoredRoute>, StoreError> {
    parse_route_collection(&read_text(path)?)
}

/// Read `stats.json` back into coverage statistics keyed by pair id.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn read_stats(path: &Utf8Path) -> Result<BTreeMap<u32, CoverageStat>, StoreError> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|source| StoreError::DecodeStats {
        path: path.to_path_buf(),
        source,
    })
}
