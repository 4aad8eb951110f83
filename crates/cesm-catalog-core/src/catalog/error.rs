//! Error types for catalog assembly and output.

use arrow::error::ArrowError;
use snafu::prelude::*;

use crate::{
    cf::TimeError,
    layout::LayoutError,
    storage::StorageError,
    zarr::ZarrError,
};

/// Errors from building or writing the catalog.
///
/// The builder treats [`CatalogError::is_recoverable`] errors as per-partition
/// problems (logged, partition skipped); everything else ends the run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CatalogError {
    /// Listing a directory of the store failed.
    #[snafu(display("Failed to list {path}: {source}"))]
    List {
        /// Qualified path that was being listed.
        path: String,
        /// Underlying storage error.
        #[snafu(source(from(StorageError, Box::new)))]
        source: Box<StorageError>,
    },

    /// None of the known component directories exist at the store root.
    #[snafu(display(
        "No component directories (ice_nh, ice_sh, lnd, ocn, atm) found in {location}"
    ))]
    NoComponents {
        /// Display form of the store location.
        location: String,
    },

    /// The partition key does not follow the layout grammar.
    #[snafu(display("Invalid partition {path}: {source}"))]
    Layout {
        /// Qualified partition path.
        path: String,
        /// Grammar violation.
        source: LayoutError,
    },

    /// The partition's Zarr metadata could not be read.
    #[snafu(display("Failed to read metadata of {path}: {source}"))]
    Header {
        /// Qualified partition path.
        path: String,
        /// Underlying reader error.
        #[snafu(source(from(ZarrError, Box::new)))]
        source: Box<ZarrError>,
    },

    /// The variable named by the filename is not in the group.
    #[snafu(display("Variable '{variable}' not found in {path}"))]
    MissingVariable {
        /// Variable from the filename.
        variable: String,
        /// Qualified partition path.
        path: String,
    },

    /// A time coordinate value could not be decoded.
    #[snafu(display("Undecodable time coordinate '{coordinate}' in {path}: {source}"))]
    Time {
        /// Name of the time coordinate.
        coordinate: String,
        /// Qualified partition path.
        path: String,
        /// Decoder error.
        source: TimeError,
    },

    /// The catalog could not be converted to Arrow or serialized.
    #[snafu(display("Failed to encode catalog table: {source}"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },

    /// Writing the catalog or sidecar failed.
    #[snafu(display("Failed to write {path}: {source}"))]
    Write {
        /// Target path.
        path: String,
        /// Underlying storage error.
        #[snafu(source(from(StorageError, Box::new)))]
        source: Box<StorageError>,
    },
}

impl CatalogError {
    /// True for per-partition problems that should be logged and skipped.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CatalogError::Layout { .. }
            | CatalogError::MissingVariable { .. }
            | CatalogError::Time { .. } => true,
            CatalogError::Header { source, .. } => !source.is_storage_failure(),
            _ => false,
        }
    }
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
