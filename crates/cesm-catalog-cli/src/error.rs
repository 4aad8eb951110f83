use cesm_catalog_core::{CatalogError, SidecarError, StorageError};

use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    // The storage error already names the rejected input.
    #[snafu(display("{source}"))]
    InvalidStore { source: StorageError },

    #[snafu(display("Failed to open store {location}: {source}"))]
    OpenStore {
        location: String,
        source: StorageError,
    },

    #[snafu(display("Catalog build for {location} failed: {source}"))]
    BuildCatalog {
        location: String,
        #[snafu(source(from(CatalogError, Box::new)))]
        source: Box<CatalogError>,
    },

    #[snafu(display(
        "Failed to write catalog {path}: {source}. \
         Ensure the output directory is writable."
    ))]
    WriteCatalog {
        path: String,
        #[snafu(source(from(CatalogError, Box::new)))]
        source: Box<CatalogError>,
    },

    #[snafu(display(
        "Failed to update sidecar {path}: {source}. \
         The sidecar must exist and contain a JSON object."
    ))]
    Sidecar { path: String, source: SidecarError },

    #[snafu(display("Failed to inspect partition {partition}: {source}"))]
    Inspect {
        partition: String,
        #[snafu(source(from(CatalogError, Box::new)))]
        source: Box<CatalogError>,
    },

    #[snafu(display("Failed to write output: {source}"))]
    Output { source: std::io::Error },
}
