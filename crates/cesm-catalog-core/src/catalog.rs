//! Catalog assembly and serialization.
//!
//! - [`builder`] walks a [`Store`](crate::storage::Store) and produces a
//!   [`BuildReport`]: the ordered [`Catalog`] plus the partitions skipped on
//!   the way.
//! - [`entry`] defines the row type and the fixed column order.
//! - [`table`] turns a catalog into an Arrow record batch and writes it as
//!   CSV.

pub mod builder;
pub mod entry;
pub mod error;
pub mod table;

pub use builder::{
    BuildReport, SkippedPartition, build_catalog, discover_partitions, entries_for_partition,
};
pub use entry::{COLUMNS, Catalog, CatalogEntry};
pub use error::{CatalogError, CatalogResult};
pub use table::{catalog_schema, write_catalog_csv};
