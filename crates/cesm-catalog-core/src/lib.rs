//! Catalog builder for the CESM Large Ensemble Zarr stores.
//!
//! The model output lives in an object store bucket laid out as
//! `{component}/{frequency}/{prefix}-{experiment}-{variable}.zarr`, one Zarr
//! v2 group per partition. This crate turns that layout into a flat catalog:
//!
//! - Store access over `object_store`, anonymous for public S3 buckets, plus
//!   atomic local writes (`storage` module).
//! - The partition key grammar and the fixed component/experiment lookups
//!   (`layout` module).
//! - A metadata-only Zarr v2 reader that can also fetch single elements of
//!   1-D coordinate arrays (`zarr` module).
//! - CF conventions for vertical axes and calendar-aware time decoding
//!   (`cf` module).
//! - Catalog assembly and CSV output (`catalog` module), and the
//!   `last_updated` sidecar (`sidecar` module).
//!
//! The `cesmcat` binary drives a build end to end; everything it does is
//! available here for use from other tools.
#![deny(missing_docs)]
pub mod catalog;
pub mod cf;
pub mod layout;
pub mod sidecar;
pub mod storage;
pub mod zarr;

pub use catalog::{
    BuildReport, COLUMNS, Catalog, CatalogEntry, CatalogError, SkippedPartition, build_catalog,
    entries_for_partition, write_catalog_csv,
};
pub use layout::{Component, Frequency, PartitionKey};
pub use sidecar::{SidecarError, touch_last_updated};
pub use storage::{StorageError, Store, StoreLocation};
