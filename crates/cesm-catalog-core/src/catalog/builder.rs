//! Walk the store and assemble catalog rows.
//!
//! The walk is strictly sequential: list the component directories at the
//! root, their frequency directories, then the partitions inside each, and
//! finally open every non-static partition's metadata in key order. Nothing
//! is written here; the caller decides what to do with the [`BuildReport`].

use log::{debug, info, warn};
use object_store::path::Path as ObjectPath;
use snafu::prelude::*;

use crate::{
    catalog::{
        entry::{Catalog, CatalogEntry},
        error::{
            CatalogResult, HeaderSnafu, LayoutSnafu, ListSnafu, MissingVariableSnafu,
            NoComponentsSnafu, TimeSnafu,
        },
    },
    cf::{self, decode_time},
    layout::{Component, PartitionKey},
    storage::{Store, listing::last_segment},
    zarr::{ArrayHeader, DatasetHeader},
};

/// A partition left out of the catalog, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPartition {
    /// Fully qualified partition path.
    pub path: String,
    /// Rendered error that caused the skip.
    pub reason: String,
}

/// Outcome of [`build_catalog`].
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Rows for every partition that could be read.
    pub catalog: Catalog,
    /// Partitions that were skipped because of recoverable errors.
    pub skipped: Vec<SkippedPartition>,
}

async fn list(store: &Store, dir: &ObjectPath) -> CatalogResult<Vec<ObjectPath>> {
    store.list_subdirs(dir).await.context(ListSnafu {
        path: store.qualify(dir),
    })
}

/// List every partition key in the store, sorted lexicographically.
///
/// Only the known component directories at the root are descended into. A
/// store in which none of them exist is an error. Partitions are directories;
/// plain objects next to them are ignored.
pub async fn discover_partitions(store: &Store) -> CatalogResult<Vec<ObjectPath>> {
    let top = list(store, &ObjectPath::default()).await?;

    let components: Vec<ObjectPath> = top
        .into_iter()
        .filter(|dir| last_segment(dir).and_then(Component::from_dir_name).is_some())
        .collect();
    ensure!(
        !components.is_empty(),
        NoComponentsSnafu {
            location: store.location().to_string(),
        }
    );
    info!(
        "found {} component directories in {}",
        components.len(),
        store.location()
    );

    let mut frequencies = Vec::new();
    for component in &components {
        frequencies.extend(list(store, component).await?);
    }

    let mut partitions = Vec::new();
    for frequency in &frequencies {
        partitions.extend(list(store, frequency).await?);
    }

    partitions.sort();
    info!(
        "found {} partitions under {} frequency directories",
        partitions.len(),
        frequencies.len()
    );
    Ok(partitions)
}

/// Build the catalog for every partition in `store`.
///
/// Partitions that fail with a recoverable error are logged and reported in
/// [`BuildReport::skipped`]; listing failures abort the build.
pub async fn build_catalog(store: &Store) -> CatalogResult<BuildReport> {
    let partitions = discover_partitions(store).await?;

    let mut report = BuildReport::default();
    for key in &partitions {
        match entries_for_partition(store, key).await {
            Ok(entries) => report.catalog.extend(entries),
            Err(e) if e.is_recoverable() => {
                let path = store.qualify(key);
                warn!("skipping partition {path}: {e}");
                report.skipped.push(SkippedPartition {
                    path,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "catalog has {} rows; skipped {} partitions",
        report.catalog.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Catalog rows for the single partition at `key`.
///
/// Static partitions produce one row per experiment without touching the
/// store; other partitions produce exactly one row.
pub async fn entries_for_partition(
    store: &Store,
    key: &ObjectPath,
) -> CatalogResult<Vec<CatalogEntry>> {
    let path = store.qualify(key);
    let partition = PartitionKey::parse(key).context(LayoutSnafu { path: path.as_str() })?;

    if partition.frequency().is_static() {
        debug!("{path}: static partition");
        return Ok(CatalogEntry::static_entries(&partition, &path));
    }

    let name = partition
        .dataset_name()
        .context(LayoutSnafu { path: path.as_str() })?;

    let header = DatasetHeader::open(store, key)
        .await
        .context(HeaderSnafu { path: path.as_str() })?;

    let variable = header
        .array(&name.variable)
        .context(MissingVariableSnafu {
            variable: name.variable.as_str(),
            path: path.as_str(),
        })?;

    let levels = cf::vertical_levels(&header, variable);
    let (start_time, end_time) = time_range(store, &header, variable, &path).await?;
    debug!("{path}: {levels} levels, time {start_time:?}..{end_time:?}");

    Ok(vec![CatalogEntry {
        variable: Some(name.variable.clone()),
        long_name: variable.attr_str("long_name").map(str::to_lowercase),
        component: partition.component(),
        experiment: name.experiment,
        frequency: partition.frequency().clone(),
        vertical_levels: u32::try_from(levels).unwrap_or(u32::MAX),
        spatial_domain: partition.component().spatial_domain(),
        units: variable.attr_str("units").map(str::to_string),
        start_time,
        end_time,
        path,
    }])
}

/// First and last decoded values of the variable's time coordinate, or
/// `(None, None)` when it has no time axis.
async fn time_range(
    store: &Store,
    header: &DatasetHeader,
    variable: &ArrayHeader,
    path: &str,
) -> CatalogResult<(Option<String>, Option<String>)> {
    let Some(axis) = cf::time_axis(header, variable) else {
        return Ok((None, None));
    };
    let Some(coord) = header.array(axis.name) else {
        debug!("{path}: time dimension '{}' has no coordinate array", axis.name);
        return Ok((None, None));
    };
    let Some(last_index) = coord.shape().first().and_then(|len| len.checked_sub(1)) else {
        return Ok((None, None));
    };

    let units = coord.attr_str("units");
    let calendar = coord.attr_str("calendar");

    let mut decoded = Vec::with_capacity(2);
    for index in [0, last_index] {
        let raw = header
            .read_element(store, axis.name, index)
            .await
            .context(HeaderSnafu { path })?;
        let text = decode_time(raw, units, calendar).context(TimeSnafu {
            coordinate: axis.name,
            path,
        })?;
        decoded.push(text);
    }

    let mut decoded = decoded.into_iter();
    Ok((decoded.next(), decoded.next()))
}
