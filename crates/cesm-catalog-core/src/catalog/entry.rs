//! Catalog rows.

use crate::layout::{Component, EXPERIMENTS, Frequency, PartitionKey};

/// Column names of the catalog table, in output order.
pub const COLUMNS: [&str; 11] = [
    "variable",
    "long_name",
    "component",
    "experiment",
    "frequency",
    "vertical_levels",
    "spatial_domain",
    "units",
    "start_time",
    "end_time",
    "path",
];

/// One row of the catalog: a single (partition, experiment) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Variable identifier from the filename; absent for static entries.
    pub variable: Option<String>,
    /// Lower-cased `long_name` attribute of the variable.
    pub long_name: Option<String>,
    /// Model component.
    pub component: Component,
    /// Experiment label.
    pub experiment: String,
    /// Temporal sampling.
    pub frequency: Frequency,
    /// Number of vertical levels (at least 1).
    pub vertical_levels: u32,
    /// Spatial domain label derived from the component.
    pub spatial_domain: &'static str,
    /// `units` attribute of the variable.
    pub units: Option<String>,
    /// First time coordinate value, decoded.
    pub start_time: Option<String>,
    /// Last time coordinate value, decoded.
    pub end_time: Option<String>,
    /// Fully qualified location of the partition.
    pub path: String,
}

impl CatalogEntry {
    /// Rows for a static partition: one per experiment label, identical
    /// apart from `experiment`.
    pub fn static_entries(key: &PartitionKey, path: &str) -> Vec<CatalogEntry> {
        EXPERIMENTS
            .iter()
            .map(|experiment| CatalogEntry {
                variable: None,
                long_name: None,
                component: key.component(),
                experiment: (*experiment).to_string(),
                frequency: key.frequency().clone(),
                vertical_levels: 1,
                spatial_domain: key.component().spatial_domain(),
                units: None,
                start_time: None,
                end_time: None,
                path: path.to_string(),
            })
            .collect()
    }

    /// Cell values in [`COLUMNS`] order; `None` marks a null cell.
    pub fn cells(&self) -> [Option<String>; 11] {
        [
            self.variable.clone(),
            self.long_name.clone(),
            Some(self.component.to_string()),
            Some(self.experiment.clone()),
            Some(self.frequency.to_string()),
            Some(self.vertical_levels.to_string()),
            Some(self.spatial_domain.to_string()),
            self.units.clone(),
            self.start_time.clone(),
            self.end_time.clone(),
            Some(self.path.clone()),
        ]
    }
}

/// The ordered collection of catalog rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows in order.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = CatalogEntry>) {
        self.entries.extend(entries);
    }

    /// Rows in output order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the catalog has no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<T: IntoIterator<Item = CatalogEntry>>(iter: T) -> Self {
        Catalog {
            entries: iter.into_iter().collect(),
        }
    }
}
