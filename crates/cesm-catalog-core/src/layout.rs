//! Bucket layout conventions for the CESM LENS Zarr stores.
//!
//! Partitions live at `{component}/{frequency}/{filename}` under the bucket
//! root, where `filename` is `{prefix}-{experiment}-{variable}.{suffix}`.
//! [`PartitionKey::parse`] validates a key against that grammar up front and
//! reports which rule was broken, so callers never index into split results.
//!
//! The fixed lookups that go with the layout (known components, experiment
//! labels, spatial domains) live here as well.

use std::{fmt, str::FromStr};

use object_store::path::Path as ObjectPath;
use snafu::prelude::*;

/// Experiment labels a static partition is replicated across, in output
/// order.
pub const EXPERIMENTS: [&str; 4] = ["CTRL", "HIST", "RCP85", "20C"];

/// Frequency directory name for time-invariant fields.
pub const STATIC_FREQUENCY: &str = "static";

/// Physical component of the climate model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    /// Northern hemisphere sea ice (`ice_nh`).
    IceNh,
    /// Southern hemisphere sea ice (`ice_sh`).
    IceSh,
    /// Land (`lnd`).
    Land,
    /// Ocean (`ocn`).
    Ocean,
    /// Atmosphere (`atm`).
    Atmosphere,
}

impl Component {
    /// All components, in the order the bucket is scanned.
    pub const ALL: [Component; 5] = [
        Component::IceNh,
        Component::IceSh,
        Component::Land,
        Component::Ocean,
        Component::Atmosphere,
    ];

    /// Directory name of the component in the bucket.
    pub fn as_str(self) -> &'static str {
        match self {
            Component::IceNh => "ice_nh",
            Component::IceSh => "ice_sh",
            Component::Land => "lnd",
            Component::Ocean => "ocn",
            Component::Atmosphere => "atm",
        }
    }

    /// Spatial-domain label recorded in the catalog for this component.
    pub fn spatial_domain(self) -> &'static str {
        match self {
            Component::IceNh => "northern_hemisphere",
            Component::IceSh => "southern_hemisphere",
            Component::Land => "global_land",
            Component::Ocean => "global_ocean",
            Component::Atmosphere => "global",
        }
    }

    /// Look up a component by directory name.
    pub fn from_dir_name(name: &str) -> Option<Component> {
        Component::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Component::from_dir_name(s).context(UnknownComponentSnafu { name: s })
    }
}

/// Temporal sampling of a partition (`monthly`, `daily`, `static`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frequency(String);

impl Frequency {
    /// Wrap a frequency directory name.
    pub fn new(name: impl Into<String>) -> Self {
        Frequency(name.into())
    }

    /// Directory name of the frequency.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for time-invariant partitions.
    pub fn is_static(&self) -> bool {
        self.0 == STATIC_FREQUENCY
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ways a partition key can violate the layout grammar.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum LayoutError {
    /// The key does not have exactly `{component}/{frequency}/{filename}`.
    #[snafu(display(
        "Partition key '{key}' has {depth} segments, expected 3 \
         ({{component}}/{{frequency}}/{{filename}})"
    ))]
    WrongDepth {
        /// The offending key.
        key: String,
        /// Number of segments found.
        depth: usize,
    },

    /// The component segment is not one of the known components.
    #[snafu(display("Unknown component '{name}' (expected one of ice_nh, ice_sh, lnd, ocn, atm)"))]
    UnknownComponent {
        /// The segment that failed to match.
        name: String,
    },

    /// The filename has no format suffix to strip.
    #[snafu(display("Partition filename '{file_name}' has no format suffix"))]
    MissingSuffix {
        /// The offending filename.
        file_name: String,
    },

    /// The filename stem does not split into prefix, experiment and variable.
    #[snafu(display(
        "Partition filename stem '{stem}' has {tokens} '-'-delimited tokens, expected \
         3 ({{prefix}}-{{experiment}}-{{variable}})"
    ))]
    StemTokenCount {
        /// The stem that was split.
        stem: String,
        /// Number of tokens found.
        tokens: usize,
    },

    /// One of the stem tokens is empty.
    #[snafu(display("Partition filename stem '{stem}' has an empty token"))]
    EmptyStemToken {
        /// The stem that was split.
        stem: String,
    },
}

/// Experiment and variable named by a partition filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetName {
    /// Filename prefix (ignored by the catalog).
    pub prefix: String,
    /// Experiment label, e.g. `HIST`.
    pub experiment: String,
    /// Variable identifier, e.g. `SST`.
    pub variable: String,
}

impl DatasetName {
    /// Parse `{prefix}-{experiment}-{variable}.{suffix}`.
    ///
    /// The suffix is everything after the final `.`, so prefixes may contain
    /// dots (`b.e11.SST-HIST-SST.zarr`).
    pub fn parse(file_name: &str) -> Result<DatasetName, LayoutError> {
        let (stem, _suffix) = file_name
            .rsplit_once('.')
            .filter(|(stem, _)| !stem.is_empty())
            .context(MissingSuffixSnafu { file_name })?;

        let tokens: Vec<&str> = stem.split('-').collect();
        let [prefix, experiment, variable] = tokens.as_slice() else {
            return StemTokenCountSnafu {
                stem,
                tokens: tokens.len(),
            }
            .fail();
        };

        ensure!(
            !(prefix.is_empty() || experiment.is_empty() || variable.is_empty()),
            EmptyStemTokenSnafu { stem }
        );

        Ok(DatasetName {
            prefix: (*prefix).to_string(),
            experiment: (*experiment).to_string(),
            variable: (*variable).to_string(),
        })
    }
}

/// A partition key validated against the bucket layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionKey {
    key: ObjectPath,
    component: Component,
    frequency: Frequency,
    file_name: String,
}

impl PartitionKey {
    /// Validate the positional segments of `key`.
    ///
    /// Only `{component}/{frequency}/{filename}` is checked here; the
    /// filename grammar is checked by [`PartitionKey::dataset_name`] because
    /// static partitions do not follow it.
    pub fn parse(key: &ObjectPath) -> Result<PartitionKey, LayoutError> {
        let segments: Vec<&str> = key.as_ref().split('/').collect();
        let [component, frequency, file_name] = segments.as_slice() else {
            return WrongDepthSnafu {
                key: key.as_ref(),
                depth: segments.len(),
            }
            .fail();
        };

        let component: Component = component.parse()?;

        Ok(PartitionKey {
            key: key.clone(),
            component,
            frequency: Frequency::new(*frequency),
            file_name: (*file_name).to_string(),
        })
    }

    /// The key relative to the bucket root.
    pub fn key(&self) -> &ObjectPath {
        &self.key
    }

    /// Component segment.
    pub fn component(&self) -> Component {
        self.component
    }

    /// Frequency segment.
    pub fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    /// Final segment of the key.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Parse the experiment and variable from the filename.
    pub fn dataset_name(&self) -> Result<DatasetName, LayoutError> {
        DatasetName::parse(&self.file_name)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn components_round_trip_through_names() {
        for c in Component::ALL {
            assert_eq!(Component::from_dir_name(c.as_str()), Some(c));
        }
        assert_eq!(Component::from_dir_name("glc"), None);
    }

    #[test]
    fn spatial_domains() {
        assert_eq!(Component::Ocean.spatial_domain(), "global_ocean");
        assert_eq!(Component::Atmosphere.spatial_domain(), "global");
        assert_eq!(Component::Land.spatial_domain(), "global_land");
    }

    #[test]
    fn parse_partition_key() -> TestResult {
        let key = ObjectPath::from("ocn/monthly/b.e11.SST-HIST-SST.zarr");
        let parsed = PartitionKey::parse(&key)?;
        assert_eq!(parsed.component(), Component::Ocean);
        assert_eq!(parsed.frequency().as_str(), "monthly");
        assert!(!parsed.frequency().is_static());
        assert_eq!(parsed.file_name(), "b.e11.SST-HIST-SST.zarr");

        let name = parsed.dataset_name()?;
        assert_eq!(name.prefix, "b.e11.SST");
        assert_eq!(name.experiment, "HIST");
        assert_eq!(name.variable, "SST");
        Ok(())
    }

    #[test]
    fn static_key_does_not_need_stem_grammar() -> TestResult {
        let key = ObjectPath::from("lnd/static/grid.zarr");
        let parsed = PartitionKey::parse(&key)?;
        assert!(parsed.frequency().is_static());
        assert!(parsed.dataset_name().is_err());
        Ok(())
    }

    #[test]
    fn wrong_depth_is_reported() {
        let err = PartitionKey::parse(&ObjectPath::from("ocn/monthly")).unwrap_err();
        assert_eq!(
            err,
            LayoutError::WrongDepth {
                key: "ocn/monthly".to_string(),
                depth: 2
            }
        );

        let err = PartitionKey::parse(&ObjectPath::from("ocn/monthly/x/y.zarr")).unwrap_err();
        assert!(matches!(err, LayoutError::WrongDepth { depth: 4, .. }));
    }

    #[test]
    fn unknown_component_is_reported() {
        let err = PartitionKey::parse(&ObjectPath::from("glc/monthly/a-B-C.zarr")).unwrap_err();
        assert!(matches!(err, LayoutError::UnknownComponent { ref name } if name == "glc"));
    }

    #[test]
    fn stem_grammar_violations() {
        assert!(matches!(
            DatasetName::parse("cesmLE-HIST.zarr"),
            Err(LayoutError::StemTokenCount { tokens: 2, .. })
        ));
        assert!(matches!(
            DatasetName::parse("cesmLE-RCP85-SST-extra.zarr"),
            Err(LayoutError::StemTokenCount { tokens: 4, .. })
        ));
        assert!(matches!(
            DatasetName::parse("cesmLE--SST.zarr"),
            Err(LayoutError::EmptyStemToken { .. })
        ));
        assert!(matches!(
            DatasetName::parse("cesmLE-HIST-SST"),
            Err(LayoutError::MissingSuffix { .. })
        ));
    }

    #[test]
    fn error_messages_name_the_grammar() {
        let err = DatasetName::parse("a-b.zarr").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Partition filename stem 'a-b' has 2 '-'-delimited tokens, expected 3 \
             ({prefix}-{experiment}-{variable})"
        );
    }
}
