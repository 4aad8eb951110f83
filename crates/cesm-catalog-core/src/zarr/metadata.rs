//! Group-level JSON documents of a Zarr v2 store.
//!
//! Array documents (`.zarray`) are parsed by `zarrs`. What is left here is the
//! consolidated `.zmetadata` index and the attribute conventions layered on
//! top of `.zattrs` by xarray.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Name of the consolidated metadata document at the group root.
pub const CONSOLIDATED_KEY: &str = ".zmetadata";
/// Name of the group marker document.
pub const GROUP_KEY: &str = ".zgroup";
/// Name of the per-array metadata document.
pub const ARRAY_KEY: &str = ".zarray";
/// Name of the attribute document of a group or array.
pub const ATTRS_KEY: &str = ".zattrs";

/// Attribute under which xarray records the dimension names of an array.
pub const ARRAY_DIMENSIONS_ATTR: &str = "_ARRAY_DIMENSIONS";

/// Contents of a `.zmetadata` document.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsolidatedMetadata {
    /// Consolidation format version.
    #[serde(default)]
    pub zarr_consolidated_format: Option<u8>,
    /// Every metadata document of the group, keyed by relative path
    /// (`.zgroup`, `SST/.zarray`, `SST/.zattrs`, ...).
    pub metadata: BTreeMap<String, Value>,
}

impl ConsolidatedMetadata {
    /// Names of the arrays directly below the group root.
    pub fn array_names(&self) -> impl Iterator<Item = &str> {
        self.metadata.keys().filter_map(|key| {
            key.strip_suffix(ARRAY_KEY)
                .and_then(|dir| dir.strip_suffix('/'))
                .filter(|name| !name.is_empty() && !name.contains('/'))
        })
    }

    /// The raw document stored under `{name}/{doc}` (or `doc` at the root
    /// when `name` is empty).
    pub fn document(&self, name: &str, doc: &str) -> Option<&Value> {
        if name.is_empty() {
            self.metadata.get(doc)
        } else {
            self.metadata.get(&format!("{name}/{doc}"))
        }
    }
}

/// Turn a `.zattrs` document into an attribute map; non-object documents
/// yield an empty map.
pub fn attributes_from(value: Option<Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Dimension names recorded by xarray, if present and well-formed.
pub fn array_dimensions(attrs: &Map<String, Value>) -> Option<Vec<String>> {
    let dims = attrs.get(ARRAY_DIMENSIONS_ATTR)?.as_array()?;
    dims.iter()
        .map(|d| d.as_str().map(str::to_string))
        .collect()
}
