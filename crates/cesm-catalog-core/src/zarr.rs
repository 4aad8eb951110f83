//! Zarr v2 groups read through `zarrs`.
//!
//! A partition in the bucket is a Zarr v2 group: one array per variable and
//! coordinate, each with a `.zarray` document, an optional `.zattrs`
//! document, and chunk objects. [`DatasetHeader::open`] reads only the JSON
//! documents (preferring the consolidated `.zmetadata` when the writer left
//! one) and parses each `.zarray` into `zarrs` array metadata. Chunk payloads
//! are fetched only through [`DatasetHeader::read_element`], which the catalog
//! uses to pull the first and last value of a 1-D time coordinate.

pub mod metadata;
pub mod value;

use std::{collections::BTreeMap, sync::Arc};

use object_store::{ObjectStore, path::Path as ObjectPath};
use serde_json::{Map, Value};
use snafu::prelude::*;
use zarrs::{
    array::{Array, ArrayBytes, ArrayCreateError, ArrayError, ArrayMetadata, FillValue},
    array_subset::ArraySubset,
};
use zarrs_object_store::AsyncObjectStore;

use crate::storage::{StorageError, Store};

pub use value::NumericValue;

use metadata::{
    ARRAY_KEY, ATTRS_KEY, CONSOLIDATED_KEY, ConsolidatedMetadata, GROUP_KEY, array_dimensions,
    attributes_from,
};

/// `zarrs` storage adapter over the store's object store client.
pub type ZarrStorage = AsyncObjectStore<Arc<dyn ObjectStore>>;

/// Errors raised while reading Zarr group metadata or coordinate values.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ZarrError {
    /// The store failed while fetching a metadata document.
    #[snafu(display("Storage error while reading {key}: {source}"))]
    Storage {
        /// Key that was being read.
        key: String,
        /// Underlying storage error.
        #[snafu(source(from(StorageError, Box::new)))]
        source: Box<StorageError>,
    },

    /// Neither `.zmetadata` nor `.zgroup` exists under the prefix.
    #[snafu(display("No Zarr group metadata under {prefix}"))]
    MissingMetadata {
        /// Group prefix that was opened.
        prefix: String,
    },

    /// A metadata document is not valid JSON or does not match its schema.
    #[snafu(display("Invalid Zarr metadata document {key}: {source}"))]
    InvalidJson {
        /// Key of the offending document.
        key: String,
        /// JSON error.
        source: serde_json::Error,
    },

    /// The group has no array with the requested name.
    #[snafu(display("Array '{name}' not found in {prefix}"))]
    MissingArray {
        /// Requested array name.
        name: String,
        /// Group prefix.
        prefix: String,
    },

    /// `zarrs` does not support the array's data type, codecs or layout.
    #[snafu(display("Array {name} cannot be read: {source}"))]
    UnsupportedArray {
        /// Array name.
        name: String,
        /// Error from `zarrs`.
        #[snafu(source(from(ArrayCreateError, Box::new)))]
        source: Box<ArrayCreateError>,
    },

    /// Retrieving or decoding array elements failed.
    #[snafu(display("Failed to read array {name}: {source}"))]
    Retrieve {
        /// Array name.
        name: String,
        /// Error from `zarrs`.
        #[snafu(source(from(ArrayError, Box::new)))]
        source: Box<ArrayError>,
    },

    /// Element reads are only supported on 1-D arrays.
    #[snafu(display("Array {name} has {ndim} dimensions; only 1-D arrays can be read"))]
    NotOneDimensional {
        /// Array name.
        name: String,
        /// Number of dimensions.
        ndim: usize,
    },

    /// The requested element lies outside the array.
    #[snafu(display("Index {index} is out of range for array {name} of length {len}"))]
    IndexOutOfRange {
        /// Array name.
        name: String,
        /// Requested index.
        index: u64,
        /// Array length.
        len: u64,
    },

    /// The element could not be interpreted as a number.
    #[snafu(display("Element {index} of array {name} is not numeric: {reason}"))]
    NotNumeric {
        /// Array name.
        name: String,
        /// Element index.
        index: u64,
        /// What the element looked like.
        reason: String,
    },
}

impl ZarrError {
    /// True when the failure came from the store itself (network, I/O)
    /// rather than from the content of the group.
    pub fn is_storage_failure(&self) -> bool {
        match self {
            ZarrError::Storage { .. } => true,
            ZarrError::Retrieve { source, .. } => {
                matches!(source.as_ref(), ArrayError::StorageError(_))
            }
            _ => false,
        }
    }
}

/// Result alias for Zarr reads.
pub type ZarrResult<T> = Result<T, ZarrError>;

/// Metadata of one array in a group.
#[derive(Debug, Clone)]
pub struct ArrayHeader {
    name: String,
    meta: ArrayMetadata,
    attrs: Map<String, Value>,
    dimensions: Option<Vec<String>>,
}

impl ArrayHeader {
    fn parse(name: String, key: String, doc: Value, attrs: Map<String, Value>) -> ZarrResult<Self> {
        let meta: ArrayMetadata = serde_json::from_value(doc).context(InvalidJsonSnafu { key })?;
        let dimensions = array_dimensions(&attrs);
        Ok(ArrayHeader {
            name,
            meta,
            attrs,
            dimensions,
        })
    }

    /// Array name within the group.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parsed `.zarray` document.
    pub fn metadata(&self) -> &ArrayMetadata {
        &self.meta
    }

    /// Array extent per dimension.
    pub fn shape(&self) -> &[u64] {
        match &self.meta {
            ArrayMetadata::V2(meta) => &meta.shape,
            ArrayMetadata::V3(meta) => &meta.shape,
        }
    }

    /// All attributes from `.zattrs`.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attrs
    }

    /// A string attribute, if present and a string.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    /// Dimension names from `_ARRAY_DIMENSIONS`.
    pub fn dimensions(&self) -> Option<&[String]> {
        self.dimensions.as_deref()
    }
}

/// The metadata of one Zarr v2 group, opened without reading chunk data.
#[derive(Debug, Clone)]
pub struct DatasetHeader {
    prefix: ObjectPath,
    attrs: Map<String, Value>,
    arrays: BTreeMap<String, ArrayHeader>,
}

impl DatasetHeader {
    /// Open the group at `prefix`.
    ///
    /// Uses `.zmetadata` when present; otherwise requires `.zgroup` and reads
    /// the `.zarray`/`.zattrs` pair of every child directory.
    pub async fn open(store: &Store, prefix: &ObjectPath) -> ZarrResult<DatasetHeader> {
        let consolidated_key = prefix.child(CONSOLIDATED_KEY);
        if let Some(doc) = read_json(store, &consolidated_key).await? {
            let consolidated: ConsolidatedMetadata = serde_json::from_value(doc)
                .context(InvalidJsonSnafu {
                    key: store.qualify(&consolidated_key),
                })?;
            return Self::from_consolidated(store, prefix, &consolidated);
        }

        let group_key = prefix.child(GROUP_KEY);
        if read_json(store, &group_key).await?.is_none() {
            return MissingMetadataSnafu {
                prefix: store.qualify(prefix),
            }
            .fail();
        }

        let attrs = attributes_from(read_json(store, &prefix.child(ATTRS_KEY)).await?);

        let children = store
            .list_subdirs(prefix)
            .await
            .context(StorageSnafu {
                key: store.qualify(prefix),
            })?;

        let mut arrays = BTreeMap::new();
        for child in children {
            let Some(name) = child.filename().map(str::to_string) else {
                continue;
            };

            let array_key = child.child(ARRAY_KEY);
            let Some(doc) = read_json(store, &array_key).await? else {
                // Nested group.
                continue;
            };
            let array_attrs = attributes_from(read_json(store, &child.child(ATTRS_KEY)).await?);
            let header = ArrayHeader::parse(name.clone(), store.qualify(&array_key), doc, array_attrs)?;
            arrays.insert(name, header);
        }

        log::debug!(
            "opened {} without consolidated metadata ({} arrays)",
            store.qualify(prefix),
            arrays.len()
        );

        Ok(DatasetHeader {
            prefix: prefix.clone(),
            attrs,
            arrays,
        })
    }

    fn from_consolidated(
        store: &Store,
        prefix: &ObjectPath,
        consolidated: &ConsolidatedMetadata,
    ) -> ZarrResult<DatasetHeader> {
        let attrs = attributes_from(consolidated.document("", ATTRS_KEY).cloned());

        let mut arrays = BTreeMap::new();
        for name in consolidated.array_names() {
            let key = store.qualify(&prefix.child(name).child(ARRAY_KEY));
            let doc = consolidated
                .document(name, ARRAY_KEY)
                .cloned()
                .unwrap_or(Value::Null);
            let array_attrs = attributes_from(consolidated.document(name, ATTRS_KEY).cloned());

            arrays.insert(
                name.to_string(),
                ArrayHeader::parse(name.to_string(), key, doc, array_attrs)?,
            );
        }

        Ok(DatasetHeader {
            prefix: prefix.clone(),
            attrs,
            arrays,
        })
    }

    /// Group prefix relative to the store root.
    pub fn prefix(&self) -> &ObjectPath {
        &self.prefix
    }

    /// Group-level attributes.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attrs
    }

    /// Look up an array by name.
    pub fn array(&self, name: &str) -> Option<&ArrayHeader> {
        self.arrays.get(name)
    }

    /// Like [`DatasetHeader::array`], but a missing array is an error.
    pub fn require_array(&self, name: &str) -> ZarrResult<&ArrayHeader> {
        self.arrays.get(name).context(MissingArraySnafu {
            name,
            prefix: self.prefix.as_ref(),
        })
    }

    /// All arrays, ordered by name.
    pub fn arrays(&self) -> impl Iterator<Item = &ArrayHeader> {
        self.arrays.values()
    }

    /// Open the array `name` for reading through `zarrs`.
    pub fn open_array(&self, store: &Store, name: &str) -> ZarrResult<Array<ZarrStorage>> {
        let header = self.require_array(name)?;
        let storage = Arc::new(AsyncObjectStore::new(store.object_store()));
        let node_path = if self.prefix.as_ref().is_empty() {
            format!("/{name}")
        } else {
            format!("/{}/{name}", self.prefix)
        };

        Array::new_with_metadata(storage, &node_path, header.meta.clone())
            .context(UnsupportedArraySnafu { name })
    }

    /// Read element `index` of the 1-D array `name`.
    ///
    /// Only the chunk holding the element is fetched. A chunk that was never
    /// written yields the array's fill value.
    pub async fn read_element(
        &self,
        store: &Store,
        name: &str,
        index: u64,
    ) -> ZarrResult<NumericValue> {
        let shape = self.require_array(name)?.shape();
        let &[len] = shape else {
            return NotOneDimensionalSnafu {
                name,
                ndim: shape.len(),
            }
            .fail();
        };
        ensure!(index < len, IndexOutOfRangeSnafu { name, index, len });

        let array = self.open_array(store, name)?;
        let subset = ArraySubset::new_with_ranges(&[index..index + 1]);
        let element: ArrayBytes<'_> = array
            .async_retrieve_array_subset(&subset)
            .await
            .context(RetrieveSnafu { name })?;

        let ArrayBytes::Fixed(bytes) = element else {
            return NotNumericSnafu {
                name,
                index,
                reason: "variable-length element",
            }
            .fail();
        };

        // Same route as the fill value: bytes to the JSON form of the element.
        let json = array
            .data_type()
            .metadata_fill_value(&FillValue::from(&*bytes))
            .map_err(|e| e.to_string())
            .and_then(|meta| serde_json::to_value(&meta).map_err(|e| e.to_string()))
            .map_err(|reason| ZarrError::NotNumeric {
                name: name.to_string(),
                index,
                reason,
            })?;

        NumericValue::from_json(&json).context(NotNumericSnafu {
            name,
            index,
            reason: json.to_string(),
        })
    }
}

/// Fetch and parse a JSON document; a missing object yields `Ok(None)`.
async fn read_json(store: &Store, key: &ObjectPath) -> ZarrResult<Option<Value>> {
    let Some(bytes) = store.read_optional(key).await.context(StorageSnafu {
        key: store.qualify(key),
    })?
    else {
        return Ok(None);
    };

    let value = serde_json::from_slice(&bytes).context(InvalidJsonSnafu {
        key: store.qualify(key),
    })?;
    Ok(Some(value))
}
