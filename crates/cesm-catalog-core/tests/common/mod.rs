use std::sync::Arc;

use cesm_catalog_core::storage::{Store, StoreLocation};
use object_store::{ObjectStore, PutPayload, memory::InMemory, path::Path as ObjectPath};
use serde_json::{Value, json};

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub struct Bucket {
    pub store: Store,
    mem: Arc<InMemory>,
}

impl Bucket {
    pub fn new() -> Self {
        let mem = Arc::new(InMemory::new());
        let store = Store::from_object_store(
            StoreLocation::s3("ncar-cesm-lens", "us-west-2"),
            mem.clone(),
        );
        Bucket { store, mem }
    }

    pub async fn put(&self, key: &str, bytes: Vec<u8>) -> TestResult {
        self.mem
            .put(&ObjectPath::from(key), PutPayload::from(bytes))
            .await?;
        Ok(())
    }

    /// A consolidated group holding `variable` on (time, lev?, lat) plus a
    /// `time` coordinate whose single chunk holds `times`.
    pub async fn partition(
        &self,
        key: &str,
        variable: &str,
        levels: Option<u64>,
        times: &[f64],
    ) -> TestResult {
        let n = times.len() as u64;
        let (dims, shape) = match levels {
            Some(l) => (json!(["time", "lev", "lat"]), json!([n, l, 4])),
            None => (json!(["time", "lat"]), json!([n, 4])),
        };

        let mut metadata = serde_json::Map::new();
        metadata.insert(".zgroup".into(), json!({"zarr_format": 2}));
        metadata.insert(
            format!("{variable}/.zarray"),
            json!({
                "zarr_format": 2, "shape": shape, "chunks": shape, "dtype": "<f4",
                "compressor": {"id": "zlib", "level": 1}, "fill_value": 1e20,
                "order": "C", "filters": null
            }),
        );
        metadata.insert(
            format!("{variable}/.zattrs"),
            json!({
                "_ARRAY_DIMENSIONS": dims,
                "long_name": format!("{variable} Long Name"),
                "units": "K"
            }),
        );
        metadata.insert(
            "time/.zarray".into(),
            json!({
                "zarr_format": 2, "shape": [n], "chunks": [n], "dtype": "<f8",
                "compressor": null, "fill_value": null, "order": "C", "filters": null
            }),
        );
        metadata.insert(
            "time/.zattrs".into(),
            json!({
                "_ARRAY_DIMENSIONS": ["time"],
                "units": "days since 1920-01-01 00:00:00",
                "calendar": "noleap"
            }),
        );

        let doc = json!({"zarr_consolidated_format": 1, "metadata": Value::Object(metadata)});
        self.put(&format!("{key}/.zmetadata"), serde_json::to_vec(&doc)?)
            .await?;

        let chunk: Vec<u8> = times.iter().flat_map(|t| t.to_le_bytes()).collect();
        self.put(&format!("{key}/time/0"), chunk).await
    }
}
