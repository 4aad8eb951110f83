use std::path::{Path, PathBuf};

use serde_json::json;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn write(path: &Path, bytes: &[u8]) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Write an unconsolidated Zarr group for `variable` with a two-step
/// no-leap `time` coordinate.
pub fn write_partition(store: &Path, key: &str, variable: &str) -> TestResult {
    let root = store.join(key);
    write(&root.join(".zgroup"), br#"{"zarr_format": 2}"#)?;

    let var_meta = json!({
        "zarr_format": 2, "shape": [2, 4], "chunks": [2, 4], "dtype": "<f4",
        "compressor": null, "fill_value": null, "order": "C", "filters": null
    });
    let var_attrs = json!({
        "_ARRAY_DIMENSIONS": ["time", "nlon"],
        "long_name": "Sea Surface Temperature",
        "units": "degC"
    });
    write(
        &root.join(variable).join(".zarray"),
        &serde_json::to_vec(&var_meta)?,
    )?;
    write(
        &root.join(variable).join(".zattrs"),
        &serde_json::to_vec(&var_attrs)?,
    )?;

    let time_meta = json!({
        "zarr_format": 2, "shape": [2], "chunks": [2], "dtype": "<f8",
        "compressor": null, "fill_value": null, "order": "C", "filters": null
    });
    let time_attrs = json!({
        "_ARRAY_DIMENSIONS": ["time"],
        "units": "days since 1920-01-01 00:00:00",
        "calendar": "noleap"
    });
    write(&root.join("time/.zarray"), &serde_json::to_vec(&time_meta)?)?;
    write(&root.join("time/.zattrs"), &serde_json::to_vec(&time_attrs)?)?;

    let chunk: Vec<u8> = [15.5f64, 45.0].iter().flat_map(|v| v.to_le_bytes()).collect();
    write(&root.join("time/0"), &chunk)
}

/// A static partition only needs to exist.
pub fn write_static_partition(store: &Path, key: &str) -> TestResult {
    write(&store.join(key).join(".zgroup"), br#"{"zarr_format": 2}"#)
}

/// Working directory with a sidecar, as the driver expects.
pub fn output_dir(tmp: &tempfile::TempDir) -> TestResult<PathBuf> {
    let out = tmp.path().join("out");
    write(
        &out.join("aws-cesm1-le.json"),
        br#"{"esmcat_version": "0.1.0", "id": "aws-cesm1-le", "last_updated": "2019-01-01T00:00:00Z"}"#,
    )?;
    Ok(out)
}
