//! Update-timestamp sidecar next to the catalog.
//!
//! The sidecar is a JSON object maintained by hand (description, catalog
//! URL, ...). A build only rewrites its `last_updated` field; every other
//! field is carried over in its original order. The file must already exist.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, ser::PrettyFormatter};
use snafu::prelude::*;

use crate::storage::{self, StorageError, StoreLocation};

/// Field rewritten on every successful build.
pub const LAST_UPDATED_FIELD: &str = "last_updated";

/// Timestamp format of [`LAST_UPDATED_FIELD`].
pub const LAST_UPDATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Errors from patching the sidecar.
#[derive(Debug, Snafu)]
pub enum SidecarError {
    /// The sidecar could not be read (including when it does not exist).
    #[snafu(display("Failed to read sidecar: {source}"))]
    Read {
        /// Underlying storage error.
        source: StorageError,
    },

    /// The sidecar is not valid JSON.
    #[snafu(display("Sidecar {path} is not valid JSON: {source}"))]
    Parse {
        /// Path of the sidecar.
        path: String,
        /// JSON error.
        source: serde_json::Error,
    },

    /// The sidecar is JSON but not an object.
    #[snafu(display("Sidecar {path} must contain a JSON object"))]
    NotAnObject {
        /// Path of the sidecar.
        path: String,
    },

    /// The patched document could not be serialized.
    #[snafu(display("Failed to serialize sidecar {path}: {source}"))]
    Serialize {
        /// Path of the sidecar.
        path: String,
        /// JSON error.
        source: serde_json::Error,
    },

    /// The patched sidecar could not be written.
    #[snafu(display("Failed to write sidecar: {source}"))]
    Write {
        /// Underlying storage error.
        source: StorageError,
    },
}

/// Set `last_updated` in the sidecar at `rel_path` to `now` and rewrite it.
///
/// The file is rewritten pretty-printed with four-space indentation and
/// replaced atomically. Returns the timestamp that was written.
pub async fn touch_last_updated(
    location: &StoreLocation,
    rel_path: &Path,
    now: DateTime<Utc>,
) -> Result<String, SidecarError> {
    let path = rel_path.display().to_string();
    let text = storage::read_to_string(location, rel_path)
        .await
        .context(ReadSnafu)?;

    let mut doc: Value = serde_json::from_str(&text).context(ParseSnafu { path: path.as_str() })?;
    let fields = doc
        .as_object_mut()
        .context(NotAnObjectSnafu { path: path.as_str() })?;

    let stamp = now.format(LAST_UPDATED_FORMAT).to_string();
    fields.insert(LAST_UPDATED_FIELD.to_string(), Value::String(stamp.clone()));

    let mut out = Vec::with_capacity(text.len() + 32);
    let mut ser =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    doc.serialize(&mut ser).context(SerializeSnafu { path })?;
    out.push(b'\n');

    storage::write_atomic(location, rel_path, &out)
        .await
        .context(WriteSnafu)?;

    log::info!("set {LAST_UPDATED_FIELD} = {stamp} in {}", rel_path.display());
    Ok(stamp)
}
