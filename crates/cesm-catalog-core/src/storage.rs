//! Store access and local output utilities.
//!
//! This module centralizes all storage-related logic for
//! `cesm-catalog-core`. It is responsible for:
//!
//! - Mapping a store location string (`s3://bucket`, a bare bucket name, or a
//!   local directory) to a [`StoreLocation`].
//! - Opening a read-only [`Store`] over that location, backed by an
//!   [`object_store::ObjectStore`] client (anonymous for S3).
//! - Directory-style listing with the listing-self artifact filtered out
//!   (see [`listing`]).
//! - Small helpers for atomic local writes used by the driver when it
//!   replaces the catalog and sidecar files (write-then-rename semantics).
//!
//! Higher-level modules (`zarr`, `catalog`) work with object keys relative to
//! the store root and never concatenate bucket names themselves.

pub mod error;
pub mod listing;
pub mod output;

pub use error::{BackendError, StorageError};
pub use object_store::path::Path as ObjectPath;
pub(crate) use error::{InvalidLocationSnafu, OtherIoSnafu, UnsupportedSnafu};

use std::{
    fmt,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::Bytes;
use object_store::{ObjectStore, aws::AmazonS3Builder, local::LocalFileSystem};
use snafu::prelude::*;
use tokio::{fs, io::AsyncWriteExt};

/// General result type used by storage operations.
///
/// This aliases `Result<T, StorageError>` so functions in this module can
/// return a concise result type while still communicating storage-specific
/// error information via `StorageError`.
pub type StorageResult<T> = Result<T, StorageError>;

/// Bucket that hosts the CESM Large Ensemble Zarr stores on AWS.
pub const DEFAULT_BUCKET: &str = "ncar-cesm-lens";

/// Region of [`DEFAULT_BUCKET`].
pub const DEFAULT_REGION: &str = "us-west-2";

/// Represents the location of a store (read side) or an output directory
/// (write side).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreLocation {
    /// A directory on the local filesystem.
    Local(PathBuf),
    /// A public S3 bucket, accessed with unsigned requests.
    S3 {
        /// Bucket name without scheme.
        bucket: String,
        /// AWS region the bucket lives in.
        region: String,
    },
}

impl StoreLocation {
    /// Creates a new `StoreLocation` for a local filesystem path.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        StoreLocation::Local(root.into())
    }

    /// Creates a new `StoreLocation` for an S3 bucket.
    pub fn s3(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        StoreLocation::S3 {
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// Parse a store location string.
    ///
    /// - `s3://bucket` (optionally with a trailing `/`) and bare bucket names
    ///   map to [`StoreLocation::S3`] in [`DEFAULT_REGION`].
    /// - `file://<path>`, absolute paths, and paths starting with `.` or
    ///   containing a path separator map to [`StoreLocation::Local`].
    pub fn parse(input: &str) -> StorageResult<StoreLocation> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return InvalidLocationSnafu {
                input,
                reason: "store location is empty",
            }
            .fail();
        }

        if let Some(rest) = trimmed.strip_prefix("s3://") {
            let bucket = rest.trim_end_matches('/');
            if bucket.contains('/') {
                return InvalidLocationSnafu {
                    input,
                    reason: "bucket prefixes are not supported; pass the bucket root",
                }
                .fail();
            }
            validate_bucket_name(input, bucket)?;
            return Ok(StoreLocation::s3(bucket, DEFAULT_REGION));
        }

        if let Some(rest) = trimmed.strip_prefix("file://") {
            return Ok(StoreLocation::local(rest));
        }

        if trimmed.contains("://") {
            return InvalidLocationSnafu {
                input,
                reason: "unsupported scheme (expected s3:// or file://)",
            }
            .fail();
        }

        if trimmed.starts_with('.')
            || trimmed.contains('/')
            || trimmed.contains(std::path::MAIN_SEPARATOR)
        {
            return Ok(StoreLocation::local(trimmed));
        }

        validate_bucket_name(input, trimmed)?;
        Ok(StoreLocation::s3(trimmed, DEFAULT_REGION))
    }

    /// Replace the region of an S3 location; local locations are returned
    /// unchanged.
    pub fn with_region(self, region: impl Into<String>) -> Self {
        match self {
            StoreLocation::S3 { bucket, .. } => StoreLocation::S3 {
                bucket,
                region: region.into(),
            },
            local => local,
        }
    }

    /// Fully qualified form of `key` under this location.
    ///
    /// S3 keys become `s3://{bucket}/{key}`; local keys are joined onto the
    /// root directory.
    pub fn qualify(&self, key: &ObjectPath) -> String {
        match self {
            StoreLocation::Local(root) => root.join(key.as_ref()).display().to_string(),
            StoreLocation::S3 { bucket, .. } => format!("s3://{bucket}/{key}"),
        }
    }

    /// Display form of a filesystem-relative path under this location.
    pub fn display_path(&self, rel: &Path) -> String {
        match self {
            StoreLocation::Local(root) => root.join(rel).display().to_string(),
            StoreLocation::S3 { bucket, .. } => format!("s3://{bucket}/{}", rel.display()),
        }
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreLocation::Local(root) => write!(f, "{}", root.display()),
            StoreLocation::S3 { bucket, .. } => write!(f, "s3://{bucket}"),
        }
    }
}

fn validate_bucket_name(input: &str, bucket: &str) -> StorageResult<()> {
    let valid = (3..=63).contains(&bucket.len())
        && bucket
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
        && !bucket.starts_with(['-', '.'])
        && !bucket.ends_with(['-', '.']);

    ensure!(
        valid,
        InvalidLocationSnafu {
            input,
            reason: format!("'{bucket}' is not a valid bucket name"),
        }
    );
    Ok(())
}

/// Read-only handle over a store.
///
/// Keys passed to and returned from a `Store` are relative to the store root
/// (the bucket for S3, the directory for local stores).
#[derive(Clone, Debug)]
pub struct Store {
    location: StoreLocation,
    inner: Arc<dyn ObjectStore>,
}

impl Store {
    /// Open a store client for `location`.
    ///
    /// S3 clients skip request signing so that public buckets can be read
    /// without credentials.
    pub fn open(location: StoreLocation) -> StorageResult<Store> {
        let inner: Arc<dyn ObjectStore> = match &location {
            StoreLocation::Local(root) => Arc::new(
                LocalFileSystem::new_with_prefix(root).context(error::OpenStoreSnafu {
                    location: location.to_string(),
                })?,
            ),
            StoreLocation::S3 { bucket, region } => Arc::new(
                AmazonS3Builder::new()
                    .with_bucket_name(bucket)
                    .with_region(region)
                    .with_skip_signature(true)
                    .build()
                    .context(error::OpenStoreSnafu {
                        location: location.to_string(),
                    })?,
            ),
        };

        Ok(Store { location, inner })
    }

    /// Wrap an already-constructed object store client.
    ///
    /// `location` is only used to qualify paths and for messages.
    pub fn from_object_store(location: StoreLocation, inner: Arc<dyn ObjectStore>) -> Store {
        Store { location, inner }
    }

    /// The location this store was opened on.
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Fully qualified form of `key` (see [`StoreLocation::qualify`]).
    pub fn qualify(&self, key: &ObjectPath) -> String {
        self.location.qualify(key)
    }

    /// The underlying object store client.
    pub(crate) fn object_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.inner)
    }

    /// Fetch the full contents of the object at `key`.
    ///
    /// A missing object yields [`StorageError::NotFound`].
    pub async fn read_bytes(&self, key: &ObjectPath) -> StorageResult<Bytes> {
        let result = self
            .inner
            .get(key)
            .await
            .map_err(|e| error::from_object_store(self.qualify(key), e))?;

        result
            .bytes()
            .await
            .map_err(|e| error::from_object_store(self.qualify(key), e))
    }

    /// Like [`Store::read_bytes`], but a missing object yields `Ok(None)`.
    pub async fn read_optional(&self, key: &ObjectPath) -> StorageResult<Option<Bytes>> {
        match self.read_bytes(key).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Join a location with a relative path into a local path.
fn join_local(location: &StoreLocation, rel: &Path) -> StorageResult<PathBuf> {
    match location {
        StoreLocation::Local(root) => Ok(root.join(rel)),
        StoreLocation::S3 { .. } => UnsupportedSnafu {
            operation: "local write",
            location: location.to_string(),
        }
        .fail(),
    }
}

async fn create_parent_dir(abs: &Path) -> StorageResult<()> {
    if let Some(parent) = abs.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: parent.display().to_string(),
            })?;
    }
    Ok(())
}

/// Temporary sibling path used while replacing `abs`.
fn temp_path_for(abs: &Path) -> PathBuf {
    let mut name = abs
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    abs.with_file_name(name)
}

/// Guard that removes a temporary file on drop unless disarmed.
/// Used to ensure cleanup on error paths during atomic writes.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Disarm the guard so the file is NOT removed on drop.
    /// Call this after a successful rename.
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            // Best-effort cleanup; we are already on an error path.
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Write `contents` to `rel_path` inside `location` using an atomic write.
///
/// This performs a write-then-rename sequence on the local filesystem:
/// it writes the payload to a temporary file next to the target path,
/// syncs the file, and then renames it into place. An interrupted run leaves
/// either the previous file or the new one, never a truncated mix.
///
/// # Errors
///
/// Returns `StorageError::OtherIo` when filesystem I/O fails and
/// `StorageError::Unsupported` for non-local locations.
pub async fn write_atomic(
    location: &StoreLocation,
    rel_path: &Path,
    contents: &[u8],
) -> StorageResult<()> {
    let abs = join_local(location, rel_path)?;
    create_parent_dir(&abs).await?;

    let tmp_path = temp_path_for(&abs);
    let mut guard = TempFileGuard::new(tmp_path.clone());

    {
        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: tmp_path.display().to_string(),
            })?;

        file.write_all(contents)
            .await
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: tmp_path.display().to_string(),
            })?;

        file.sync_all()
            .await
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: tmp_path.display().to_string(),
            })?;
    }

    fs::rename(&tmp_path, &abs)
        .await
        .map_err(BackendError::Local)
        .context(OtherIoSnafu {
            path: abs.display().to_string(),
        })?;

    guard.disarm();
    Ok(())
}

/// Read the file at `rel_path` within the given local `location` and return
/// its contents as a `String`.
///
/// A missing file yields `StorageError::NotFound`; other filesystem problems
/// produce `StorageError::OtherIo`.
pub async fn read_to_string(location: &StoreLocation, rel_path: &Path) -> StorageResult<String> {
    let abs = join_local(location, rel_path)?;

    match fs::read_to_string(&abs).await {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(BackendError::Local(e)).context(error::NotFoundSnafu {
                path: abs.display().to_string(),
            })
        }
        Err(e) => Err(BackendError::Local(e)).context(OtherIoSnafu {
            path: abs.display().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::{PutPayload, memory::InMemory};
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_s3_forms() -> TestResult {
        assert_eq!(
            StoreLocation::parse("s3://ncar-cesm-lens")?,
            StoreLocation::s3("ncar-cesm-lens", DEFAULT_REGION)
        );
        assert_eq!(
            StoreLocation::parse("s3://ncar-cesm-lens/")?,
            StoreLocation::s3("ncar-cesm-lens", DEFAULT_REGION)
        );
        assert_eq!(
            StoreLocation::parse("ncar-cesm-lens")?,
            StoreLocation::s3("ncar-cesm-lens", DEFAULT_REGION)
        );
        Ok(())
    }

    #[test]
    fn parse_local_forms() -> TestResult {
        assert_eq!(
            StoreLocation::parse("file:///data/lens")?,
            StoreLocation::local("/data/lens")
        );
        assert_eq!(
            StoreLocation::parse("./fixtures")?,
            StoreLocation::local("./fixtures")
        );
        assert_eq!(
            StoreLocation::parse("/tmp/bucket")?,
            StoreLocation::local("/tmp/bucket")
        );
        Ok(())
    }

    #[test]
    fn parse_rejects_bad_specs() {
        for input in ["", "   ", "gs://bucket", "s3://bucket/prefix", "Not_A_Bucket"] {
            let err = StoreLocation::parse(input).expect_err(input);
            assert!(
                matches!(err, StorageError::InvalidLocation { .. }),
                "{input}: {err}"
            );
        }
    }

    #[test]
    fn with_region_only_touches_s3() {
        let s3 = StoreLocation::s3("ncar-cesm-lens", DEFAULT_REGION).with_region("us-east-1");
        assert_eq!(s3, StoreLocation::s3("ncar-cesm-lens", "us-east-1"));

        let local = StoreLocation::local("/tmp/x").with_region("us-east-1");
        assert_eq!(local, StoreLocation::local("/tmp/x"));
    }

    #[test]
    fn qualify_paths() {
        let key = ObjectPath::from("ocn/monthly/cesmLE-HIST-SST.zarr");
        let s3 = StoreLocation::s3("ncar-cesm-lens", DEFAULT_REGION);
        assert_eq!(
            s3.qualify(&key),
            "s3://ncar-cesm-lens/ocn/monthly/cesmLE-HIST-SST.zarr"
        );

        let local = StoreLocation::local("/data");
        assert_eq!(
            local.qualify(&key),
            Path::new("/data")
                .join("ocn/monthly/cesmLE-HIST-SST.zarr")
                .display()
                .to_string()
        );
    }

    #[tokio::test]
    async fn read_optional_maps_missing_to_none() -> TestResult {
        let mem = Arc::new(InMemory::new());
        mem.put(&ObjectPath::from("a/b"), PutPayload::from_static(b"xyz"))
            .await?;
        let store = Store::from_object_store(StoreLocation::s3("test-bucket", DEFAULT_REGION), mem);

        let present = store.read_optional(&ObjectPath::from("a/b")).await?;
        assert_eq!(present.as_deref(), Some(&b"xyz"[..]));

        let missing = store.read_optional(&ObjectPath::from("a/c")).await?;
        assert!(missing.is_none());

        let err = store
            .read_bytes(&ObjectPath::from("a/c"))
            .await
            .expect_err("expected NotFound");
        assert!(err.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn write_atomic_creates_file_with_contents() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StoreLocation::local(tmp.path());
        let rel_path = Path::new("catalog.csv");

        write_atomic(&location, rel_path, b"variable\n").await?;

        let read_back = tokio::fs::read_to_string(tmp.path().join(rel_path)).await?;
        assert_eq!(read_back, "variable\n");
        Ok(())
    }

    #[tokio::test]
    async fn write_atomic_overwrites_and_leaves_no_tmp() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StoreLocation::local(tmp.path());
        let rel_path = Path::new("nested/sidecar.json");

        write_atomic(&location, rel_path, b"original").await?;
        write_atomic(&location, rel_path, b"updated").await?;

        let read_back = read_to_string(&location, rel_path).await?;
        assert_eq!(read_back, "updated");
        assert!(!tmp.path().join("nested/sidecar.json.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn read_to_string_returns_not_found_for_missing_file() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StoreLocation::local(tmp.path());

        let err = read_to_string(&location, Path::new("does_not_exist.json"))
            .await
            .expect_err("expected NotFound error");
        assert!(matches!(err, StorageError::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn local_writes_reject_s3_locations() {
        let location = StoreLocation::s3("ncar-cesm-lens", DEFAULT_REGION);
        let err = write_atomic(&location, Path::new("x.csv"), b"")
            .await
            .expect_err("expected Unsupported");
        assert!(matches!(err, StorageError::Unsupported { .. }));
    }
}
