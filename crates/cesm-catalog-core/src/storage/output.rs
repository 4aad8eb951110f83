//! Output sinks for the written catalog.
//!
//! Only local targets are supported. Bytes go to a temporary sibling that is
//! renamed into place on finish.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use snafu::ResultExt;
use tokio::fs;

use crate::storage::{
    BackendError, OtherIoSnafu, StorageResult, StoreLocation, TempFileGuard, create_parent_dir,
    join_local, temp_path_for,
};

/// Local filesystem sink that writes to a temp file and renames on finish.
struct LocalSink {
    tmp_path: PathBuf,
    final_path: PathBuf,
    writer: io::BufWriter<std::fs::File>,
    guard: TempFileGuard,
}

impl LocalSink {
    async fn open(location: &StoreLocation, rel_path: &Path) -> StorageResult<Self> {
        let final_path = join_local(location, rel_path)?;
        create_parent_dir(&final_path).await?;

        let tmp_path = temp_path_for(&final_path);

        // Arrow writers require std::io::Write.
        let file = std::fs::File::create(&tmp_path)
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: tmp_path.display().to_string(),
            })?;

        let writer = io::BufWriter::new(file);
        let guard = TempFileGuard::new(tmp_path.clone());

        Ok(Self {
            tmp_path,
            final_path,
            writer,
            guard,
        })
    }

    async fn finish(mut self) -> StorageResult<()> {
        self.writer
            .flush()
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: self.tmp_path.display().to_string(),
            })?;

        self.writer
            .get_ref()
            .sync_all()
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: self.tmp_path.display().to_string(),
            })?;

        fs::rename(&self.tmp_path, &self.final_path)
            .await
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: self.final_path.display().to_string(),
            })?;

        self.guard.disarm();
        Ok(())
    }
}

/// A streaming output sink for writing bytes to a local file.
///
/// Callers obtain a sink via [`open_output_sink`] and stream bytes through it
/// (it implements [`Write`]). Nothing becomes visible at the target path until
/// [`OutputSink::finish`] renames the temp file into place; dropping an
/// unfinished sink removes the temp file.
pub struct OutputSink {
    inner: LocalSink,
}

impl OutputSink {
    /// Flush, fsync, and commit to the final location.
    pub async fn finish(self) -> StorageResult<()> {
        self.inner.finish().await
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.writer.flush()
    }
}

/// Open a streaming output sink at `location` + `rel_path`.
///
/// Only [`StoreLocation::Local`] is supported; S3 locations are rejected with
/// `StorageError::Unsupported`.
pub async fn open_output_sink(
    location: &StoreLocation,
    rel_path: &Path,
) -> StorageResult<OutputSink> {
    let inner = LocalSink::open(location, rel_path).await?;
    Ok(OutputSink { inner })
}
