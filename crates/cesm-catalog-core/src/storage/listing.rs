//! Directory-style listing over a flat object namespace.
//!
//! Object stores have no real directories: a "directory" is a common key
//! prefix, and some writers also leave a zero-byte placeholder object whose
//! key equals the prefix itself. Listing clients that surface that placeholder
//! report the directory as its own first child. Rather than dropping the first
//! listed entry positionally, callers filter children through
//! [`is_listing_self_entry`].

use object_store::path::Path as ObjectPath;

use crate::storage::{Store, StorageResult, error::from_object_store};

/// Returns true when `child` is the listed directory itself rather than one of
/// its children.
///
/// This covers the placeholder object (`key == prefix`) and, for the store
/// root, an empty key.
pub fn is_listing_self_entry(parent: &ObjectPath, child: &ObjectPath) -> bool {
    child.as_ref().is_empty() || child == parent
}

/// Final segment of a key (`ocn/monthly` → `monthly`).
pub fn last_segment(key: &ObjectPath) -> Option<&str> {
    key.as_ref().rsplit('/').next().filter(|s| !s.is_empty())
}

impl Store {
    /// List the sub-prefixes ("directories") of `dir`, sorted by key.
    ///
    /// Plain objects directly under `dir` are left out, so a stray file never
    /// shows up where a directory is expected.
    pub async fn list_subdirs(&self, dir: &ObjectPath) -> StorageResult<Vec<ObjectPath>> {
        let prefix = (!dir.as_ref().is_empty()).then_some(dir);

        let listing = self
            .inner
            .list_with_delimiter(prefix)
            .await
            .map_err(|e| from_object_store(self.qualify(dir), e))?;

        let mut dirs: Vec<ObjectPath> = listing
            .common_prefixes
            .into_iter()
            .filter(|child| !is_listing_self_entry(dir, child))
            .collect();
        dirs.sort();
        Ok(dirs)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use object_store::{ObjectStore, PutPayload, memory::InMemory};

    use super::*;
    use crate::storage::{DEFAULT_REGION, StoreLocation};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn self_entry_predicate() {
        let parent = ObjectPath::from("atm/monthly");
        assert!(is_listing_self_entry(&parent, &ObjectPath::from("atm/monthly")));
        assert!(is_listing_self_entry(&parent, &ObjectPath::from("")));
        assert!(!is_listing_self_entry(
            &parent,
            &ObjectPath::from("atm/monthly/cesmLE-HIST-TS.zarr")
        ));
    }

    #[test]
    fn last_segment_of_keys() {
        assert_eq!(last_segment(&ObjectPath::from("ocn/monthly")), Some("monthly"));
        assert_eq!(last_segment(&ObjectPath::from("ocn")), Some("ocn"));
        assert_eq!(last_segment(&ObjectPath::from("")), None);
    }

    #[tokio::test]
    async fn list_subdirs_drops_placeholder_and_sorts() -> TestResult {
        let mem = Arc::new(InMemory::new());
        for key in [
            "ocn/monthly",
            "ocn/monthly/b-HIST-SST.zarr/.zmetadata",
            "ocn/monthly/a-HIST-SSH.zarr/.zmetadata",
            "ocn/monthly/README",
        ] {
            mem.put(&ObjectPath::from(key), PutPayload::from_static(b"{}"))
                .await?;
        }
        let store = Store::from_object_store(StoreLocation::s3("test-bucket", DEFAULT_REGION), mem);

        let children = store.list_subdirs(&ObjectPath::from("ocn/monthly")).await?;
        let keys: Vec<&str> = children.iter().map(|p| p.as_ref()).collect();
        assert_eq!(
            keys,
            vec!["ocn/monthly/a-HIST-SSH.zarr", "ocn/monthly/b-HIST-SST.zarr"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn list_subdirs_of_root() -> TestResult {
        let mem = Arc::new(InMemory::new());
        for key in ["atm/daily/x.zarr/.zattrs", "ocn/monthly/y.zarr/.zattrs"] {
            mem.put(&ObjectPath::from(key), PutPayload::from_static(b"{}"))
                .await?;
        }
        let store = Store::from_object_store(StoreLocation::s3("test-bucket", DEFAULT_REGION), mem);

        let children = store.list_subdirs(&ObjectPath::default()).await?;
        let names: Vec<&str> = children.iter().filter_map(last_segment).collect();
        assert_eq!(names, vec!["atm", "ocn"]);
        Ok(())
    }

    #[tokio::test]
    async fn list_subdirs_skips_plain_objects() -> TestResult {
        let mem = Arc::new(InMemory::new());
        for key in [
            "ocn/monthly",
            "ocn/monthly/notes-HIST-SST.txt",
            "ocn/monthly/b-HIST-SST.zarr/.zmetadata",
            "ocn/monthly/a-HIST-SSH.zarr/time/0",
        ] {
            mem.put(&ObjectPath::from(key), PutPayload::from_static(b"{}"))
                .await?;
        }
        let store = Store::from_object_store(StoreLocation::s3("test-bucket", DEFAULT_REGION), mem);

        let dirs = store.list_subdirs(&ObjectPath::from("ocn/monthly")).await?;
        let names: Vec<&str> = dirs.iter().filter_map(last_segment).collect();
        assert_eq!(names, vec!["a-HIST-SSH.zarr", "b-HIST-SST.zarr"]);
        Ok(())
    }
}
