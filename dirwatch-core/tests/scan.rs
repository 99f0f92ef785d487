use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dirwatch_core::scan::TreeScanner;
use dirwatch_core::{
    CatalogRepository, DirwatchError, FileRecord, FileStatus, InMemoryCatalog, Reconciler,
    Result, WatchSettings,
};

/// Fails every lookup of one file name; everything else goes to memory.
#[derive(Debug, Default)]
struct PoisonedName {
    inner: InMemoryCatalog,
}

const POISONED: &str = "poisoned.txt";

#[async_trait]
impl CatalogRepository for PoisonedName {
    async fn exists(&self, name: &str) -> Result<bool> {
        self.inner.exists(name).await
    }

    async fn find(&self, name: &str) -> Result<Option<FileRecord>> {
        if name.ends_with(POISONED) {
            return Err(DirwatchError::InvalidRecord(format!("corrupt row for {name}")));
        }
        self.inner.find(name).await
    }

    async fn insert(&self, name: &str, count: i64) -> Result<Option<FileRecord>> {
        self.inner.insert(name, count).await
    }

    async fn update_status(&self, name: &str, status: FileStatus, count: i64) -> Result<bool> {
        self.inner.update_status(name, status, count).await
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        self.inner.list().await
    }
}

#[tokio::test]
async fn one_cycle_catalogs_exactly_the_matching_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("a"), "magic xx magic")?;
    std::fs::write(dir.path().join("b"), "nothing to see")?;
    std::fs::create_dir_all(dir.path().join("sub/deeper"))?;
    std::fs::write(dir.path().join("sub/deeper/c"), "a magic word")?;

    let catalog = Arc::new(InMemoryCatalog::new());
    let scanner = TreeScanner::new(Arc::new(Reconciler::new(catalog.clone())));
    let settings = WatchSettings::new(dir.path(), "magic", Duration::from_secs(5));

    let summary = scanner.scan_once(&settings).await?;
    assert_eq!(summary.visited, 3);
    assert_eq!(summary.failed, 0);

    let root = dir.path().canonicalize()?;
    let mut records = catalog.list().await?;
    records.sort_by(|a, b| a.name.cmp(&b.name));
    let observed: Vec<_> = records
        .iter()
        .map(|record| (record.name.clone(), record.magic_word_count, record.status))
        .collect();
    assert_eq!(
        observed,
        vec![
            (root.join("a").to_string_lossy().into_owned(), 2, FileStatus::Active),
            (
                root.join("sub/deeper/c").to_string_lossy().into_owned(),
                1,
                FileStatus::Active
            ),
        ]
    );

    // Idempotent: a second pass over an unchanged tree creates nothing.
    let again = scanner.scan_once(&settings).await?;
    assert_eq!(again.created, 0);
    assert_eq!(again.updated, 2);
    assert_eq!(catalog.len(), 2);
    Ok(())
}

#[tokio::test]
async fn file_that_loses_the_word_is_marked_deleted() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let kept = dir.path().join("kept.txt");
    std::fs::write(&kept, "magic")?;

    let catalog = Arc::new(InMemoryCatalog::new());
    let scanner = TreeScanner::new(Arc::new(Reconciler::new(catalog.clone())));
    let settings = WatchSettings::new(dir.path(), "magic", Duration::from_secs(5));
    scanner.scan_once(&settings).await?;

    std::fs::write(&kept, "no longer")?;
    let summary = scanner.scan_once(&settings).await?;

    assert_eq!(summary.marked_deleted, 1);
    let record = catalog.list().await?.remove(0);
    assert_eq!(record.status, FileStatus::Deleted);
    Ok(())
}

#[tokio::test]
async fn missing_root_is_a_traversal_error() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(InMemoryCatalog::new());
    let scanner = TreeScanner::new(Arc::new(Reconciler::new(catalog)));
    let settings = WatchSettings::new(dir.path().join("nope"), "magic", Duration::from_secs(5));

    let err = scanner.scan_once(&settings).await.unwrap_err();
    assert!(matches!(err, DirwatchError::Traversal { .. }));
}

#[tokio::test]
async fn storage_failure_on_one_file_does_not_stop_the_cycle() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("a.txt"), "magic")?;
    std::fs::write(dir.path().join(POISONED), "magic")?;
    std::fs::write(dir.path().join("z.txt"), "magic magic")?;

    let catalog = Arc::new(PoisonedName::default());
    let scanner = TreeScanner::new(Arc::new(Reconciler::new(catalog.clone())));
    let settings = WatchSettings::new(dir.path(), "magic", Duration::from_secs(5));

    let summary = scanner.scan_once(&settings).await?;
    assert_eq!(summary.visited, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.created, 2);

    let names: Vec<_> = catalog.list().await?.into_iter().map(|r| r.name).collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|name| !name.ends_with(POISONED)));
    Ok(())
}

#[cfg(unix)]
mod permissions {
    use std::fs::{self, Permissions};
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    #[tokio::test]
    async fn unreadable_file_is_skipped() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let locked = dir.path().join("locked.txt");
        fs::write(&locked, "magic")?;
        fs::write(dir.path().join("open.txt"), "magic")?;
        fs::set_permissions(&locked, Permissions::from_mode(0o000))?;
        if fs::read(&locked).is_ok() {
            // Privileged user; permission bits are not enforced.
            return Ok(());
        }

        let catalog = Arc::new(InMemoryCatalog::new());
        let scanner = TreeScanner::new(Arc::new(Reconciler::new(catalog.clone())));
        let settings = WatchSettings::new(dir.path(), "magic", Duration::from_secs(5));
        let summary = scanner.scan_once(&settings).await;
        fs::set_permissions(&locked, Permissions::from_mode(0o644))?;

        let summary = summary?;
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.visited, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(catalog.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn untraversable_subdirectory_aborts_the_cycle() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let locked = dir.path().join("locked");
        fs::create_dir(&locked)?;
        fs::write(locked.join("inner.txt"), "magic")?;
        fs::set_permissions(&locked, Permissions::from_mode(0o000))?;
        if fs::read_dir(&locked).is_ok() {
            return Ok(());
        }

        let catalog = Arc::new(InMemoryCatalog::new());
        let scanner = TreeScanner::new(Arc::new(Reconciler::new(catalog)));
        let settings = WatchSettings::new(dir.path(), "magic", Duration::from_secs(5));
        let result = scanner.scan_once(&settings).await;
        fs::set_permissions(&locked, Permissions::from_mode(0o755))?;

        match result {
            Err(DirwatchError::Traversal { path, .. }) => assert!(path.ends_with("locked")),
            other => panic!("expected a traversal error, got {other:?}"),
        }
        Ok(())
    }
}
