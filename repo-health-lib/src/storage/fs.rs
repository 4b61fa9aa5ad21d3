use super::ObjectStore;
use super::keys::key_segments;
use crate::Result;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use core::sync::atomic::{AtomicU64, Ordering};
use ohno::{IntoAppError, app_err};
use std::io;
use walkdir::WalkDir;

const LOG_TARGET: &str = "   storage";

/// Distinguishes temp files written concurrently by the same process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Object store backed by a directory tree.
///
/// Each key maps to a file under `root`, with `/` separating directories. Writes go
/// to a hidden temp file first and are renamed into place, so concurrent writers of
/// the same key never expose a partially written object and the last rename wins.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: Utf8PathBuf,
}

impl FsObjectStore {
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> Result<Utf8PathBuf> {
        let mut path = self.root.clone();
        for segment in key_segments(key)? {
            path.push(segment);
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.key_path(key)?;
        let parent = path.parent().into_app_err_with(|| format!("object key '{key}' has no parent directory"))?;
        let file_name = path.file_name().into_app_err_with(|| format!("object key '{key}' has no file name"))?;

        tokio::fs::create_dir_all(parent)
            .await
            .into_app_err_with(|| format!("creating directory '{parent}'"))?;

        let temp = parent.join(format!(
            ".{file_name}.{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        tokio::fs::write(&temp, &bytes)
            .await
            .into_app_err_with(|| format!("writing '{temp}'"))?;

        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e).into_app_err_with(|| format!("moving object into place at '{path}'"));
        }

        log::debug!(target: LOG_TARGET, "Stored {} byte(s) at '{path}'", bytes.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.key_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(app_err!("object '{key}' not found")),
            Err(e) => Err(e).into_app_err_with(|| format!("reading '{path}'")),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = match prefix.rsplit_once('/') {
            Some((dir, _)) => self.key_path(dir)?,
            None => self.root.clone(),
        };

        let root = self.root.clone();
        let prefix = prefix.to_owned();
        tokio::task::spawn_blocking(move || list_keys(&root, &dir, &prefix))
            .await
            .into_app_err("listing task did not complete")?
    }
}

/// Walk `dir` and return the keys of all visible files under it that start with `prefix`.
fn list_keys(root: &Utf8Path, dir: &Utf8Path, prefix: &str) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut keys = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.into_app_err_with(|| format!("walking '{dir}'"))?;
        if !entry.file_type().is_file() || entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root.as_std_path())
            .into_app_err_with(|| format!("'{}' is outside of '{root}'", entry.path().display()))?;

        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if key.starts_with(prefix) {
            keys.push(key);
        }
    }

    keys.sort();
    Ok(keys)
}
