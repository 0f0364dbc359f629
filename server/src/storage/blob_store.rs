//! Name-addressed blob storage
//!
//! Stores binary data (user images) under caller-chosen names on a disk.
//! A name is a single path component; anything that could escape the disk
//! root is rejected.
//!
//! Example: name "aB3...x9.png" on the public disk is stored at "public/aB3...x9.png"

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Binary object storage keyed by filename
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write data under `name`, replacing any existing blob
    async fn put(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Read the blob stored under `name`
    async fn get(&self, name: &str) -> Result<Vec<u8>>;

    /// Check if a blob exists
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Delete a blob. Deleting a missing blob is not an error.
    async fn delete(&self, name: &str) -> Result<()>;
}

/// A name is valid when it is a single, non-empty path component
pub fn is_valid_name(name: &str) -> bool {
    !(name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']))
}

/// Reject names that could address something outside the disk root
fn check_name(name: &str) -> Result<()> {
    if !is_valid_name(name) {
        return Err(AppError::BlobStore(format!("Invalid blob name: {:?}", name)));
    }

    Ok(())
}

/// Blob store backed by a directory on the local filesystem
#[derive(Clone)]
pub struct DiskBlobStore {
    root: PathBuf,
}

impl DiskBlobStore {
    /// Create a new blob store at the given root directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Initialize the blob store (create directory if needed)
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Blob store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Get file path for a name
    fn get_path(&self, name: &str) -> Result<PathBuf> {
        check_name(name)?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn put(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.get_path(name)?;

        // Write to temp file first (atomic write)
        let temp_path = self.root.join(format!("{}.tmp", name));
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        fs::rename(temp_path, &path).await?;

        tracing::debug!("Wrote blob: {} ({} bytes)", name, data.len());

        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.get_path(name)?;

        if !fs::try_exists(&path).await? {
            return Err(AppError::BlobNotFound(name.to_string()));
        }

        let mut file = fs::File::open(&path).await?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).await?;

        tracing::debug!("Read blob: {} ({} bytes)", name, data.len());

        Ok(data)
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.get_path(name)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.get_path(name)?;

        if !fs::try_exists(&path).await? {
            return Ok(()); // Already deleted
        }

        fs::remove_file(&path).await?;

        tracing::debug!("Deleted blob: {}", name);

        Ok(())
    }
}

/// In-process blob store, used where a real disk is unnecessary
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.blobs
            .lock()
            .map_err(|_| AppError::BlobStore("Memory blob store lock poisoned".to_string()))
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, name: &str, data: &[u8]) -> Result<()> {
        check_name(name)?;
        self.blobs()?.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>> {
        check_name(name)?;
        self.blobs()?
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::BlobNotFound(name.to_string()))
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        check_name(name)?;
        Ok(self.blobs()?.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        check_name(name)?;
        self.blobs()?.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (DiskBlobStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskBlobStore::new(temp_dir.path().join("public"));
        store.initialize().await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (store, temp) = create_test_store().await;

        store.put("avatar.png", b"Hello, World!").await.unwrap();

        let read_data = store.get("avatar.png").await.unwrap();
        assert_eq!(b"Hello, World!", read_data.as_slice());
        assert!(temp.path().join("public").join("avatar.png").exists());
    }

    #[tokio::test]
    async fn test_put_replaces_existing() {
        let (store, temp) = create_test_store().await;

        store.put("avatar.png", b"first").await.unwrap();
        store.put("avatar.png", b"second").await.unwrap();

        assert_eq!(store.get("avatar.png").await.unwrap(), b"second");
        assert!(!temp.path().join("public").join("avatar.png.tmp").exists());
    }

    #[tokio::test]
    async fn test_exists() {
        let (store, _temp) = create_test_store().await;

        store.put("present.gif", b"Exists test").await.unwrap();

        assert!(store.exists("present.gif").await.unwrap());
        assert!(!store.exists("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _temp) = create_test_store().await;

        store.put("gone.jpg", b"Delete test").await.unwrap();
        assert!(store.exists("gone.jpg").await.unwrap());

        store.delete("gone.jpg").await.unwrap();
        assert!(!store.exists("gone.jpg").await.unwrap());

        // Second delete is a no-op
        store.delete("gone.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn test_get_missing_blob() {
        let (store, _temp) = create_test_store().await;

        let err = store.get("missing.png").await.unwrap_err();
        assert!(matches!(err, AppError::BlobNotFound(_)));
    }

    #[tokio::test]
    async fn test_rejects_escaping_names() {
        let (store, _temp) = create_test_store().await;

        for name in ["", "..", "../secret", "nested/file.png", "back\\slash.png"] {
            assert!(store.put(name, b"x").await.is_err(), "accepted {:?}", name);
            assert!(store.exists(name).await.is_err(), "accepted {:?}", name);
        }
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryBlobStore::new();
        assert!(store.is_empty());

        store.put("a.png", b"data").await.unwrap();
        assert!(store.exists("a.png").await.unwrap());
        assert_eq!(store.get("a.png").await.unwrap(), b"data");
        assert_eq!(store.len(), 1);

        store.delete("a.png").await.unwrap();
        assert!(!store.exists("a.png").await.unwrap());
        assert!(store.get("a.png").await.is_err());
    }
}
