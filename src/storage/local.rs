//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── manifest.json
//! ├── update_log.json
//! └── {code}/
//!     ├── links.json
//!     ├── exam.json
//!     ├── metadata.json
//!     └── chunks/chunk_{n}.json
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{BatchSummary, Chunk, ChunkMetadata, Collection, LinkSet, Manifest};
use crate::storage::CollectionStorage;

pub(super) const LINKS_FILE: &str = "links.json";
const LINKS_CHECKPOINT_FILE: &str = "links.partial.json";
pub(super) const COLLECTION_FILE: &str = "exam.json";
pub(super) const METADATA_FILE: &str = "metadata.json";
pub(super) const CHUNKS_DIR: &str = "chunks";
pub(super) const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_BACKUP_FILE: &str = "manifest.json.backup";
pub(super) const UPDATE_LOG_FILE: &str = "update_log.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Directory of one collection.
    pub fn collection_dir(&self, code: &str) -> PathBuf {
        self.root_dir.join(code)
    }

    fn collection_path(&self, code: &str, file: &str) -> PathBuf {
        self.collection_dir(code).join(file)
    }

    fn chunk_path(&self, code: &str, index: usize) -> PathBuf {
        self.collection_path(code, CHUNKS_DIR)
            .join(format!("chunk_{index}.json"))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::storage(parent, e))?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&tmp, path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::storage(path, e));
        }
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(path, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::storage(path, e)),
        }
    }

    /// Read JSON data. Undecodable content is a storage error naming the file.
    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match self.read_bytes(path).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| AppError::storage(path, e)),
            None => Ok(None),
        }
    }

    async fn remove_file(&self, path: &Path) -> Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::storage(path, e)),
        }
    }
}

fn parse_chunk_index(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix("chunk_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

#[async_trait]
impl CollectionStorage for LocalStorage {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::storage(&self.root_dir, e)),
        };

        let mut codes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_dir() || !path.join(COLLECTION_FILE).is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                codes.push(name.to_string());
            }
        }
        codes.sort();
        Ok(codes)
    }

    async fn load_links(&self, code: &str) -> Result<Option<LinkSet>> {
        self.read_json(&self.collection_path(code, LINKS_FILE)).await
    }

    async fn save_links(&self, code: &str, links: &LinkSet) -> Result<()> {
        self.write_json(&self.collection_path(code, LINKS_FILE), links)
            .await?;
        self.clear_link_checkpoint(code).await
    }

    async fn load_link_checkpoint(&self, code: &str) -> Result<Option<LinkSet>> {
        self.read_json(&self.collection_path(code, LINKS_CHECKPOINT_FILE))
            .await
    }

    async fn save_link_checkpoint(&self, code: &str, links: &LinkSet) -> Result<()> {
        self.write_json(&self.collection_path(code, LINKS_CHECKPOINT_FILE), links)
            .await
    }

    async fn clear_link_checkpoint(&self, code: &str) -> Result<()> {
        self.remove_file(&self.collection_path(code, LINKS_CHECKPOINT_FILE))
            .await?;
        Ok(())
    }

    async fn load_collection(&self, code: &str) -> Result<Option<Collection>> {
        self.read_json(&self.collection_path(code, COLLECTION_FILE))
            .await
    }

    async fn save_collection(&self, code: &str, collection: &Collection) -> Result<()> {
        self.write_json(&self.collection_path(code, COLLECTION_FILE), collection)
            .await
    }

    async fn collection_modified(&self, code: &str) -> Result<Option<DateTime<Utc>>> {
        let path = self.collection_path(code, COLLECTION_FILE);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => {
                let modified = meta.modified().map_err(|e| AppError::storage(&path, e))?;
                Ok(Some(DateTime::<Utc>::from(modified)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::storage(&path, e)),
        }
    }

    async fn write_chunk(&self, code: &str, chunk: &Chunk<'_>) -> Result<()> {
        self.write_json(&self.chunk_path(code, chunk.index), chunk)
            .await
    }

    async fn load_chunk(&self, code: &str, index: usize) -> Result<Option<Chunk<'static>>> {
        self.read_json(&self.chunk_path(code, index)).await
    }

    async fn chunk_indices(&self, code: &str) -> Result<Vec<usize>> {
        let dir = self.collection_path(code, CHUNKS_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::storage(&dir, e)),
        };

        let mut indices = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(index) = entry.file_name().to_str().and_then(parse_chunk_index) {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }

    async fn remove_chunk(&self, code: &str, index: usize) -> Result<()> {
        self.remove_file(&self.chunk_path(code, index)).await?;
        Ok(())
    }

    async fn load_chunk_metadata(&self, code: &str) -> Result<Option<ChunkMetadata>> {
        self.read_json(&self.collection_path(code, METADATA_FILE))
            .await
    }

    async fn save_chunk_metadata(&self, code: &str, metadata: &ChunkMetadata) -> Result<()> {
        self.write_json(&self.collection_path(code, METADATA_FILE), metadata)
            .await
    }

    async fn remove_chunks(&self, code: &str) -> Result<bool> {
        let dir = self.collection_path(code, CHUNKS_DIR);
        let removed_dir = match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(AppError::storage(&dir, e)),
        };
        let removed_meta = self
            .remove_file(&self.collection_path(code, METADATA_FILE))
            .await?;
        Ok(removed_dir || removed_meta)
    }

    async fn load_manifest(&self) -> Result<Option<Manifest>> {
        self.read_json(&self.root_dir.join(MANIFEST_FILE)).await
    }

    async fn save_manifest(&self, manifest: &Manifest) -> Result<()> {
        let path = self.root_dir.join(MANIFEST_FILE);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let backup = self.root_dir.join(MANIFEST_BACKUP_FILE);
            tokio::fs::copy(&path, &backup)
                .await
                .map_err(|e| AppError::storage(&backup, e))?;
            log::info!("Backed up previous manifest to {}", backup.display());
        }
        self.write_json(&path, manifest).await
    }

    async fn save_update_log(&self, summary: &BatchSummary) -> Result<()> {
        self.write_json(&self.root_dir.join(UPDATE_LOG_FILE), summary)
            .await
    }
}
