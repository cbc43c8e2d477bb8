//! Storage abstractions for collection persistence.
//!
//! ## Directory Structure
//!
//! ```text
//! data/
//! ├── manifest.json             # Index of all collections
//! ├── manifest.json.backup      # Previous manifest
//! ├── update_log.json           # Last batch run summary
//! └── AZ-900/
//!     ├── links.json            # Complete link set
//!     ├── links.partial.json    # Checkpoint while a sweep is running
//!     ├── exam.json             # Collection records
//!     ├── metadata.json         # Chunk layout
//!     └── chunks/
//!         ├── chunk_0.json
//!         └── chunk_1.json
//! ```
//!
//! Every write goes through a temp file and a rename, so a reader never
//! sees a partially written file.

pub mod local;
pub mod migrate;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{BatchSummary, Chunk, ChunkMetadata, Collection, LinkSet, Manifest};

// Re-export for convenience
pub use local::LocalStorage;
pub use migrate::{Migration, Move};

/// Trait for collection storage backends.
#[async_trait]
pub trait CollectionStorage: Send + Sync {
    /// Codes of every collection that has a collection file, sorted.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Load the complete link set.
    async fn load_links(&self, code: &str) -> Result<Option<LinkSet>>;

    /// Persist a complete link set and drop the sweep checkpoint.
    async fn save_links(&self, code: &str, links: &LinkSet) -> Result<()>;

    /// Load the in-progress sweep checkpoint.
    async fn load_link_checkpoint(&self, code: &str) -> Result<Option<LinkSet>>;

    async fn save_link_checkpoint(&self, code: &str, links: &LinkSet) -> Result<()>;

    async fn clear_link_checkpoint(&self, code: &str) -> Result<()>;

    /// Load the collection. A file that exists but cannot be decoded is an error.
    async fn load_collection(&self, code: &str) -> Result<Option<Collection>>;

    async fn save_collection(&self, code: &str, collection: &Collection) -> Result<()>;

    /// Last modification time of the collection file.
    async fn collection_modified(&self, code: &str) -> Result<Option<DateTime<Utc>>>;

    async fn write_chunk(&self, code: &str, chunk: &Chunk<'_>) -> Result<()>;

    async fn load_chunk(&self, code: &str, index: usize) -> Result<Option<Chunk<'static>>>;

    /// Indices of chunk files present on disk, sorted.
    async fn chunk_indices(&self, code: &str) -> Result<Vec<usize>>;

    async fn remove_chunk(&self, code: &str, index: usize) -> Result<()>;

    async fn load_chunk_metadata(&self, code: &str) -> Result<Option<ChunkMetadata>>;

    async fn save_chunk_metadata(&self, code: &str, metadata: &ChunkMetadata) -> Result<()>;

    /// Remove all chunk files and the chunk metadata. Returns whether anything existed.
    async fn remove_chunks(&self, code: &str) -> Result<bool>;

    async fn load_manifest(&self) -> Result<Option<Manifest>>;

    /// Back up the current manifest, then replace it.
    async fn save_manifest(&self, manifest: &Manifest) -> Result<()>;

    async fn save_update_log(&self, summary: &BatchSummary) -> Result<()>;
}
