// src/models/mod.rs

//! Domain models for the sync pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod batch;
mod chunk;
mod collection;
mod config;
mod links;
mod manifest;
mod record;
mod selectors;

use serde::{Deserialize, Serialize};

// Re-export all public types
pub use batch::{BatchSummary, RunOutcome, RunStatus};
pub use chunk::{Chunk, ChunkMetadata};
pub use collection::{Collection, Merge};
pub use config::{ChunkingConfig, Config, CrawlerConfig, PathsConfig, SyncConfig};
pub use links::LinkSet;
pub use manifest::{MANIFEST_VERSION, Manifest, ManifestEntry};
pub use record::{Comment, Fetched, ProcessedImage, Record, RecordId};
pub use selectors::PageSelectors;

/// Progress status shared by link sets and collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SyncStatus {
    #[default]
    #[serde(rename = "in progress", alias = "in_progress")]
    InProgress,
    #[serde(rename = "complete")]
    Complete,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "in progress"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Offline verdict on whether a collection needs another sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateCheck {
    pub needed: bool,
    pub reason: String,
}

impl UpdateCheck {
    pub fn needed(reason: impl Into<String>) -> Self {
        Self {
            needed: true,
            reason: reason.into(),
        }
    }

    pub fn up_to_date() -> Self {
        Self {
            needed: false,
            reason: "up to date".to_string(),
        }
    }
}
