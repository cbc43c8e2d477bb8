// src/storage/migrate.rs

//! Conversion of the flat legacy layout into one directory per collection.
//!
//! ```text
//! {root}/AZ-900.json             -> {root}/AZ-900/exam.json
//! {root}/AZ-900_links.json       -> {root}/AZ-900/links.json
//! {root}/AZ-900_metadata.json    -> {root}/AZ-900/metadata.json
//! {root}/AZ-900_chunk_0.json     -> {root}/AZ-900/chunks/chunk_0.json
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::storage::LocalStorage;
use crate::storage::local::{
    CHUNKS_DIR, COLLECTION_FILE, LINKS_FILE, MANIFEST_FILE, METADATA_FILE, UPDATE_LOG_FILE,
};

const LEGACY_LINKS_SUFFIX: &str = "_links.json";
const LEGACY_METADATA_SUFFIX: &str = "_metadata.json";
const LEGACY_CHUNK_MARKER: &str = "_chunk_";

/// One file relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct Migration {
    /// Collection codes found in the flat layout
    pub codes: Vec<String>,
    /// Files moved, or that would be moved in a dry run
    pub moved: Vec<Move>,
    /// Files left in place because the target already exists
    pub conflicts: Vec<Move>,
}

impl LocalStorage {
    /// Move flat `{code}*.json` files into per-collection directories.
    ///
    /// Existing targets are never overwritten. With `dry_run` nothing is
    /// touched and the report lists the planned moves.
    pub async fn migrate_flat_layout(&self, only: Option<&str>, dry_run: bool) -> Result<Migration> {
        let names = self.root_json_files().await?;
        let codes: Vec<String> = match only {
            Some(code) => vec![code.to_string()],
            None => legacy_codes(&names).into_iter().collect(),
        };

        let mut migration = Migration {
            codes: codes.clone(),
            ..Migration::default()
        };
        for code in &codes {
            for (name, to) in self.legacy_moves(code, &names) {
                let step = Move {
                    from: self.root().join(name),
                    to,
                };
                if tokio::fs::try_exists(&step.to).await.unwrap_or(false) {
                    log::warn!(
                        "Not moving {}: {} already exists",
                        step.from.display(),
                        step.to.display()
                    );
                    migration.conflicts.push(step);
                    continue;
                }
                if dry_run {
                    log::info!("Would move {} -> {}", step.from.display(), step.to.display());
                } else {
                    if let Some(parent) = step.to.parent() {
                        tokio::fs::create_dir_all(parent)
                            .await
                            .map_err(|e| AppError::storage(parent, e))?;
                    }
                    tokio::fs::rename(&step.from, &step.to)
                        .await
                        .map_err(|e| AppError::storage(&step.from, e))?;
                    log::info!("Moved {} -> {}", step.from.display(), step.to.display());
                }
                migration.moved.push(step);
            }
        }
        Ok(migration)
    }

    async fn root_json_files(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(self.root()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::storage(self.root(), e)),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(".json") && name != MANIFEST_FILE && name != UPDATE_LOG_FILE {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn legacy_moves<'a>(&self, code: &str, names: &'a [String]) -> Vec<(&'a str, PathBuf)> {
        let dir = self.collection_dir(code);
        let chunk_prefix = format!("{code}{LEGACY_CHUNK_MARKER}");
        names
            .iter()
            .filter_map(|name| {
                let to = if *name == format!("{code}.json") {
                    dir.join(COLLECTION_FILE)
                } else if *name == format!("{code}{LEGACY_LINKS_SUFFIX}") {
                    dir.join(LINKS_FILE)
                } else if *name == format!("{code}{LEGACY_METADATA_SUFFIX}") {
                    dir.join(METADATA_FILE)
                } else {
                    let index = name.strip_prefix(&chunk_prefix)?.strip_suffix(".json")?;
                    dir.join(CHUNKS_DIR).join(format!("chunk_{index}.json"))
                };
                Some((name.as_str(), to))
            })
            .collect()
    }
}

/// Collection codes named by flat-layout files.
fn legacy_codes(names: &[String]) -> BTreeSet<String> {
    names
        .iter()
        .filter(|name| !name.contains(LEGACY_CHUNK_MARKER))
        .filter_map(|name| {
            name.strip_suffix(LEGACY_LINKS_SUFFIX)
                .or_else(|| name.strip_suffix(LEGACY_METADATA_SUFFIX))
                .or_else(|| name.strip_suffix(".json"))
        })
        .map(str::to_string)
        .collect()
}
