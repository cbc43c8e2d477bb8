// src/models/chunk.rs

//! Chunk files and chunk metadata for lazy loading.

use std::borrow::Cow;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Record;

/// One contiguous slice of a collection (`chunks/chunk_<n>.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk<'a> {
    #[serde(rename = "chunk_id")]
    pub index: usize,

    /// 1-based ordinal of the first record in the chunk
    #[serde(rename = "start_question")]
    pub start_ordinal: usize,

    /// 1-based ordinal of the last record in the chunk
    #[serde(rename = "end_question")]
    pub end_ordinal: usize,

    #[serde(rename = "questions_count")]
    pub count: usize,

    pub questions: Cow<'a, [Record]>,
}

/// Describes the chunk layout of one collection (`metadata.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub exam_code: String,
    pub exam_name: String,
    pub chunked: bool,
    pub chunk_size: usize,
    pub total_chunks: usize,
    pub total_questions: usize,

    /// Indices of chunk files that were written successfully
    pub created_chunks: BTreeSet<usize>,

    pub created_at: NaiveDate,
}

impl ChunkMetadata {
    /// Number of chunks needed for a record count.
    pub fn expected_chunks(total: usize, chunk_size: usize) -> usize {
        if chunk_size == 0 {
            return 0;
        }
        total.div_ceil(chunk_size)
    }

    /// Every chunk in `[0, total_chunks)` was created.
    pub fn is_complete(&self) -> bool {
        self.missing_chunks().is_empty()
    }

    pub fn missing_chunks(&self) -> Vec<usize> {
        (0..self.total_chunks)
            .filter(|i| !self.created_chunks.contains(i))
            .collect()
    }

    /// Chunk index holding the record at a 1-based ordinal.
    pub fn chunk_for_ordinal(&self, ordinal: usize) -> Option<usize> {
        if ordinal == 0 || ordinal > self.total_questions || self.chunk_size == 0 {
            return None;
        }
        Some((ordinal - 1) / self.chunk_size)
    }
}
