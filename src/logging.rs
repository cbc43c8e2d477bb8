// src/logging.rs

//! Progress reporting for long-running operations.
//!
//! Library code reports through a `ProgressSink` passed in by the caller;
//! `LogProgress` forwards every event to the `log` facade.

use std::fmt;

use crate::models::RecordId;

/// A progress event emitted during a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Link discovery started for a collection
    Discovering { code: String },
    /// One listing page was scanned
    PageScanned { page: u32, total: u32, links: usize },
    /// One listing page failed and was skipped
    PageSkipped { page: u32, reason: String },
    /// Link discovery finished
    LinksReady { count: usize, cached: bool },
    /// One record was reconciled
    RecordProcessed {
        position: usize,
        total: usize,
        id: RecordId,
        change: String,
    },
    /// A collection sync finished
    Finished {
        code: String,
        records: usize,
        outcome: String,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovering { code } => write!(f, "Discovering question links for {code}"),
            Self::PageScanned { page, total, links } => {
                write!(f, "Scanned listing page {page}/{total} ({links} links)")
            }
            Self::PageSkipped { page, reason } => {
                write!(f, "Skipped listing page {page}: {reason}")
            }
            Self::LinksReady { count, cached } => {
                let origin = if *cached { "from file" } else { "from listing" };
                write!(f, "{count} question links ready ({origin})")
            }
            Self::RecordProcessed {
                position,
                total,
                id,
                change,
            } => write!(f, "[{position}/{total}] Question {id}: {change}"),
            Self::Finished {
                code,
                records,
                outcome,
            } => write!(f, "{code}: {outcome} with {records} questions"),
        }
    }
}

/// Receives progress events.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Sink that writes events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match &event {
            ProgressEvent::PageSkipped { .. } => log::warn!("{}", event),
            _ => log::info!("{}", event),
        }
    }
}

/// Log the start of one step of a multi-step run.
pub fn step(current: usize, total: usize, message: &str) {
    log::info!("[{}/{}] {}", current, total, message);
}

/// Log a titled block of key/value lines.
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {}", title);
    for (key, value) in items {
        log::info!("    {}: {}", key, value);
    }
}
