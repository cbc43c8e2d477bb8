// src/pipeline/batch.rs

//! Sequential refresh of every stored collection.

use std::time::Duration;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::logging;
use crate::models::{BatchSummary, RunOutcome};

use super::sync::{SyncOptions, SyncOrchestrator, SyncOutcome};

/// Sync every stored collection (or only `only`) one after another.
///
/// Runs are paced regardless of `options.fast_mode`. The summary is written
/// to `update_log.json` before it is returned.
pub async fn update_all(
    orchestrator: &SyncOrchestrator,
    pause: Duration,
    options: SyncOptions,
    only: Option<&str>,
) -> Result<BatchSummary> {
    let storage = orchestrator.storage();
    let mut codes = storage.list_collections().await?;
    if codes.is_empty() {
        return Err(AppError::not_found("No exams found in data directory"));
    }
    if let Some(only) = only {
        if !codes.iter().any(|c| c == only) {
            return Err(AppError::not_found(format!("Exam {only} not found")));
        }
        codes.retain(|c| c == only);
    }

    let options = SyncOptions {
        fast_mode: false,
        ..options
    };
    let total = codes.len();
    let mut results = Vec::with_capacity(total);

    for (i, code) in codes.iter().enumerate() {
        log::info!("[{}/{}] Updating {}", i + 1, total, code);

        let stop = match orchestrator.sync(code, options).await {
            Ok(report) => {
                let records = report.collection.len();
                results.push(match report.outcome {
                    SyncOutcome::Complete => RunOutcome::success(code, records),
                    SyncOutcome::CompleteWithErrors { error, .. }
                    | SyncOutcome::Failed { error } => RunOutcome::failed(code, records, error),
                });
                false
            }
            Err(e) => {
                log::error!("{}: {}", code, e);
                let stop = e.is_fatal_for_batch();
                results.push(RunOutcome::failed(code, 0, e.to_string()));
                stop
            }
        };

        if stop || orchestrator.cancel_flag().is_cancelled() {
            log::warn!("Batch stopped after {}", code);
            break;
        }
        if i + 1 < total && !pause.is_zero() {
            log::info!("Pausing {}s before the next exam", pause.as_secs());
            tokio::time::sleep(pause).await;
        }
    }

    let summary =
        BatchSummary::from_results(results, options.force_rescan, options.force_update, Utc::now());
    storage.save_update_log(&summary).await?;

    logging::summary(
        "Update complete",
        &[
            ("Exams processed", summary.total_exams.to_string()),
            ("Successful", summary.successful.to_string()),
            ("Failed", summary.failed.to_string()),
            ("Total questions", summary.total_questions.to_string()),
        ],
    );
    for failed in summary.results.iter().filter(|r| !r.is_success()) {
        log::warn!(
            "    {}: {}",
            failed.code,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(summary)
}
