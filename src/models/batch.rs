// src/models/batch.rs

//! Per-collection run outcomes and the batch summary (`update_log.json`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

/// Result of syncing one collection in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    #[serde(rename = "exam_code")]
    pub code: String,
    pub status: RunStatus,
    #[serde(rename = "question_count")]
    pub record_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn success(code: impl Into<String>, record_count: usize) -> Self {
        Self {
            code: code.into(),
            status: RunStatus::Success,
            record_count,
            error: None,
        }
    }

    pub fn failed(code: impl Into<String>, record_count: usize, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            status: RunStatus::Failed,
            record_count,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Aggregate of one batch run, persisted as `update_log.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub timestamp: DateTime<Utc>,
    pub force_rescan: bool,
    pub force_update: bool,
    pub total_exams: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_questions: usize,
    pub results: Vec<RunOutcome>,
}

impl BatchSummary {
    /// Aggregate outcomes; only successful runs count towards the record total.
    pub fn from_results(
        results: Vec<RunOutcome>,
        force_rescan: bool,
        force_update: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();
        Self {
            timestamp,
            force_rescan,
            force_update,
            total_exams: results.len(),
            successful,
            failed: results.len() - successful,
            total_questions: results
                .iter()
                .filter(|r| r.is_success())
                .map(|r| r.record_count)
                .sum(),
            results,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_only_successful_records() {
        let summary = BatchSummary::from_results(
            vec![
                RunOutcome::success("AZ-900", 120),
                RunOutcome::failed("SAA-C03", 40, "Fetch failed"),
                RunOutcome::success("DP-203", 80),
            ],
            false,
            true,
            Utc::now(),
        );

        assert_eq!(summary.total_exams, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_questions, 200);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_outcome_layout() {
        let json = serde_json::to_value(RunOutcome::failed("AZ-900", 0, "boom")).unwrap();
        assert_eq!(json["exam_code"], "AZ-900");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["question_count"], 0);
        assert_eq!(json["error"], "boom");
    }
}
