// src/models/manifest.rs

//! Top-level index of all collections (`manifest.json`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const MANIFEST_VERSION: &str = "3.0";

/// One collection entry in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Collection code (e.g. "AZ-900")
    pub code: String,
    pub name: String,
    pub description: String,
    pub question_count: usize,
    pub last_updated: DateTime<Utc>,
}

impl ManifestEntry {
    pub fn new(code: impl Into<String>, question_count: usize, last_updated: DateTime<Utc>) -> Self {
        let code = code.into();
        Self {
            name: code.clone(),
            description: format!("{code} certification exam questions"),
            code,
            question_count,
            last_updated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub generated: DateTime<Utc>,
    pub total_exams: usize,
    pub total_questions: usize,
    pub exams: Vec<ManifestEntry>,
}

impl Manifest {
    /// Build a manifest from entries, sorted by code with summed totals.
    pub fn from_entries(mut exams: Vec<ManifestEntry>, generated: DateTime<Utc>) -> Self {
        exams.sort_by(|a, b| a.code.cmp(&b.code));
        Self {
            version: MANIFEST_VERSION.to_string(),
            generated,
            total_exams: exams.len(),
            total_questions: exams.iter().map(|e| e.question_count).sum(),
            exams,
        }
    }

    /// Check that the totals agree with the entries.
    pub fn validate(&self) -> Result<()> {
        if self.total_exams != self.exams.len() {
            return Err(AppError::validation(format!(
                "manifest totalExams {} != {} entries",
                self.total_exams,
                self.exams.len()
            )));
        }
        let sum: usize = self.exams.iter().map(|e| e.question_count).sum();
        if self.total_questions != sum {
            return Err(AppError::validation(format!(
                "manifest totalQuestions {} != sum of entries {}",
                self.total_questions, sum
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entries_sorts_and_sums() {
        let now = Utc::now();
        let manifest = Manifest::from_entries(
            vec![
                ManifestEntry::new("SAA-C03", 400, now),
                ManifestEntry::new("AZ-900", 120, now),
            ],
            now,
        );

        assert_eq!(manifest.version, "3.0");
        assert_eq!(manifest.total_exams, 2);
        assert_eq!(manifest.total_questions, 520);
        assert_eq!(manifest.exams[0].code, "AZ-900");
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_validate_detects_bad_totals() {
        let now = Utc::now();
        let mut manifest = Manifest::from_entries(vec![ManifestEntry::new("AZ-900", 10, now)], now);
        manifest.total_questions = 11;
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_camel_case_layout() {
        let now = Utc::now();
        let json = serde_json::to_value(Manifest::from_entries(
            vec![ManifestEntry::new("AZ-900", 10, now)],
            now,
        ))
        .unwrap();
        assert_eq!(json["totalExams"], 1);
        assert_eq!(json["exams"][0]["questionCount"], 10);
        assert_eq!(
            json["exams"][0]["description"],
            "AZ-900 certification exam questions"
        );
    }
}
