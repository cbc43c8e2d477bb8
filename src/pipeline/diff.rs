//! Change detection between a stored record and a freshly fetched one.
//!
//! Rules are evaluated in order and the first match decides:
//! 1. answer newly available
//! 2. answer changed
//! 3. question text changed
//! 4. answer options changed
//! 5. fingerprint changed
//!
//! Anything else is unchanged. Comments never make a record count as changed.

use std::fmt;

use crate::models::Record;
use crate::pipeline::fingerprint::Fingerprint;

/// Why a stored record is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateReason {
    AnswerNowAvailable,
    AnswerChanged {
        from: Option<String>,
        to: Option<String>,
    },
    BodyChanged,
    OptionsChanged,
    FingerprintChanged {
        from: Fingerprint,
        to: Fingerprint,
    },
}

impl fmt::Display for UpdateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnswerNowAvailable => write!(f, "answer newly available"),
            Self::AnswerChanged { from, to } => write!(
                f,
                "answer changed: {} -> {}",
                from.as_deref().unwrap_or("none"),
                to.as_deref().unwrap_or("none")
            ),
            Self::BodyChanged => write!(f, "question content changed"),
            Self::OptionsChanged => write!(f, "answer options changed"),
            Self::FingerprintChanged { from, to } => {
                write!(f, "content fingerprint changed: {from} -> {to}")
            }
        }
    }
}

/// Classification of a fetched record against storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    New,
    Updated(UpdateReason),
    Unchanged,
}

impl Change {
    /// Whether the fetched record should be written.
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Updated(reason) => write!(f, "updated ({reason})"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Decides whether a fetched record differs from the stored one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, existing: Option<&Record>, fresh: &Record) -> Change {
        let Some(existing) = existing else {
            return Change::New;
        };

        if existing.top_answer.is_none() && fresh.top_answer.is_some() {
            return Change::Updated(UpdateReason::AnswerNowAvailable);
        }
        if existing.top_answer != fresh.top_answer {
            return Change::Updated(UpdateReason::AnswerChanged {
                from: existing.top_answer.clone(),
                to: fresh.top_answer.clone(),
            });
        }
        if existing.body != fresh.body {
            return Change::Updated(UpdateReason::BodyChanged);
        }
        if existing.options != fresh.options {
            return Change::Updated(UpdateReason::OptionsChanged);
        }

        let (from, to) = (Fingerprint::of(existing), Fingerprint::of(fresh));
        if from != to {
            return Change::Updated(UpdateReason::FingerprintChanged { from, to });
        }
        Change::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Comment, RecordId};

    fn record(answer: Option<&str>) -> Record {
        let mut r = Record::new(RecordId::new(9), "https://example.com/question-9");
        r.body = "What is S3?".into();
        r.options = vec!["A. storage".into(), "B. compute".into()];
        r.top_answer = answer.map(str::to_string);
        r
    }

    #[test]
    fn test_absent_is_new() {
        assert_eq!(ChangeDetector::new().classify(None, &record(None)), Change::New);
    }

    #[test]
    fn test_answer_newly_available() {
        let change = ChangeDetector::new().classify(Some(&record(None)), &record(Some("B")));
        assert_eq!(change, Change::Updated(UpdateReason::AnswerNowAvailable));
        assert_eq!(change.to_string(), "updated (answer newly available)");
    }

    #[test]
    fn test_answer_changed_and_removed() {
        let detector = ChangeDetector::new();
        assert!(matches!(
            detector.classify(Some(&record(Some("A"))), &record(Some("B"))),
            Change::Updated(UpdateReason::AnswerChanged { .. })
        ));
        let removed = detector.classify(Some(&record(Some("A"))), &record(None));
        assert_eq!(
            removed.to_string(),
            "updated (answer changed: A -> none)"
        );
    }

    #[test]
    fn test_body_then_options_precedence() {
        let detector = ChangeDetector::new();
        let mut fresh = record(Some("A"));
        fresh.body = "What is EC2?".into();
        fresh.options.reverse();
        assert_eq!(
            detector.classify(Some(&record(Some("A"))), &fresh),
            Change::Updated(UpdateReason::BodyChanged)
        );

        let mut reordered = record(Some("A"));
        reordered.options.reverse();
        assert_eq!(
            detector.classify(Some(&record(Some("A"))), &reordered),
            Change::Updated(UpdateReason::OptionsChanged)
        );
    }

    #[test]
    fn test_comment_only_difference_is_unchanged() {
        let mut fresh = record(Some("A"));
        fresh.comments.push(Comment {
            text: "I think A".into(),
            selected_option: Some("A".into()),
            replies: vec![],
        });
        let change = ChangeDetector::new().classify(Some(&record(Some("A"))), &fresh);
        assert_eq!(change, Change::Unchanged);
        assert!(!change.is_write());
    }
}
