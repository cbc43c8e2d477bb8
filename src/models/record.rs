// src/models/record.rs

//! Question record, its identifier and the fetch result wrapper.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::url::extract_question_number;

/// Stable question identifier, the number embedded in a discussion link.
///
/// Persisted as a decimal string to stay compatible with existing data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    pub fn new(number: u64) -> Self {
        Self(number)
    }

    /// Extract the identifier from a discussion link (`...-question-17-...`).
    pub fn from_link(link: &str) -> Option<Self> {
        extract_question_number(link).map(Self)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map(Self)
                .map_err(|_| D::Error::custom(format!("invalid question number '{s}'"))),
        }
    }
}

/// One discussion comment with its direct replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Comment {
    /// Comment text
    #[serde(rename = "content", default)]
    pub text: String,

    /// Option the commenter selected, if any
    #[serde(
        rename = "selected_answer",
        default,
        deserialize_with = "empty_as_none"
    )]
    pub selected_option: Option<String>,

    /// Reply texts, in page order
    #[serde(default)]
    pub replies: Vec<String>,
}

/// Encoded variants of one image referenced by a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProcessedImage {
    /// Variant name (e.g. "webp", "thumbnail") to encoded payload
    pub variants: BTreeMap<String, String>,
    pub width: u32,
    pub height: u32,
}

/// A successfully fetched and normalized question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "question_number")]
    pub id: RecordId,

    /// Question body (inner HTML)
    #[serde(rename = "question", default)]
    pub body: String,

    /// Answer options in page order
    #[serde(rename = "answers", default)]
    pub options: Vec<String>,

    /// Resolved top answer, absent when no signal was found
    #[serde(rename = "most_voted", default)]
    pub top_answer: Option<String>,

    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Absolute URL the record was fetched from
    #[serde(rename = "link")]
    pub source_link: String,

    /// Processed images keyed by their absolute source URL
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<String, ProcessedImage>,
}

impl Record {
    /// Create an empty record for a link.
    pub fn new(id: RecordId, source_link: impl Into<String>) -> Self {
        Self {
            id,
            body: String::new(),
            options: Vec::new(),
            top_answer: None,
            comments: Vec::new(),
            source_link: source_link.into(),
            images: BTreeMap::new(),
        }
    }
}

/// Result of fetching one record. A failure never carries record data, so it
/// cannot be merged over a stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Record(Record),
    Failed { link: String, reason: String },
}

impl Fetched {
    pub fn failed(link: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Failed {
            link: link.into(),
            reason: reason.to_string(),
        }
    }
}

fn empty_as_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_from_link() {
        let link = "/discussions/amazon/view/1234-exam-aws-saa-c03-topic-1-question-17-discussion/";
        assert_eq!(RecordId::from_link(link), Some(RecordId::new(17)));
        assert_eq!(RecordId::from_link("/discussions/amazon/view/1234/"), None);
    }

    #[test]
    fn test_record_id_accepts_string_and_number() {
        let from_text: RecordId = serde_json::from_str("\"42\"").unwrap();
        let from_number: RecordId = serde_json::from_str("42").unwrap();
        assert_eq!(from_text, from_number);
        assert!(serde_json::from_str::<RecordId>("\"unknown\"").is_err());
        assert_eq!(serde_json::to_string(&from_text).unwrap(), "\"42\"");
    }

    #[test]
    fn test_legacy_record_layout() {
        let json = r#"{
            "question": "<b>Which</b> service?",
            "answers": ["A. S3", "B. EC2"],
            "comments": [{"content": "B for sure", "selected_answer": "", "replies": ["agreed"]}],
            "question_number": "3",
            "link": "https://www.examtopics.com/discussions/x/view/1-question-3-discussion/",
            "most_voted": null,
            "error": null
        }"#;

        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, RecordId::new(3));
        assert_eq!(record.options.len(), 2);
        assert_eq!(record.top_answer, None);
        assert_eq!(record.comments[0].selected_option, None);
        assert_eq!(record.comments[0].replies, vec!["agreed".to_string()]);
        assert!(record.images.is_empty());
    }
}
