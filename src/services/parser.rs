// src/services/parser.rs

//! Markup extraction capability consumed by the crawler and the fetcher.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Comment;

/// Outcome of extracting one sub-field from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field<T> {
    Present(T),
    Missing,
    Failed(String),
}

impl<T> Field<T> {
    /// The extracted value; a failure is logged and treated as absent.
    pub fn into_option(self, name: &str, link: &str) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Missing => None,
            Self::Failed(reason) => {
                log::debug!("Failed to extract {} from {}: {}", name, link, reason);
                None
            }
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Self::Present)
    }
}

/// A link with the visible text it was found under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitledLink {
    pub title: String,
    pub href: String,
}

/// One page of the discussion listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ListingPage {
    /// Page count, only reliable on the first page
    pub total_pages: Option<u32>,
    pub links: Vec<TitledLink>,
}

/// One entry of the vote tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    #[serde(rename = "voted_answers")]
    pub answer: String,
    #[serde(rename = "vote_count", default)]
    pub count: u32,
    #[serde(rename = "is_most_voted", default)]
    pub most_voted: bool,
}

/// Raw fields of a discussion page before answer resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPage {
    pub body: Field<String>,
    pub options: Field<Vec<String>>,
    pub votes: Field<Vec<VoteCount>>,
    pub suggested_answer: Field<String>,
    pub comments: Field<Vec<Comment>>,
    pub image_refs: Field<Vec<String>>,
}

/// Extracts structured data from page bodies.
///
/// Implementations return `AppError::StructureChanged` when a page lacks the
/// markers that identify its kind.
pub trait PageParser: Send + Sync {
    /// Exam links on a search results page.
    fn parse_search(&self, html: &str) -> Result<Vec<TitledLink>>;

    fn parse_listing(&self, html: &str) -> Result<ListingPage>;

    fn parse_record(&self, html: &str) -> Result<RecordPage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_into_option() {
        assert_eq!(Field::Present(3).into_option("x", "l"), Some(3));
        assert_eq!(Field::<u32>::Missing.into_option("x", "l"), None);
        assert_eq!(Field::<u32>::Failed("bad".into()).into_option("x", "l"), None);
        assert!(Field::from(Some(1)).is_present());
        assert_eq!(Field::<u8>::from(None), Field::Missing);
    }

    #[test]
    fn test_vote_tally_layout() {
        let json = r#"[{"voted_answers": "B", "vote_count": 12, "is_most_voted": true},
                       {"voted_answers": "C", "vote_count": 3}]"#;
        let votes: Vec<VoteCount> = serde_json::from_str(json).unwrap();
        assert_eq!(votes[0].answer, "B");
        assert!(votes[0].most_voted);
        assert!(!votes[1].most_voted);
    }
}
