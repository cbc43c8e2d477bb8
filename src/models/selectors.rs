// src/models/selectors.rs

//! CSS selectors for scraping search, listing and discussion pages.

use serde::{Deserialize, Serialize};

/// CSS selectors used by the HTML page parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSelectors {
    /// Exam links on the search results page
    pub search_result: String,

    /// Page indicator; its second `<strong>` holds the page count
    pub page_indicator: String,

    /// Discussion title container on a listing page
    pub listing_title: String,

    /// Question body paragraph; absence means the page layout changed
    pub question_body: String,

    /// Container of the question body, used to detect layout changes
    pub question_container: String,

    /// Answer option items
    pub choices: String,

    /// Script holding the vote tally JSON
    pub vote_tally: String,

    /// Suggested answer annotation
    pub suggested_answer: String,

    /// Top-level comment containers
    pub comment: String,

    /// Comment text within a comment container
    pub comment_content: String,

    /// Selected option badge within a comment
    pub comment_selected: String,

    /// Reply containers within a comment
    pub comment_reply: String,

    /// Images within the question body
    pub image: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            search_result: "ul.exam-list-font a".to_string(),
            page_indicator: "span.discussion-list-page-indicator".to_string(),
            listing_title: "div.dicussion-title-container".to_string(),
            question_body: "div.question-body p.card-text".to_string(),
            question_container: "div.question-body".to_string(),
            choices: "div.question-choices-container li".to_string(),
            vote_tally: "div.voted-answers-tally script".to_string(),
            suggested_answer: "span.correct-answer".to_string(),
            comment: "div.discussion-container > div.comment-container".to_string(),
            comment_content: "div.comment-content".to_string(),
            comment_selected: "div.comment-selected-answers span".to_string(),
            comment_reply: "div.comment-replies div.comment-container".to_string(),
            image: "div.question-body img[src]".to_string(),
        }
    }
}

impl PageSelectors {
    /// All selectors paired with their field names, for validation.
    pub fn all(&self) -> [(&'static str, &str); 13] {
        [
            ("search_result", &self.search_result),
            ("page_indicator", &self.page_indicator),
            ("listing_title", &self.listing_title),
            ("question_body", &self.question_body),
            ("question_container", &self.question_container),
            ("choices", &self.choices),
            ("vote_tally", &self.vote_tally),
            ("suggested_answer", &self.suggested_answer),
            ("comment", &self.comment),
            ("comment_content", &self.comment_content),
            ("comment_selected", &self.comment_selected),
            ("comment_reply", &self.comment_reply),
            ("image", &self.image),
        ]
    }
}
