// src/utils/url.rs

//! URL manipulation utilities.

use regex::Regex;
use url::{Url, form_urlencoded};

/// Resolve a potentially relative URL against a base URL.
///
/// Returns `href` unchanged when the base cannot be parsed.
///
/// # Examples
/// ```
/// use exam_crawler::utils::url::resolve;
///
/// assert_eq!(
///     resolve("https://example.com/path/", "page.html"),
///     "https://example.com/path/page.html"
/// );
/// ```
pub fn resolve(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract the question number from a discussion link.
///
/// # Examples
/// ```
/// use exam_crawler::utils::url::extract_question_number;
///
/// assert_eq!(
///     extract_question_number("/discussions/x/view/99-exam-az-900-topic-1-question-12-discussion/"),
///     Some(12)
/// );
/// ```
pub fn extract_question_number(link: &str) -> Option<u64> {
    let pattern = Regex::new(r"question-(\d+)").ok()?;
    pattern
        .captures(link)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Second-to-last path segment of a URL or path.
///
/// For exam pages (`/exams/<category>/<code>/`) this is the category.
pub fn category_segment(base: &str, href: &str) -> Option<String> {
    let parsed = Url::parse(&resolve(base, href)).ok()?;
    let segments: Vec<&str> = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();
    if segments.len() < 2 {
        return None;
    }
    Some(segments[segments.len() - 2].to_string())
}

/// Search URL for a collection code.
pub fn search_url(base: &str, code: &str) -> String {
    let query: String = form_urlencoded::byte_serialize(code.as_bytes()).collect();
    format!("{}/search/?query={}", base.trim_end_matches('/'), query)
}

/// Listing URL for one page of a category's discussions.
pub fn listing_url(base: &str, category: &str, page: u32) -> String {
    format!(
        "{}/discussions/{}/{}/",
        base.trim_end_matches('/'),
        category,
        page
    )
}
