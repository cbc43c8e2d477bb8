// src/models/links.rs

//! Discovered link set for one collection (`links.json`).

use serde::{Deserialize, Serialize};

use crate::models::{RecordId, SyncStatus};

/// Question links discovered from the paginated discussion listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LinkSet {
    /// Last listing page scanned (0 before the first page)
    #[serde(alias = "page_num", default)]
    pub cursor: u32,

    #[serde(default)]
    pub status: SyncStatus,

    /// Relative discussion links, sorted by question number once complete
    #[serde(default)]
    pub links: Vec<String>,

    /// Pages that failed during the sweep that produced this set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_pages: Vec<u32>,
}

impl LinkSet {
    /// Create an empty, in-progress link set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.status == SyncStatus::Complete
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Question identifiers in link order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.links
            .iter()
            .filter_map(|link| RecordId::from_link(link))
            .collect()
    }

    /// Record one scanned page and the links found on it.
    pub fn record_page(&mut self, page: u32, links: impl IntoIterator<Item = String>) {
        self.links.extend(links);
        self.cursor = page;
    }

    /// Record a page that could not be scanned.
    pub fn skip_page(&mut self, page: u32) {
        self.skipped_pages.push(page);
        self.cursor = page;
    }

    /// Close the sweep: order by question number, drop duplicates and links
    /// without a number, and mark the set complete.
    pub fn finish(mut self) -> Self {
        let mut keyed: Vec<(RecordId, String)> = self
            .links
            .drain(..)
            .filter_map(|link| {
                let id = RecordId::from_link(&link);
                if id.is_none() {
                    log::warn!("Dropping link without question number: {}", link);
                }
                id.map(|id| (id, link))
            })
            .collect();

        // Pagination order is not monotonic, so order by the embedded number.
        keyed.sort_by_key(|(id, _)| *id);
        keyed.dedup_by_key(|(id, _)| *id);

        self.links = keyed.into_iter().map(|(_, link)| link).collect();
        self.status = SyncStatus::Complete;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(n: u64) -> String {
        format!("/discussions/cat/view/{}-exam-x-topic-1-question-{}-discussion/", 900 + n, n)
    }

    #[test]
    fn test_finish_sorts_numerically_and_dedups() {
        let mut set = LinkSet::new();
        set.record_page(1, vec![link(10), link(2), link(33)]);
        set.record_page(2, vec![link(2), link(1), "/discussions/cat/view/77/".to_string()]);

        let set = set.finish();

        assert!(set.is_complete());
        assert_eq!(set.cursor, 2);
        let ids: Vec<u64> = set.ids().into_iter().map(RecordId::value).collect();
        assert_eq!(ids, vec![1, 2, 10, 33]);
    }

    #[test]
    fn test_legacy_page_num_field() {
        let json = r#"{"page_num": 7, "status": "complete", "links": []}"#;
        let set: LinkSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.cursor, 7);
        assert!(set.is_complete());
    }

    #[test]
    fn test_skipped_pages_advance_cursor() {
        let mut set = LinkSet::new();
        set.record_page(1, vec![link(1)]);
        set.skip_page(2);
        assert_eq!(set.cursor, 2);
        assert_eq!(set.skipped_pages, vec![2]);
    }
}
