// src/pipeline/check.rs

//! Check whether a collection needs another sync.

use crate::models::{SyncStatus, UpdateCheck};
use crate::services::LinkCrawler;
use crate::storage::CollectionStorage;

/// Decide from stored files alone whether `code` should be synced again.
pub async fn check_for_updates(storage: &dyn CollectionStorage, code: &str) -> UpdateCheck {
    let collection = match storage.load_collection(code).await {
        Ok(Some(collection)) => collection,
        Ok(None) => return UpdateCheck::needed("no collection file"),
        Err(e) => return UpdateCheck::needed(format!("collection file unreadable: {e}")),
    };
    if collection.is_empty() {
        return UpdateCheck::needed("collection is empty");
    }
    if collection.status != SyncStatus::Complete {
        return UpdateCheck::needed(format!("status is '{}'", collection.status));
    }

    match storage.load_links(code).await {
        Ok(Some(links)) if links.len() > collection.len() => UpdateCheck::needed(format!(
            "{} links discovered but only {} questions stored",
            links.len(),
            collection.len()
        )),
        _ => UpdateCheck::up_to_date(),
    }
}

/// Run the offline check, then compare a complete collection against the
/// estimated number of links currently listed.
///
/// A failed or inconclusive estimate counts as up to date.
pub async fn check_for_updates_online(
    storage: &dyn CollectionStorage,
    crawler: &LinkCrawler,
    code: &str,
) -> UpdateCheck {
    let offline = check_for_updates(storage, code).await;
    if offline.needed {
        return offline;
    }
    let stored = match storage.load_collection(code).await {
        Ok(Some(collection)) => collection.len(),
        _ => return offline,
    };

    match crawler.estimate_link_count(code).await {
        Ok(0) => UpdateCheck {
            needed: false,
            reason: "unable to check for updates".to_string(),
        },
        Ok(estimate) if estimate > stored => UpdateCheck::needed(format!(
            "new questions detected: {} missing questions",
            estimate - stored
        )),
        Ok(_) => UpdateCheck::up_to_date(),
        Err(e) => {
            log::warn!("Online check for {} failed: {}", code, e);
            UpdateCheck {
                needed: false,
                reason: "network check failed, assuming up to date".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cancel::CancelFlag;
    use crate::logging::LogProgress;
    use crate::models::{Collection, LinkSet, Record, RecordId};
    use crate::storage::LocalStorage;
    use crate::testing::{BASE_URL, FakeSource, JsonParser, exam_site};
    use tempfile::TempDir;

    const CODE: &str = "AZ-900";

    fn link(n: u64) -> String {
        format!("https://example.com/exam-az-900-topic-1-question-{n}-discussion/")
    }

    fn complete(n: u64) -> Collection {
        let mut collection =
            Collection::from_records((1..=n).map(|i| Record::new(RecordId::new(i), link(i))));
        collection.status = SyncStatus::Complete;
        collection
    }

    async fn save_links(storage: &LocalStorage, n: u64) {
        let mut links = LinkSet::new();
        links.record_page(1, (1..=n).map(link));
        storage.save_links(CODE, &links.finish()).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_and_empty_need_update() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        assert!(check_for_updates(&storage, CODE).await.needed);

        storage.save_collection(CODE, &Collection::new()).await.unwrap();
        let check = check_for_updates(&storage, CODE).await;
        assert_eq!(check, UpdateCheck::needed("collection is empty"));
    }

    #[tokio::test]
    async fn test_in_progress_needs_update() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let mut collection = complete(3);
        collection.status = SyncStatus::InProgress;
        storage.save_collection(CODE, &collection).await.unwrap();

        let check = check_for_updates(&storage, CODE).await;
        assert_eq!(check.reason, "status is 'in progress'");
    }

    #[tokio::test]
    async fn test_more_links_than_records_needs_update() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage.save_collection(CODE, &complete(3)).await.unwrap();
        save_links(&storage, 5).await;

        let check = check_for_updates(&storage, CODE).await;
        assert!(check.needed);
        assert_eq!(check.reason, "5 links discovered but only 3 questions stored");
    }

    #[tokio::test]
    async fn test_complete_collection_is_up_to_date() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage.save_collection(CODE, &complete(3)).await.unwrap();
        save_links(&storage, 3).await;

        assert_eq!(check_for_updates(&storage, CODE).await, UpdateCheck::up_to_date());
    }

    fn crawler(storage: Arc<LocalStorage>, source: FakeSource) -> LinkCrawler {
        LinkCrawler::new(
            Arc::new(source),
            Arc::new(JsonParser),
            storage,
            Arc::new(LogProgress),
            CancelFlag::new(),
            BASE_URL,
        )
    }

    #[tokio::test]
    async fn test_online_detects_new_questions() {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path()));
        storage.save_collection(CODE, &complete(3)).await.unwrap();
        let crawler = crawler(storage.clone(), exam_site(&[(CODE, &[1, 2, 3, 4, 5])]));

        let check = check_for_updates_online(storage.as_ref(), &crawler, CODE).await;
        assert_eq!(check, UpdateCheck::needed("new questions detected: 2 missing questions"));
    }

    #[tokio::test]
    async fn test_online_same_count_is_up_to_date() {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path()));
        storage.save_collection(CODE, &complete(3)).await.unwrap();
        let crawler = crawler(storage.clone(), exam_site(&[(CODE, &[1, 2, 3])]));

        let check = check_for_updates_online(storage.as_ref(), &crawler, CODE).await;
        assert_eq!(check, UpdateCheck::up_to_date());
    }

    #[tokio::test]
    async fn test_online_network_failure_assumes_up_to_date() {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path()));
        storage.save_collection(CODE, &complete(3)).await.unwrap();
        let crawler = crawler(storage.clone(), FakeSource::new());

        let check = check_for_updates_online(storage.as_ref(), &crawler, CODE).await;
        assert!(!check.needed);
        assert_eq!(check.reason, "network check failed, assuming up to date");
    }

    #[tokio::test]
    async fn test_online_skips_network_when_offline_check_decides() {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path()));
        let source = Arc::new(exam_site(&[(CODE, &[1])]));
        let crawler = LinkCrawler::new(
            source.clone(),
            Arc::new(JsonParser),
            storage.clone(),
            Arc::new(LogProgress),
            CancelFlag::new(),
            BASE_URL,
        );

        let check = check_for_updates_online(storage.as_ref(), &crawler, CODE).await;
        assert_eq!(check, UpdateCheck::needed("no collection file"));
        assert!(source.calls().is_empty());
    }
}
