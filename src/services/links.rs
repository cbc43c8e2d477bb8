// src/services/links.rs

//! Resumable discovery of question links from the paginated listing.

use std::sync::Arc;

use crate::cancel::CancelFlag;
use crate::error::{AppError, Result};
use crate::logging::{ProgressEvent, ProgressSink};
use crate::models::LinkSet;
use crate::services::parser::{ListingPage, PageParser};
use crate::services::source::PageSource;
use crate::storage::CollectionStorage;
use crate::utils::url::{category_segment, listing_url, search_url};

/// Listing pages read when estimating the current link count.
const ESTIMATE_SAMPLE_PAGES: u32 = 3;

/// Discovers every question link of a collection and persists progress.
pub struct LinkCrawler {
    source: Arc<dyn PageSource>,
    parser: Arc<dyn PageParser>,
    storage: Arc<dyn CollectionStorage>,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelFlag,
    base_url: String,
}

impl LinkCrawler {
    pub fn new(
        source: Arc<dyn PageSource>,
        parser: Arc<dyn PageParser>,
        storage: Arc<dyn CollectionStorage>,
        progress: Arc<dyn ProgressSink>,
        cancel: CancelFlag,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            source,
            parser,
            storage,
            progress,
            cancel,
            base_url: base_url.into(),
        }
    }

    /// Discover the link set for a collection.
    ///
    /// A complete stored link set is returned as-is unless `force_rescan`.
    /// Otherwise the sweep resumes after the last checkpointed page.
    pub async fn discover(&self, code: &str, force_rescan: bool) -> Result<LinkSet> {
        self.progress.report(ProgressEvent::Discovering {
            code: code.to_string(),
        });

        let stored = match self.storage.load_links(code).await {
            Ok(stored) => stored,
            Err(e) => {
                log::warn!("Ignoring unreadable link file for {}: {}", code, e);
                None
            }
        };

        if !force_rescan {
            if let Some(links) = stored.as_ref().filter(|l| l.is_complete()) {
                self.progress.report(ProgressEvent::LinksReady {
                    count: links.len(),
                    cached: true,
                });
                return Ok(links.clone());
            }
        }

        let category = self.resolve_category(code).await?;

        self.check_cancelled(code)?;
        let first_url = listing_url(&self.base_url, &category, 1);
        let first_page = self.fetch_listing(&first_url).await?;
        let total_pages = first_page.total_pages.ok_or_else(|| {
            AppError::structure_changed("page indicator not found on discussion listing")
        })?;

        let mut links = if force_rescan {
            log::info!("Force rescan requested for {}, discarding checkpoint", code);
            self.storage.clear_link_checkpoint(code).await?;
            LinkSet::new()
        } else {
            self.load_checkpoint(code, stored).await
        };
        if links.cursor > 0 {
            log::info!("Resuming {} link discovery after page {}", code, links.cursor);
        }

        let mut first_page = Some(first_page);
        for page in (links.cursor + 1)..=total_pages {
            let listing = match first_page.take().filter(|_| page == 1) {
                Some(listing) => Ok(listing),
                None => {
                    self.check_cancelled(code)?;
                    self.fetch_listing(&listing_url(&self.base_url, &category, page))
                        .await
                }
            };

            match listing {
                Ok(listing) => {
                    let found = Self::matching_links(code, listing);
                    self.progress.report(ProgressEvent::PageScanned {
                        page,
                        total: total_pages,
                        links: found.len(),
                    });
                    links.record_page(page, found);
                }
                Err(e) => {
                    self.progress.report(ProgressEvent::PageSkipped {
                        page,
                        reason: e.to_string(),
                    });
                    links.skip_page(page);
                }
            }
            self.storage.save_link_checkpoint(code, &links).await?;
        }

        let links = links.finish();
        if !links.skipped_pages.is_empty() {
            log::warn!(
                "{} link discovery completed with skipped pages {:?}",
                code,
                links.skipped_pages
            );
        }
        self.storage.save_links(code, &links).await?;
        self.progress.report(ProgressEvent::LinksReady {
            count: links.len(),
            cached: false,
        });
        Ok(links)
    }

    /// Estimate how many links the listing currently holds, without touching
    /// stored files.
    ///
    /// Counts matching links on the first `ESTIMATE_SAMPLE_PAGES` pages and
    /// extrapolates to the full page count. Returns 0 when the listing has no
    /// page indicator.
    pub async fn estimate_link_count(&self, code: &str) -> Result<usize> {
        let category = self.resolve_category(code).await?;
        let first_page = self
            .fetch_listing(&listing_url(&self.base_url, &category, 1))
            .await?;
        let Some(total_pages) = first_page.total_pages.filter(|&n| n > 0) else {
            return Ok(0);
        };

        let sample_pages = total_pages.min(ESTIMATE_SAMPLE_PAGES);
        let mut sampled = Self::matching_links(code, first_page).len();
        for page in 2..=sample_pages {
            self.check_cancelled(code)?;
            let listing = self
                .fetch_listing(&listing_url(&self.base_url, &category, page))
                .await?;
            sampled += Self::matching_links(code, listing).len();
        }

        let estimate = sampled * total_pages as usize / sample_pages as usize;
        log::debug!(
            "{}: {} links on {} of {} pages, estimated {}",
            code,
            sampled,
            sample_pages,
            total_pages,
            estimate
        );
        Ok(estimate)
    }

    /// Resolve a collection code to its remote category.
    pub async fn resolve_category(&self, code: &str) -> Result<String> {
        self.check_cancelled(code)?;
        let page = self.source.fetch(&search_url(&self.base_url, code)).await?;

        // An exact match redirects straight to the exam page.
        if page.final_url.contains("/exams/") {
            if let Some(category) = category_segment(&self.base_url, &page.final_url) {
                return Ok(category);
            }
        }

        self.parser
            .parse_search(&page.body)?
            .into_iter()
            .filter(|link| link.title.trim().starts_with(code))
            .find_map(|link| category_segment(&self.base_url, &link.href))
            .ok_or_else(|| AppError::not_found(format!("Exam code {code} not found")))
    }

    async fn fetch_listing(&self, url: &str) -> Result<ListingPage> {
        let page = self.source.fetch(url).await?;
        self.parser.parse_listing(&page.body)
    }

    async fn load_checkpoint(&self, code: &str, stored: Option<LinkSet>) -> LinkSet {
        match self.storage.load_link_checkpoint(code).await {
            Ok(Some(checkpoint)) => checkpoint,
            Ok(None) => stored.unwrap_or_default(),
            Err(e) => {
                log::warn!("Ignoring unreadable link checkpoint for {}: {}", code, e);
                LinkSet::new()
            }
        }
    }

    fn matching_links(code: &str, listing: ListingPage) -> Vec<String> {
        let marker = format!("Exam {code}");
        listing
            .links
            .into_iter()
            .filter(|link| link.title.contains(&marker))
            .map(|link| link.href)
            .collect()
    }

    fn check_cancelled(&self, code: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(AppError::Cancelled(format!("link discovery for {code}")));
        }
        Ok(())
    }
}
