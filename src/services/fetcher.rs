// src/services/fetcher.rs

//! Fetches one discussion page and normalizes it into a `Record`.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::models::{Fetched, ProcessedImage, Record, RecordId};
use crate::services::images::ImageProcessor;
use crate::services::parser::{PageParser, RecordPage, VoteCount};
use crate::services::source::PageSource;
use crate::utils::url::resolve;

/// Signals available to answer resolution.
#[derive(Debug, Clone, Copy)]
pub struct AnswerSignals<'a> {
    pub votes: &'a [VoteCount],
    pub suggested: Option<&'a str>,
}

/// One strategy for picking the top answer.
pub trait AnswerResolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, signals: &AnswerSignals<'_>) -> Option<String>;
}

/// The option flagged as the community majority.
#[derive(Debug, Clone, Copy, Default)]
pub struct MajorityFlag;

impl AnswerResolver for MajorityFlag {
    fn name(&self) -> &'static str {
        "majority flag"
    }

    fn resolve(&self, signals: &AnswerSignals<'_>) -> Option<String> {
        signals
            .votes
            .iter()
            .find(|v| v.most_voted)
            .map(|v| v.answer.clone())
    }
}

/// The option with the most votes, if it has any. Ties keep the first.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestVote;

impl AnswerResolver for HighestVote {
    fn name(&self) -> &'static str {
        "highest vote"
    }

    fn resolve(&self, signals: &AnswerSignals<'_>) -> Option<String> {
        let mut best: Option<&VoteCount> = None;
        for vote in signals.votes {
            if best.is_none_or(|b| vote.count > b.count) {
                best = Some(vote);
            }
        }
        best.filter(|v| v.count > 0).map(|v| v.answer.clone())
    }
}

/// The suggested-answer annotation on the question.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuggestedAnswer;

impl AnswerResolver for SuggestedAnswer {
    fn name(&self) -> &'static str {
        "suggested answer"
    }

    fn resolve(&self, signals: &AnswerSignals<'_>) -> Option<String> {
        signals
            .suggested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Ordered resolvers; the first that yields an answer wins.
pub struct AnswerChain {
    resolvers: Vec<Box<dyn AnswerResolver>>,
}

impl AnswerChain {
    pub fn new(resolvers: Vec<Box<dyn AnswerResolver>>) -> Self {
        Self { resolvers }
    }

    pub fn resolve(&self, signals: &AnswerSignals<'_>) -> Option<String> {
        self.resolvers.iter().find_map(|resolver| {
            let answer = resolver.resolve(signals)?;
            log::debug!("Top answer {} from {}", answer, resolver.name());
            Some(answer)
        })
    }
}

impl Default for AnswerChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(MajorityFlag),
            Box::new(HighestVote),
            Box::new(SuggestedAnswer),
        ])
    }
}

/// Fetches and normalizes single records.
pub struct RecordFetcher {
    source: Arc<dyn PageSource>,
    parser: Arc<dyn PageParser>,
    images: Arc<dyn ImageProcessor>,
    answers: AnswerChain,
    base_url: String,
}

impl RecordFetcher {
    pub fn new(
        source: Arc<dyn PageSource>,
        parser: Arc<dyn PageParser>,
        images: Arc<dyn ImageProcessor>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            source,
            parser,
            images,
            answers: AnswerChain::default(),
            base_url: base_url.into(),
        }
    }

    /// Replace the answer resolution chain.
    pub fn with_answer_chain(mut self, answers: AnswerChain) -> Self {
        self.answers = answers;
        self
    }

    /// Absolute URL of a discussion link.
    pub fn absolute_link(&self, link: &str) -> String {
        resolve(&self.base_url, link)
    }

    /// Fetch one record. Never errors: any page-level problem is a `Failed`.
    pub async fn fetch(&self, link: &str) -> Fetched {
        let url = self.absolute_link(link);
        let Some(id) = RecordId::from_link(&url) else {
            return Fetched::failed(url, "link has no question number");
        };

        let page = match self.source.fetch(&url).await {
            Ok(page) => page,
            Err(e) => return Fetched::failed(url, e),
        };

        let parsed = match self.parser.parse_record(&page.body) {
            Ok(parsed) => parsed,
            Err(e) => return Fetched::failed(url, e),
        };

        Fetched::Record(self.build_record(id, url, parsed).await)
    }

    async fn build_record(&self, id: RecordId, url: String, page: RecordPage) -> Record {
        let votes = page.votes.into_option("votes", &url).unwrap_or_default();
        let suggested = page.suggested_answer.into_option("suggested answer", &url);
        let top_answer = self.answers.resolve(&AnswerSignals {
            votes: &votes,
            suggested: suggested.as_deref(),
        });

        let image_refs = page.image_refs.into_option("images", &url).unwrap_or_default();
        let mut record = Record::new(id, url);
        record.body = page
            .body
            .into_option("body", &record.source_link)
            .unwrap_or_default();
        record.options = page
            .options
            .into_option("options", &record.source_link)
            .unwrap_or_default();
        record.comments = page
            .comments
            .into_option("comments", &record.source_link)
            .unwrap_or_default();
        record.top_answer = top_answer;
        record.images = self.process_images(&record.source_link, image_refs).await;
        record
    }

    async fn process_images(
        &self,
        record_url: &str,
        refs: Vec<String>,
    ) -> BTreeMap<String, ProcessedImage> {
        let urls: Vec<String> = refs.iter().map(|r| resolve(record_url, r)).collect();
        let processed = join_all(urls.iter().map(|u| self.images.process(u))).await;

        urls.into_iter()
            .zip(processed)
            .filter_map(|(url, image)| {
                if image.is_none() {
                    log::debug!("Skipping image {}", url);
                }
                image.map(|img| (url, img))
            })
            .collect()
    }
}
