// src/testing.rs

//! In-memory collaborators for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use crate::cancel::CancelFlag;
use crate::error::{AppError, Result};
use crate::services::{
    FetchedPage, Field, ListingPage, PageParser, PageSource, RecordPage, TitledLink,
};
use crate::utils::url::{listing_url, search_url};

pub const BASE_URL: &str = "https://www.examtopics.com";

enum Response {
    Page(FetchedPage),
    Failure(String),
}

type Hook = Box<dyn Fn() + Send + Sync>;

/// `PageSource` serving canned responses and recording every requested URL.
#[derive(Default)]
pub struct FakeSource {
    responses: HashMap<String, Response>,
    hooks: HashMap<String, Hook>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        self.responses.insert(
            url.clone(),
            Response::Page(FetchedPage {
                final_url: url,
                body: body.into(),
            }),
        );
        self
    }

    pub fn with_json<T: Serialize>(self, url: impl Into<String>, value: &T) -> Self {
        let body = serde_json::to_string(value).unwrap();
        self.with_body(url, body)
    }

    pub fn with_redirect(
        mut self,
        url: impl Into<String>,
        final_url: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        self.responses.insert(
            url.into(),
            Response::Page(FetchedPage {
                final_url: final_url.into(),
                body: body.into(),
            }),
        );
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .insert(url.into(), Response::Failure(message.into()));
        self
    }

    /// Run `hook` when `url` is requested, before responding.
    pub fn on_fetch(
        mut self,
        url: impl Into<String>,
        hook: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.hooks.insert(url.into(), Box::new(hook));
        self
    }

    /// Trip `flag` when `url` is requested.
    pub fn cancel_on(self, url: impl Into<String>, flag: CancelFlag) -> Self {
        self.on_fetch(url, move || flag.cancel())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl PageSource for FakeSource {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(hook) = self.hooks.get(url) {
            hook();
        }
        match self.responses.get(url) {
            Some(Response::Page(page)) => Ok(page.clone()),
            Some(Response::Failure(message)) => Err(AppError::fetch(url, message)),
            None => Err(AppError::fetch(url, "404 Not Found")),
        }
    }
}

/// `PageParser` reading page bodies as JSON-encoded parser output.
pub struct JsonParser;

impl JsonParser {
    fn decode<T: serde::de::DeserializeOwned>(html: &str) -> Result<T> {
        serde_json::from_str(html).map_err(|e| AppError::structure_changed(e.to_string()))
    }
}

impl PageParser for JsonParser {
    fn parse_search(&self, html: &str) -> Result<Vec<TitledLink>> {
        Self::decode(html)
    }

    fn parse_listing(&self, html: &str) -> Result<ListingPage> {
        Self::decode(html)
    }

    fn parse_record(&self, html: &str) -> Result<RecordPage> {
        Self::decode(html)
    }
}

/// Relative discussion link for a question.
pub fn question_link(code: &str, number: u64) -> String {
    format!(
        "/discussions/microsoft/view/{}-exam-{}-topic-1-question-{}-discussion/",
        1000 + number,
        code.to_lowercase(),
        number
    )
}

/// Listing page holding the given questions of one exam.
pub fn listing(total_pages: Option<u32>, code: &str, numbers: &[u64]) -> ListingPage {
    ListingPage {
        total_pages,
        links: numbers
            .iter()
            .map(|&n| TitledLink {
                title: format!("Exam {code} topic 1 question {n} discussion"),
                href: question_link(code, n),
            })
            .collect(),
    }
}

/// Record page with body, options and an optional suggested answer.
pub fn record_page(body: &str, options: &[&str], suggested: Option<&str>) -> RecordPage {
    RecordPage {
        body: Field::Present(body.to_string()),
        options: Field::Present(options.iter().map(|o| o.to_string()).collect()),
        votes: Field::Missing,
        suggested_answer: suggested.map(str::to_string).into(),
        comments: Field::Present(Vec::new()),
        image_refs: Field::Present(Vec::new()),
    }
}

/// Site with every exam under the `microsoft` category on one listing page.
pub fn exam_site(exams: &[(&str, &[u64])]) -> FakeSource {
    let mut links = Vec::new();
    let mut source = FakeSource::new();
    for &(code, numbers) in exams {
        source = source.with_redirect(
            search_url(BASE_URL, code),
            format!("{BASE_URL}/exams/microsoft/{}/", code.to_lowercase()),
            "",
        );
        links.extend(listing(Some(1), code, numbers).links);
        for &n in numbers {
            source = source.with_json(
                format!("{BASE_URL}{}", question_link(code, n)),
                &record_page(&format!("Question {n}"), &["A. yes", "B. no"], Some("A")),
            );
        }
    }
    source.with_json(
        listing_url(BASE_URL, "microsoft", 1),
        &ListingPage {
            total_pages: Some(1),
            links,
        },
    )
}
