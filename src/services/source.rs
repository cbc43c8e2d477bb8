// src/services/source.rs

//! Page retrieval capability and its HTTP adapter.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::utils::http::create_async_client;

/// A fetched page: the URL after redirects and the body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub final_url: String,
    pub body: String,
}

/// Retrieves pages by URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// `PageSource` backed by a configured reqwest client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::fetch(url, e))?;

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| AppError::fetch(url, e))?;
        Ok(FetchedPage { final_url, body })
    }
}
