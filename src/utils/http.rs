// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(default_headers(config)?)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

fn default_headers(config: &CrawlerConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in [
        (ACCEPT, &config.accept),
        (ACCEPT_LANGUAGE, &config.accept_language),
        (REFERER, &config.referer),
    ] {
        if value.is_empty() {
            continue;
        }
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::config(format!("invalid {name} header: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers_from_config() {
        let headers = default_headers(&CrawlerConfig::default()).unwrap();
        assert_eq!(headers[ACCEPT_LANGUAGE], "en-US,en;q=0.9");
        assert!(headers.contains_key(REFERER));
    }

    #[test]
    fn test_empty_header_is_omitted() {
        let config = CrawlerConfig {
            referer: String::new(),
            ..CrawlerConfig::default()
        };
        let headers = default_headers(&config).unwrap();
        assert!(!headers.contains_key(REFERER));
    }

    #[test]
    fn test_invalid_header_is_config_error() {
        let config = CrawlerConfig {
            accept: "bad\nvalue".to_string(),
            ..CrawlerConfig::default()
        };
        assert!(matches!(default_headers(&config), Err(AppError::Config(_))));
    }
}
