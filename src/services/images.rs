// src/services/images.rs

//! Image processing capability.

use async_trait::async_trait;

use crate::models::ProcessedImage;

/// Downloads and re-encodes an image referenced by a record.
///
/// `None` means the image is skipped; the record is still stored.
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    async fn process(&self, url: &str) -> Option<ProcessedImage>;
}

/// Processor that skips every image.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipImages;

#[async_trait]
impl ImageProcessor for SkipImages {
    async fn process(&self, _url: &str) -> Option<ProcessedImage> {
        None
    }
}
