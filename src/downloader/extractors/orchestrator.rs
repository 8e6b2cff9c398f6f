// Variant extractor - routes a URL to the right provider
//
// Structured provider: full metadata query, many stream descriptors.
// Direct provider: page scrape, at most one media item.

use std::sync::Arc;

use tracing::{info, warn};

use super::pinterest::parse_pin_page;
use super::traits::{MetadataSource, PageFetcher};
use crate::downloader::errors::ResolutionError;
use crate::downloader::models::{ExtractionResult, ProviderKind};

/// Resolves source URLs into candidate variants or a direct media URL
pub struct VariantExtractor {
    metadata: Arc<dyn MetadataSource>,
    pages: Arc<dyn PageFetcher>,
}

impl VariantExtractor {
    pub fn new(metadata: Arc<dyn MetadataSource>, pages: Arc<dyn PageFetcher>) -> Self {
        Self { metadata, pages }
    }

    /// Extract candidate media for `url` using the given provider
    pub async fn extract(
        &self,
        url: &str,
        provider: ProviderKind,
    ) -> Result<ExtractionResult, ResolutionError> {
        let result = match provider {
            ProviderKind::Structured => {
                info!(url, source = self.metadata.name(), "Resolving formats");
                self.metadata.probe(url).await.map(ExtractionResult::Variants)
            }
            ProviderKind::Direct => {
                info!(url, "Resolving direct media");
                let html = self.pages.fetch_page(url).await?;
                parse_pin_page(&html).map(ExtractionResult::Direct)
            }
        };

        if let Err(e) = &result {
            warn!(url, %provider, error = %e, "Resolution failed");
        }
        result
    }
}
