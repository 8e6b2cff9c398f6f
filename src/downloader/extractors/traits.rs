// Extractor traits and common configuration

use async_trait::async_trait;

use crate::downloader::errors::ResolutionError;
use crate::downloader::models::ProbeResult;

/// Configuration for metadata queries and downloads
#[derive(Debug, Clone, Default)]
pub struct ExtractorConfig {
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
    /// yt-dlp `--socket-timeout`, per network operation
    pub socket_timeout: Option<u32>,
    /// Directory or binary path handed to `--ffmpeg-location`
    pub ffmpeg_location: Option<String>,
}

impl ExtractorConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<String>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_socket_timeout(mut self, seconds: Option<u32>) -> Self {
        self.socket_timeout = seconds;
        self
    }

    pub fn with_ffmpeg_location(mut self, location: Option<String>) -> Self {
        self.ffmpeg_location = location;
        self
    }
}

/// Source of stream metadata for the structured provider
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Name of the source (for logging)
    fn name(&self) -> &'static str;

    /// Query title and stream descriptors without downloading
    async fn probe(&self, url: &str) -> Result<ProbeResult, ResolutionError>;
}

/// Fetches raw page markup for the direct provider
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, ResolutionError>;
}
