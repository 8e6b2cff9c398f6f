// Error types for the relay pipeline
//
// One enum per stage so callers can tell a lookup failure from a fetch
// failure from an upload failure. `RelayError` folds them together at the
// chat boundary, where every error becomes exactly one user-facing line.

use thiserror::Error;

/// Could not determine a media source for a URL
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// yt-dlp binary could not be started
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The site is not handled by yt-dlp
    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    /// Video is private, removed or otherwise gone
    #[error("Video unavailable: {0}")]
    Unavailable(String),

    /// yt-dlp exited with an error we could not classify
    #[error("Metadata query failed: {0}")]
    Probe(String),

    /// yt-dlp printed something that is not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Metadata came back without a single stream descriptor
    #[error("No stream descriptors in metadata")]
    NoDescriptors,

    /// Page request failed at the HTTP layer
    #[error("Page fetch failed: {0}")]
    PageFetch(#[from] reqwest::Error),

    /// Embedded state block was present but is not valid JSON
    #[error("Embedded page state is not valid JSON: {0}")]
    InvalidPageState(#[from] serde_json::Error),

    /// Embedded state block is missing, or holds neither a video nor an image
    #[error("Media not found on page")]
    MediaNotFound,
}

impl ResolutionError {
    /// Classify yt-dlp stderr from a failed metadata query
    pub fn from_stderr(stderr: &str) -> Self {
        let excerpt = super::utils::stderr_excerpt(stderr);

        if stderr.contains("Unsupported URL") || stderr.contains("is not a valid URL") {
            return Self::UnsupportedUrl(excerpt);
        }

        if stderr.contains("Video unavailable")
            || stderr.contains("Private video")
            || stderr.contains("This video has been removed")
        {
            return Self::Unavailable(excerpt);
        }

        Self::Probe(excerpt)
    }
}

/// Choice-set construction and token decoding failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// No descriptor survived filtering
    #[error("No downloadable formats")]
    NoFormats,

    /// Callback data that we never issued
    #[error("Invalid selection token: {0}")]
    InvalidToken(String),
}

/// Fetch, merge or transcode failed
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Staging directory could not be created
    #[error("Cannot prepare staging directory: {0}")]
    Staging(#[source] std::io::Error),

    /// yt-dlp binary could not be started
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// yt-dlp exited non-zero (download, merge or transcode error)
    #[error("yt-dlp failed: {0}")]
    Failed(String),

    /// yt-dlp reported success but no output file exists
    #[error("Downloaded file not found")]
    OutputMissing,
}

/// Opaque failure reported by the chat transport
#[derive(Debug, Error)]
#[error("Transport error: {0}")]
pub struct TransportError(pub String);

/// Artifact could not be handed to the chat transport
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Artifact is larger than the transport accepts; already discarded
    #[error("File too large: {size} bytes")]
    SizeLimitExceeded { size: u64 },

    /// Artifact metadata could not be read
    #[error("Cannot read artifact: {0}")]
    Io(#[from] std::io::Error),

    /// Upload was attempted and failed; artifact already discarded
    #[error("Upload failed: {0}")]
    Upload(#[from] TransportError),
}

/// Everything that can end a single chat interaction
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
