// Common data models for the relay pipeline

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

/// Largest attachment the chat transport accepts from a bot (49 MiB)
pub const SIZE_LIMIT: u64 = 49 * 1024 * 1024;

/// How many resolutions are offered before the audio entry
pub const MAX_VIDEO_CHOICES: usize = 8;

/// Which kind of source a URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Exposes queryable stream metadata (YouTube via yt-dlp)
    Structured,
    /// Needs page scraping to find a single media URL (Pinterest)
    Direct,
}

impl ProviderKind {
    /// Pick the provider for a URL, or `None` if neither handles it
    pub fn detect(url: &str) -> Option<Self> {
        let parsed = url::Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);

        let is_domain = |domain: &str| host == domain || host.ends_with(&format!(".{}", domain));

        if is_domain("youtube.com") || is_domain("youtu.be") {
            return Some(Self::Structured);
        }

        // Pinterest runs on many country TLDs (pinterest.de, pinterest.co.uk, ...)
        if is_domain("pin.it")
            || host.split('.').any(|label| label == "pinterest")
        {
            return Some(Self::Direct);
        }

        None
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

/// Video or audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

/// One concrete thing the user can choose to receive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaVariant {
    pub provider: ProviderKind,
    /// Height in pixels; `None` for audio
    pub height: Option<u32>,
    /// Exact or approximate size in bytes
    pub approx_size: Option<u64>,
    pub kind: MediaKind,
}

/// Raw stream descriptor as reported by yt-dlp, one entry of `formats`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDescriptor {
    /// Format ID (e.g., "137", "140")
    #[serde(default)]
    pub format_id: String,
    /// File extension (mp4, webm, m4a)
    #[serde(default)]
    pub ext: String,
    /// Video height in pixels
    pub height: Option<u32>,
    /// Video codec (avc1, vp9, av01, none)
    pub vcodec: Option<String>,
    /// Audio codec (mp4a, opus, none)
    pub acodec: Option<String>,
    /// File size in bytes
    #[serde(default, deserialize_with = "lenient_size")]
    pub filesize: Option<u64>,
    /// Approximate file size (when exact is unknown)
    #[serde(default, deserialize_with = "lenient_size")]
    pub filesize_approx: Option<u64>,
}

/// yt-dlp sometimes reports sizes as floats; anything non-numeric is unknown
fn lenient_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f as u64))))
}

impl StreamDescriptor {
    /// Get effective file size (exact or approximate)
    pub fn effective_size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }

    /// Whether the stream carries a video track
    pub fn has_video(&self) -> bool {
        self.vcodec
            .as_deref()
            .is_some_and(|v| v != "none" && !v.is_empty())
    }
}

/// Result of a metadata query against the structured provider
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub title: String,
    /// Descriptors in source order (worst to best)
    pub descriptors: Vec<StreamDescriptor>,
}

/// The single media item resolved from a direct-provider page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectMedia {
    Video(String),
    Photo(String),
}

/// What the Variant Extractor hands back
#[derive(Debug, Clone)]
pub enum ExtractionResult {
    Variants(ProbeResult),
    Direct(DirectMedia),
}

/// One button of the choice set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceEntry {
    pub label: String,
    /// Callback data, e.g. `yt_720` or `yt_audio`
    pub token: String,
    pub variant: MediaVariant,
}

/// Ordered options shown to the user, best resolution first, audio last
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceSet {
    entries: Vec<ChoiceEntry>,
}

impl ChoiceSet {
    pub(crate) fn new(entries: Vec<ChoiceEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ChoiceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }
}

/// Fetch parameters reconstructed from a selection token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchParams {
    /// Best audio, transcoded to MP3
    Audio,
    /// Best video not taller than `max_height`, merged with best audio
    Video { max_height: u32 },
}

impl FetchParams {
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Audio => MediaKind::Audio,
            Self::Video { .. } => MediaKind::Video,
        }
    }
}

/// Identity of the user that asked for a download; namespaces artifact names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequesterId(pub u64);

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a message previously sent into the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef(pub i32);

/// Locally downloaded file awaiting delivery
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    kind: MediaKind,
}

impl Artifact {
    pub fn new(path: PathBuf, kind: MediaKind) -> Self {
        Self { path, kind }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Remove the file from the staging directory
    pub async fn discard(self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Artifact removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove artifact")
            }
        }
    }
}
