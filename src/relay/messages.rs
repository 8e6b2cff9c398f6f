// User-facing texts

use crate::downloader::errors::{DeliveryError, RelayError, ResolutionError, SelectionError};
use crate::downloader::utils::size_in_mb;

pub const GREETING: &str = "Send me a YouTube or Pinterest link.";
pub const LOOKING_UP: &str = "Looking up formats... 🧐";
pub const LOOKUP_FAILED: &str = "Could not read that YouTube link.";
pub const NO_FORMATS: &str = "No formats found.";
pub const FETCHING_DIRECT: &str = "Fetching from Pinterest... 📌";
pub const MEDIA_NOT_FOUND: &str = "Media not found.";
pub const DIRECT_FAILED: &str = "Download failed.";
pub const DOWNLOADING: &str = "Downloading and merging (this may take a while)... ⏳";
pub const UPLOADING: &str = "Uploading to Telegram... 🚀";
pub const FETCH_FAILED: &str = "Download or upload failed.";
pub const SESSION_EXPIRED: &str = "This request has expired, send the link again.";
pub const STALE_MENU: &str = "This menu is outdated, send the link again.";

pub fn oversize(size: u64) -> String {
    format!(
        "⚠️ File is too large ({} MB). Telegram does not allow bots to send files over 50 MB.",
        size_in_mb(size)
    )
}

impl RelayError {
    /// The one line shown to the user when an interaction ends with this error.
    ///
    /// `None` means the interaction is dropped silently (forged or stale
    /// callback data).
    pub fn user_message(&self) -> Option<String> {
        let text = match self {
            RelayError::Resolution(ResolutionError::NoDescriptors)
            | RelayError::Selection(SelectionError::NoFormats) => NO_FORMATS.to_string(),
            RelayError::Resolution(ResolutionError::MediaNotFound) => MEDIA_NOT_FOUND.to_string(),
            RelayError::Resolution(
                ResolutionError::PageFetch(_) | ResolutionError::InvalidPageState(_),
            ) => DIRECT_FAILED.to_string(),
            RelayError::Resolution(_) => LOOKUP_FAILED.to_string(),
            RelayError::Selection(SelectionError::InvalidToken(_)) => return None,
            RelayError::Delivery(DeliveryError::SizeLimitExceeded { size }) => oversize(*size),
            RelayError::Acquisition(_) | RelayError::Delivery(_) | RelayError::Transport(_) => {
                FETCH_FAILED.to_string()
            }
        };
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::errors::{AcquisitionError, TransportError};
    use crate::downloader::models::SIZE_LIMIT;

    #[test]
    fn test_oversize_text() {
        assert_eq!(
            oversize(60 * 1024 * 1024),
            "⚠️ File is too large (60 MB). Telegram does not allow bots to send files over 50 MB."
        );
        assert!(oversize(SIZE_LIMIT + 1).contains("(49 MB)"));
    }

    #[test]
    fn test_user_messages() {
        let cases: Vec<(RelayError, Option<&str>)> = vec![
            (ResolutionError::NoDescriptors.into(), Some(NO_FORMATS)),
            (SelectionError::NoFormats.into(), Some(NO_FORMATS)),
            (ResolutionError::Unavailable("gone".into()).into(), Some(LOOKUP_FAILED)),
            (ResolutionError::ToolNotFound("yt-dlp".into()).into(), Some(LOOKUP_FAILED)),
            (ResolutionError::MediaNotFound.into(), Some(MEDIA_NOT_FOUND)),
            (AcquisitionError::OutputMissing.into(), Some(FETCH_FAILED)),
            (
                DeliveryError::Upload(TransportError("timeout".into())).into(),
                Some(FETCH_FAILED),
            ),
            (SelectionError::InvalidToken("yt_x".into()).into(), None),
        ];

        for (err, expected) in cases {
            assert_eq!(err.user_message().as_deref(), expected, "{err}");
        }
    }

    #[test]
    fn test_invalid_page_state_is_direct_failure() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: RelayError = ResolutionError::InvalidPageState(json_err).into();
        assert_eq!(err.user_message().as_deref(), Some(DIRECT_FAILED));
    }
}
