// FormatSelector - turns stream descriptors into the user-facing choice set
//
// Handles:
// - Best-to-worst ordering (yt-dlp lists formats worst first)
// - One entry per height, keeping the best encoding at that height
// - Size labels from exact or approximate byte counts
// - A trailing audio-only option, always present
// - Mapping callback tokens back to fetch parameters

use std::collections::HashSet;

use super::errors::SelectionError;
use super::models::{
    ChoiceEntry, ChoiceSet, FetchParams, MediaKind, MediaVariant, ProviderKind, StreamDescriptor,
    MAX_VIDEO_CHOICES,
};
use super::utils::size_in_mb;

/// Discriminator for structured-provider tokens
const TOKEN_PREFIX: &str = "yt";
const AUDIO_PAYLOAD: &str = "audio";
const AUDIO_LABEL: &str = "Audio (MP3)";

/// Format selector for the structured provider
pub struct FormatSelector;

impl FormatSelector {
    /// Build the choice set from descriptors in source (worst-to-best) order
    pub fn build_choice_set(descriptors: &[StreamDescriptor]) -> Result<ChoiceSet, SelectionError> {
        let mut seen_heights = HashSet::new();

        let mut picked: Vec<(u32, &StreamDescriptor)> = descriptors
            .iter()
            .rev()
            .filter(|d| d.has_video())
            .filter_map(|d| d.height.map(|h| (h, d)))
            .filter(|(height, _)| seen_heights.insert(*height))
            .collect();

        // Source order is not guaranteed to be sorted by height
        picked.sort_by(|a, b| b.0.cmp(&a.0));

        let mut entries: Vec<ChoiceEntry> = picked
            .into_iter()
            .take(MAX_VIDEO_CHOICES)
            .map(|(height, d)| Self::video_entry(height, d.effective_size()))
            .collect();

        if entries.is_empty() {
            return Err(SelectionError::NoFormats);
        }

        entries.push(Self::audio_entry());
        Ok(ChoiceSet::new(entries))
    }

    fn video_entry(height: u32, size: Option<u64>) -> ChoiceEntry {
        ChoiceEntry {
            label: format!("{}p ({})", height, Self::format_size(size)),
            token: Self::token_for(&FetchParams::Video { max_height: height }),
            variant: MediaVariant {
                provider: ProviderKind::Structured,
                height: Some(height),
                approx_size: size,
                kind: MediaKind::Video,
            },
        }
    }

    fn audio_entry() -> ChoiceEntry {
        ChoiceEntry {
            label: AUDIO_LABEL.to_string(),
            token: Self::token_for(&FetchParams::Audio),
            variant: MediaVariant {
                provider: ProviderKind::Structured,
                height: None,
                approx_size: None,
                kind: MediaKind::Audio,
            },
        }
    }

    /// Format file size for display
    fn format_size(bytes: Option<u64>) -> String {
        match bytes {
            Some(b) => format!("{} MB", size_in_mb(b)),
            None => "?".to_string(),
        }
    }

    /// Callback token for fetch parameters
    pub fn token_for(params: &FetchParams) -> String {
        match params {
            FetchParams::Audio => format!("{}_{}", TOKEN_PREFIX, AUDIO_PAYLOAD),
            FetchParams::Video { max_height } => format!("{}_{}", TOKEN_PREFIX, max_height),
        }
    }

    /// Decode a callback token back into fetch parameters
    pub fn resolve_token(token: &str) -> Result<FetchParams, SelectionError> {
        let invalid = || SelectionError::InvalidToken(token.to_string());

        let (discriminator, payload) = token.split_once('_').ok_or_else(invalid)?;
        if discriminator != TOKEN_PREFIX {
            return Err(invalid());
        }

        if payload.eq_ignore_ascii_case(AUDIO_PAYLOAD) {
            return Ok(FetchParams::Audio);
        }

        match payload.parse::<u32>() {
            Ok(max_height) if max_height > 0 => Ok(FetchParams::Video { max_height }),
            _ => Err(invalid()),
        }
    }
}
