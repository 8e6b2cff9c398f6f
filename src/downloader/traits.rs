// Collaborator seams: download backend and chat transport

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::errors::{AcquisitionError, TransportError};
use super::models::{ChoiceSet, FetchParams, MessageRef};

/// One fetch job handed to a backend
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub url: String,
    pub params: FetchParams,
    /// Output template, e.g. `downloads/42_%(title)s.%(ext)s`
    pub output_template: String,
}

/// Trait for downloader backend implementations
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Download (and merge or transcode) the job, returning the final file path
    async fn fetch(&self, job: &FetchJob) -> Result<PathBuf, AcquisitionError>;
}

/// Outbound side of one chat conversation
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<MessageRef, TransportError>;

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError>;

    async fn delete_message(&self, message: MessageRef) -> Result<(), TransportError>;

    /// Send the quality menu headed by the media title
    async fn send_choice_set(
        &self,
        title: &str,
        choices: &ChoiceSet,
    ) -> Result<MessageRef, TransportError>;

    async fn send_audio_file(&self, path: &Path) -> Result<(), TransportError>;

    /// Upload a local video with the streaming-playback hint set
    async fn send_video_file(&self, path: &Path) -> Result<(), TransportError>;

    /// Let the chat platform fetch a remote video itself
    async fn send_video_url(&self, url: &str) -> Result<(), TransportError>;

    async fn send_photo_url(&self, url: &str) -> Result<(), TransportError>;
}
