// In-memory collaborators for relay tests

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::downloader::errors::TransportError;
use crate::downloader::models::{ChoiceSet, MessageRef};
use crate::downloader::traits::ChatTransport;

/// Everything the relay asked the chat to do, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(MessageRef, String),
    Edit(MessageRef, String),
    Delete(MessageRef),
    Menu {
        message: MessageRef,
        title: String,
        tokens: Vec<String>,
    },
    /// Local upload; the flag records whether the file still existed at send time
    AudioFile(PathBuf, bool),
    VideoFile(PathBuf, bool),
    VideoUrl(String),
    PhotoUrl(String),
}

pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    next_id: AtomicI32,
    fail_uploads: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(100),
            fail_uploads: false,
        }
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::new()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    /// Final text of `message` after all edits
    pub fn last_text_of(&self, message: MessageRef) -> Option<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::Text(m, t) | Sent::Edit(m, t) if *m == message => Some(t.clone()),
                _ => None,
            })
            .last()
    }

    pub fn uploads(&self) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|s| {
                matches!(
                    s,
                    Sent::AudioFile(..) | Sent::VideoFile(..) | Sent::VideoUrl(_) | Sent::PhotoUrl(_)
                )
            })
            .count()
    }

    fn next_ref(&self) -> MessageRef {
        MessageRef(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn upload(&self, record: Sent) -> Result<(), TransportError> {
        self.sent.lock().push(record);
        if self.fail_uploads {
            return Err(TransportError("upload timed out".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, text: &str) -> Result<MessageRef, TransportError> {
        let message = self.next_ref();
        self.sent.lock().push(Sent::Text(message, text.to_string()));
        Ok(message)
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError> {
        self.sent.lock().push(Sent::Edit(message, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), TransportError> {
        self.sent.lock().push(Sent::Delete(message));
        Ok(())
    }

    async fn send_choice_set(
        &self,
        title: &str,
        choices: &ChoiceSet,
    ) -> Result<MessageRef, TransportError> {
        let message = self.next_ref();
        self.sent.lock().push(Sent::Menu {
            message,
            title: title.to_string(),
            tokens: choices.entries().iter().map(|e| e.token.clone()).collect(),
        });
        Ok(message)
    }

    async fn send_audio_file(&self, path: &Path) -> Result<(), TransportError> {
        self.upload(Sent::AudioFile(path.to_path_buf(), path.exists()))
    }

    async fn send_video_file(&self, path: &Path) -> Result<(), TransportError> {
        self.upload(Sent::VideoFile(path.to_path_buf(), path.exists()))
    }

    async fn send_video_url(&self, url: &str) -> Result<(), TransportError> {
        self.upload(Sent::VideoUrl(url.to_string()))
    }

    async fn send_photo_url(&self, url: &str) -> Result<(), TransportError> {
        self.upload(Sent::PhotoUrl(url.to_string()))
    }
}
