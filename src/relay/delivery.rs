// Delivery gate - size check, upload, cleanup
//
// The gate owns the artifact from here on: it is removed from the staging
// directory on every path out of `deliver`.

use tracing::{info, warn};

use super::messages::UPLOADING;
use crate::downloader::errors::DeliveryError;
use crate::downloader::models::{Artifact, MediaKind, MessageRef, SIZE_LIMIT};
use crate::downloader::traits::ChatTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub size: u64,
    pub kind: MediaKind,
}

#[derive(Debug, Default)]
pub struct DeliveryGate;

impl DeliveryGate {
    pub fn new() -> Self {
        Self
    }

    /// Reject anything strictly larger than the transport ceiling
    pub fn check_size(&self, size: u64) -> Result<(), DeliveryError> {
        if size > SIZE_LIMIT {
            return Err(DeliveryError::SizeLimitExceeded { size });
        }
        Ok(())
    }

    /// Upload `artifact` to the chat. `status` is the progress message, which
    /// is switched to the uploading text and removed once the upload lands.
    pub async fn deliver(
        &self,
        transport: &dyn ChatTransport,
        artifact: Artifact,
        status: MessageRef,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let size = match tokio::fs::metadata(artifact.path()).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                artifact.discard().await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.check_size(size) {
            warn!(path = %artifact.path().display(), size, "Artifact exceeds upload limit");
            artifact.discard().await;
            return Err(e);
        }

        if let Err(e) = transport.edit_text(status, UPLOADING).await {
            warn!(error = %e, "Failed to update status message");
        }

        let kind = artifact.kind();
        let sent = match kind {
            MediaKind::Audio => transport.send_audio_file(artifact.path()).await,
            MediaKind::Video => transport.send_video_file(artifact.path()).await,
        };
        artifact.discard().await;
        sent?;

        info!(size, ?kind, "Artifact delivered");
        if let Err(e) = transport.delete_message(status).await {
            warn!(error = %e, "Failed to remove status message");
        }

        Ok(DeliveryOutcome { size, kind })
    }
}
