// Relay - one chat interaction from link to delivered media
//
// Two entry points, one per inbound event: a text message that may carry a
// link, and a button press on a quality menu. Each catches every error at its
// own boundary and turns it into a single line for the user.

pub mod delivery;
pub mod messages;
pub mod session;

#[cfg(test)]
mod fakes;

use tracing::{info, warn};

use crate::downloader::errors::{RelayError, ResolutionError};
use crate::downloader::extractors::VariantExtractor;
use crate::downloader::format_selector::FormatSelector;
use crate::downloader::models::{
    DirectMedia, ExtractionResult, FetchParams, MessageRef, ProviderKind, RequesterId,
};
use crate::downloader::orchestrator::Downloader;
use crate::downloader::traits::ChatTransport;
use crate::downloader::utils::find_link;

pub use delivery::{DeliveryGate, DeliveryOutcome};
pub use session::{PendingRequest, SessionKey, SessionStore};

/// How a text message was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// No supported link; the greeting was sent
    NoLink,
    /// Quality menu shown and remembered
    ChoicesPresented { count: usize },
    /// Remote media handed straight to the chat
    DirectDelivered,
    Failed,
}

/// How a menu button press was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Delivered(DeliveryOutcome),
    /// Token we never issued
    Ignored,
    Expired,
    Stale,
    Failed,
}

pub struct Relay {
    extractor: VariantExtractor,
    downloader: Downloader,
    gate: DeliveryGate,
    sessions: SessionStore,
}

impl Relay {
    pub fn new(extractor: VariantExtractor, downloader: Downloader, sessions: SessionStore) -> Self {
        Self {
            extractor,
            downloader,
            gate: DeliveryGate::new(),
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn handle_link(
        &self,
        transport: &dyn ChatTransport,
        key: SessionKey,
        text: &str,
    ) -> LinkOutcome {
        let target = find_link(text).and_then(|url| ProviderKind::detect(url).map(|p| (url, p)));

        let Some((url, provider)) = target else {
            if let Err(e) = transport.send_text(messages::GREETING).await {
                warn!(error = %e, "Failed to send greeting");
            }
            return LinkOutcome::NoLink;
        };

        info!(chat = key.chat_id, user = key.user_id, %provider, url, "Link received");

        match provider {
            ProviderKind::Structured => self.offer_choices(transport, key, url).await,
            ProviderKind::Direct => self.relay_direct(transport, url).await,
        }
    }

    pub async fn handle_selection(
        &self,
        transport: &dyn ChatTransport,
        key: SessionKey,
        menu: MessageRef,
        token: &str,
    ) -> SelectionOutcome {
        let params = match FormatSelector::resolve_token(token) {
            Ok(params) => params,
            Err(e) => {
                warn!(chat = key.chat_id, user = key.user_id, error = %e, "Ignoring callback");
                return SelectionOutcome::Ignored;
            }
        };

        let Some(pending) = self.sessions.get(&key) else {
            info!(chat = key.chat_id, user = key.user_id, "Selection without a pending request");
            self.say(transport, menu, messages::SESSION_EXPIRED).await;
            return SelectionOutcome::Expired;
        };

        if pending.menu != menu {
            info!(
                chat = key.chat_id,
                user = key.user_id,
                ?menu,
                current = ?pending.menu,
                "Selection from an outdated menu"
            );
            self.say(transport, menu, messages::STALE_MENU).await;
            return SelectionOutcome::Stale;
        }

        if let Err(e) = transport.edit_text(menu, messages::DOWNLOADING).await {
            warn!(error = %e, "Failed to update status message");
        }

        let requester = RequesterId(key.user_id);
        match self.fetch_and_deliver(transport, &pending.url, params, requester, menu).await {
            Ok(outcome) => SelectionOutcome::Delivered(outcome),
            Err(e) => {
                self.report(transport, menu, &e).await;
                SelectionOutcome::Failed
            }
        }
    }

    async fn offer_choices(
        &self,
        transport: &dyn ChatTransport,
        key: SessionKey,
        url: &str,
    ) -> LinkOutcome {
        let status = match transport.send_text(messages::LOOKING_UP).await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Failed to send status message");
                return LinkOutcome::Failed;
            }
        };

        match self.present_choices(transport, key, url).await {
            Ok(count) => {
                if let Err(e) = transport.delete_message(status).await {
                    warn!(error = %e, "Failed to remove status message");
                }
                LinkOutcome::ChoicesPresented { count }
            }
            Err(e) => {
                self.report(transport, status, &e).await;
                LinkOutcome::Failed
            }
        }
    }

    async fn present_choices(
        &self,
        transport: &dyn ChatTransport,
        key: SessionKey,
        url: &str,
    ) -> Result<usize, RelayError> {
        let probe = match self.extractor.extract(url, ProviderKind::Structured).await? {
            ExtractionResult::Variants(probe) => probe,
            ExtractionResult::Direct(_) => return Err(ResolutionError::NoDescriptors.into()),
        };

        let choices = FormatSelector::build_choice_set(&probe.descriptors)?;
        let menu = transport.send_choice_set(&probe.title, &choices).await?;

        if self.sessions.remember(key, PendingRequest::new(url, menu)).is_some() {
            info!(chat = key.chat_id, user = key.user_id, "Replaced earlier pending request");
        }
        Ok(choices.len())
    }

    async fn relay_direct(&self, transport: &dyn ChatTransport, url: &str) -> LinkOutcome {
        let status = match transport.send_text(messages::FETCHING_DIRECT).await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Failed to send status message");
                return LinkOutcome::Failed;
            }
        };

        match self.send_direct(transport, url).await {
            Ok(()) => {
                if let Err(e) = transport.delete_message(status).await {
                    warn!(error = %e, "Failed to remove status message");
                }
                LinkOutcome::DirectDelivered
            }
            Err(RelayError::Transport(e)) => {
                warn!(error = %e, url, "Direct media upload failed");
                self.say(transport, status, messages::DIRECT_FAILED).await;
                LinkOutcome::Failed
            }
            Err(e) => {
                self.report(transport, status, &e).await;
                LinkOutcome::Failed
            }
        }
    }

    async fn send_direct(&self, transport: &dyn ChatTransport, url: &str) -> Result<(), RelayError> {
        match self.extractor.extract(url, ProviderKind::Direct).await? {
            ExtractionResult::Direct(DirectMedia::Video(media)) => {
                transport.send_video_url(&media).await?
            }
            ExtractionResult::Direct(DirectMedia::Photo(media)) => {
                transport.send_photo_url(&media).await?
            }
            ExtractionResult::Variants(_) => return Err(ResolutionError::MediaNotFound.into()),
        }
        Ok(())
    }

    async fn fetch_and_deliver(
        &self,
        transport: &dyn ChatTransport,
        url: &str,
        params: FetchParams,
        requester: RequesterId,
        status: MessageRef,
    ) -> Result<DeliveryOutcome, RelayError> {
        let artifact = self.downloader.acquire(url, params, requester).await?;
        Ok(self.gate.deliver(transport, artifact, status).await?)
    }

    async fn report(&self, transport: &dyn ChatTransport, status: MessageRef, err: &RelayError) {
        warn!(error = %err, "Interaction failed");
        if let Some(text) = err.user_message() {
            self.say(transport, status, &text).await;
        }
    }

    /// Replace the status message with `text`, falling back to a new message
    async fn say(&self, transport: &dyn ChatTransport, status: MessageRef, text: &str) {
        if transport.edit_text(status, text).await.is_ok() {
            return;
        }
        if let Err(e) = transport.send_text(text).await {
            warn!(error = %e, "Failed to tell user");
        }
    }
}
