// Pending requests: which URL a user's quality menu refers to
//
// A new link from the same user overwrites the previous entry. Entries expire
// after the configured TTL, and the store never holds more than `capacity`
// entries (oldest evicted first).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::downloader::models::MessageRef;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;

/// Conversation identity: one user in one chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub chat_id: i64,
    pub user_id: u64,
}

/// URL awaiting a quality choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub url: String,
    /// Menu message the choice buttons are attached to
    pub menu: MessageRef,
    created_at: Instant,
}

impl PendingRequest {
    pub fn new(url: impl Into<String>, menu: MessageRef) -> Self {
        Self {
            url: url.into(),
            menu,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

pub struct SessionStore {
    entries: Mutex<HashMap<SessionKey, PendingRequest>>,
    ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Record the pending request for `key`, replacing any earlier one
    pub fn remember(&self, key: SessionKey, request: PendingRequest) -> Option<PendingRequest> {
        let mut entries = self.entries.lock();

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let ttl = self.ttl;
            entries.retain(|_, r| !r.is_expired(ttl));

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, r)| r.created_at)
                    .map(|(k, _)| *k);
                if let Some(oldest) = oldest {
                    debug!(?oldest, "Session store full, evicting oldest entry");
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(key, request)
    }

    /// Current pending request for `key`; reading does not consume it
    pub fn get(&self, key: &SessionKey) -> Option<PendingRequest> {
        let mut entries = self.entries.lock();

        match entries.get(key) {
            Some(request) if request.is_expired(self.ttl) => {
                entries.remove(key);
                None
            }
            Some(request) => Some(request.clone()),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL, DEFAULT_SESSION_CAPACITY)
    }
}
