//! Admin channels the bot knows about, and the operator chat for notices.

use tokio::sync::RwLock;

use crate::domain::ChatId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminChannel {
    pub id: ChatId,
    pub title: Option<String>,
}

impl AdminChannel {
    /// Title if known, numeric id otherwise.
    pub fn label(&self) -> String {
        match &self.title {
            Some(t) if !t.trim().is_empty() => t.clone(),
            _ => self.id.to_string(),
        }
    }
}

/// Channels where the bot is an administrator. Grows only.
#[derive(Debug, Default)]
pub struct AdminChannels {
    inner: RwLock<Vec<AdminChannel>>,
}

impl AdminChannels {
    pub fn with_ids(ids: &[i64]) -> Self {
        let mut list: Vec<AdminChannel> = Vec::with_capacity(ids.len());
        for &id in ids {
            if list.iter().any(|c| c.id.0 == id) {
                continue;
            }
            list.push(AdminChannel {
                id: ChatId(id),
                title: None,
            });
        }
        Self {
            inner: RwLock::new(list),
        }
    }

    /// Register a channel. Returns `true` if it was not known before.
    ///
    /// Re-registering a known channel only fills in a missing title.
    pub async fn register(&self, id: ChatId, title: Option<String>) -> bool {
        let mut list = self.inner.write().await;
        if let Some(existing) = list.iter_mut().find(|c| c.id == id) {
            if title.is_some() {
                existing.title = title;
            }
            return false;
        }
        list.push(AdminChannel { id, title });
        true
    }

    pub async fn contains(&self, id: ChatId) -> bool {
        self.inner.read().await.iter().any(|c| c.id == id)
    }

    pub async fn get(&self, id: ChatId) -> Option<AdminChannel> {
        self.inner.read().await.iter().find(|c| c.id == id).cloned()
    }

    pub async fn ids(&self) -> Vec<ChatId> {
        self.inner.read().await.iter().map(|c| c.id).collect()
    }

    pub async fn snapshot(&self) -> Vec<AdminChannel> {
        self.inner.read().await.clone()
    }
}

/// Chat that receives refresh notices.
///
/// A configured chat is pinned; otherwise the last chat that opened the menu
/// wins.
#[derive(Debug, Default)]
pub struct OperatorChat {
    pinned: Option<ChatId>,
    last_seen: RwLock<Option<ChatId>>,
}

impl OperatorChat {
    pub fn new(pinned: Option<ChatId>) -> Self {
        Self {
            pinned,
            last_seen: RwLock::new(None),
        }
    }

    pub async fn remember(&self, chat: ChatId) {
        *self.last_seen.write().await = Some(chat);
    }

    pub async fn get(&self) -> Option<ChatId> {
        if self.pinned.is_some() {
            return self.pinned;
        }
        *self.last_seen.read().await
    }
}
