//! Per-channel list of message ids known to exist.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use tokio::sync::RwLock;

use crate::domain::{ChatId, MessageId};

#[derive(Clone, Debug)]
struct CacheEntry {
    messages: Vec<MessageId>,
    refreshed_at: DateTime<Local>,
}

/// Summary of a cached channel, for status reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryInfo {
    pub count: usize,
    pub refreshed_at: DateTime<Local>,
}

/// Shared cache: channel id → confirmed message ids.
///
/// Readers never see a half-built list: a refresh builds its list privately
/// and swaps it in with a single [`ChannelCache::replace`].
#[derive(Debug, Default)]
pub struct ChannelCache {
    entries: RwLock<HashMap<ChatId, CacheEntry>>,
}

impl ChannelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached ids for `channel`; empty if it was never refreshed.
    pub async fn read(&self, channel: ChatId) -> Vec<MessageId> {
        self.entries
            .read()
            .await
            .get(&channel)
            .map(|e| e.messages.clone())
            .unwrap_or_default()
    }

    /// Overwrite the entry for `channel`. Last writer wins.
    pub async fn replace(&self, channel: ChatId, messages: Vec<MessageId>) {
        let entry = CacheEntry {
            messages,
            refreshed_at: Local::now(),
        };
        self.entries.write().await.insert(channel, entry);
    }

    pub async fn info(&self, channel: ChatId) -> Option<EntryInfo> {
        self.entries.read().await.get(&channel).map(|e| EntryInfo {
            count: e.messages.len(),
            refreshed_at: e.refreshed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ids(v: &[i32]) -> Vec<MessageId> {
        v.iter().copied().map(MessageId).collect()
    }

    #[tokio::test]
    async fn missing_channel_reads_empty() {
        let cache = ChannelCache::new();
        assert!(cache.read(ChatId(-1)).await.is_empty());
        assert!(cache.info(ChatId(-1)).await.is_none());
    }

    #[tokio::test]
    async fn replace_overwrites_without_merging() {
        let cache = ChannelCache::new();
        cache.replace(ChatId(-1), ids(&[1, 2, 3])).await;
        cache.replace(ChatId(-1), ids(&[7])).await;
        assert_eq!(cache.read(ChatId(-1)).await, ids(&[7]));

        cache.replace(ChatId(-1), Vec::new()).await;
        assert!(cache.read(ChatId(-1)).await.is_empty());
        assert_eq!(cache.info(ChatId(-1)).await.map(|i| i.count), Some(0));
    }

    #[tokio::test]
    async fn channels_are_independent() {
        let cache = ChannelCache::new();
        cache.replace(ChatId(-1), ids(&[1])).await;
        cache.replace(ChatId(-2), ids(&[5, 6])).await;
        assert_eq!(cache.read(ChatId(-1)).await, ids(&[1]));
        assert_eq!(cache.info(ChatId(-2)).await.map(|i| i.count), Some(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_only_ever_see_whole_lists() {
        let cache = Arc::new(ChannelCache::new());
        let small: Vec<MessageId> = (1..=10).map(MessageId).collect();
        let large: Vec<MessageId> = (1..=5000).map(MessageId).collect();
        cache.replace(ChatId(-1), small.clone()).await;

        let writer = {
            let cache = cache.clone();
            let (small, large) = (small.clone(), large.clone());
            tokio::spawn(async move {
                for i in 0..200 {
                    let next = if i % 2 == 0 { large.clone() } else { small.clone() };
                    cache.replace(ChatId(-1), next).await;
                    tokio::task::yield_now().await;
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            let (small, large) = (small.clone(), large.clone());
            readers.push(tokio::spawn(async move {
                for _ in 0..200 {
                    let seen = cache.read(ChatId(-1)).await;
                    assert!(seen == small || seen == large, "partial list observed");
                    tokio::task::yield_now().await;
                }
            }));
        }

        writer.await.unwrap();
        for r in readers {
            r.await.unwrap();
        }
    }
}
