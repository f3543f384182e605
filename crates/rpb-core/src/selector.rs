//! Uniform random pick of a cached post.

use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    cache::ChannelCache,
    domain::{ChatId, MessageRef},
    registry::AdminChannels,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Post(MessageRef),
    NoChannelsAvailable,
    /// The picked channel has nothing cached (yet).
    NoMessagesAvailable(ChatId),
}

pub struct PostSelector {
    channels: Arc<AdminChannels>,
    cache: Arc<ChannelCache>,
}

impl PostSelector {
    pub fn new(channels: Arc<AdminChannels>, cache: Arc<ChannelCache>) -> Self {
        Self { channels, cache }
    }

    /// Pick a channel, then a message in it, both uniformly.
    pub async fn select_random_post(&self) -> Selection {
        let mut rng = StdRng::from_os_rng();
        self.select_with(&mut rng).await
    }

    pub async fn select_with<R: Rng + Send>(&self, rng: &mut R) -> Selection {
        let channels = self.channels.ids().await;
        if channels.is_empty() {
            return Selection::NoChannelsAvailable;
        }
        let channel = channels[rng.random_range(0..channels.len())];

        let messages = self.cache.read(channel).await;
        if messages.is_empty() {
            return Selection::NoMessagesAvailable(channel);
        }
        let message_id = messages[rng.random_range(0..messages.len())];

        Selection::Post(MessageRef::new(channel, message_id))
    }
}
