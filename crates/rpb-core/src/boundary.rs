//! Discover the current message-id watermark of a channel.
//!
//! There is no "last message id" call in the Bot API, so we post a throwaway
//! message silently, note the id Telegram assigned, and delete it again.

use tracing::{debug, warn};

use crate::{
    domain::{ChatId, MessageId},
    transport::port::ChannelTransport,
    Result,
};

/// Returns the inclusive upper bound for probing `channel`.
///
/// A failed send aborts discovery. A failed delete is only logged: the id is
/// valid either way.
pub async fn discover_boundary(
    transport: &dyn ChannelTransport,
    channel: ChatId,
    probe_text: &str,
) -> Result<MessageId> {
    let temp = transport.send_silent(channel, probe_text).await?;
    debug!(%channel, message = %temp.message_id, "boundary message posted");

    if let Err(e) = transport.delete_message(temp).await {
        warn!(
            %channel,
            message = %temp.message_id,
            "failed to delete boundary message: {e}"
        );
    }

    Ok(temp.message_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeTransport;

    #[tokio::test]
    async fn returns_temp_id_and_deletes_it() {
        let t = FakeTransport::new().with_boundary(57);
        let b = discover_boundary(&t, ChatId(-100), "probe").await.unwrap();
        assert_eq!(b, MessageId(57));
        assert_eq!(t.silent_sends(), vec![(ChatId(-100), "probe".to_string())]);
        assert_eq!(t.deletes().len(), 1);
        assert_eq!(t.deletes()[0].message_id, MessageId(57));
    }

    #[tokio::test]
    async fn delete_failure_still_yields_boundary() {
        let t = FakeTransport::new().with_boundary(9);
        t.fail_delete(true);
        let b = discover_boundary(&t, ChatId(-100), "probe").await.unwrap();
        assert_eq!(b, MessageId(9));
        assert!(t.deletes().is_empty());
    }

    #[tokio::test]
    async fn send_failure_aborts() {
        let t = FakeTransport::new();
        t.fail_send_silent(true);
        assert!(discover_boundary(&t, ChatId(-100), "probe").await.is_err());
        assert!(t.deletes().is_empty());
    }
}
