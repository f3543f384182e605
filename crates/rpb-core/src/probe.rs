//! Indirect existence check for a single message slot.
//!
//! Telegram has no "does message N exist" call. Forwarding the message to the
//! bot itself answers the question: the forward either succeeds, or fails with
//! "bots can't send messages to bots" (the message exists, the recipient is
//! just unreachable), or fails with "message to forward not found".

use crate::{
    domain::MessageRef,
    transport::{port::ChannelTransport, types::TransportErrorKind},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    Exists,
    Absent,
    /// Any other failure. Not evidence of existence nor of absence.
    Unknown(String),
}

pub async fn probe(transport: &dyn ChannelTransport, msg: MessageRef) -> ProbeOutcome {
    match transport.forward_to_self(msg).await {
        Ok(()) => ProbeOutcome::Exists,
        Err(e) => match e.transport_kind() {
            Some(TransportErrorKind::BotRecipient) => ProbeOutcome::Exists,
            Some(TransportErrorKind::SourceNotFound) => ProbeOutcome::Absent,
            _ => ProbeOutcome::Unknown(e.to_string()),
        },
    }
}
