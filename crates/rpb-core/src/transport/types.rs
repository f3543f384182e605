use std::fmt;

/// Structured classification of a failed transport call.
///
/// The probe logic switches on this, never on error text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Delivery refused because the recipient is a bot.
    BotRecipient,
    /// The source message of a forward/copy does not exist.
    SourceNotFound,
    /// Flood control kicked in and the retry budget was spent.
    RateLimited,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportErrorKind::BotRecipient => "bot recipient",
            TransportErrorKind::SourceNotFound => "source not found",
            TransportErrorKind::RateLimited => "rate limited",
            TransportErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Inline keyboard attached to an outgoing message.
#[derive(Clone, Debug, Default)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

impl InlineKeyboard {
    /// Convenience for a single row of buttons.
    pub fn single_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }
}
