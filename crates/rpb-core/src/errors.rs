use crate::transport::types::TransportErrorKind;

/// Core error type.
///
/// Adapter crates map their specific errors into this type so the core can
/// classify transport failures without looking at message text.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Structured transport kind, if this error came from the transport.
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Error::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
