//! Channel error type.

use thiserror::Error;

/// Why a single send did not go through.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Credentials are missing or still placeholders; nothing was sent.
    #[error("{channel} channel is not configured: {reason}")]
    NotConfigured {
        channel: &'static str,
        reason: String,
    },

    /// The destination address cannot be used by this channel.
    #[error("invalid destination '{0}'")]
    InvalidDestination(String),

    /// The request never got a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider rejected message: status={status}, body={body}")]
    Rejected { status: u16, body: String },

    /// The outgoing message could not be built.
    #[error("failed to build message: {0}")]
    Build(String),
}

impl ChannelError {
    pub(crate) fn not_configured(channel: &'static str, reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            channel,
            reason: reason.into(),
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::NotConfigured { .. } | Self::InvalidDestination(_) | Self::Build(_) => false,
        }
    }
}

impl From<reqwest::Error> for ChannelError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
