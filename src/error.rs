//! Error taxonomy shared by the clients, the dispatcher and the host.

use crate::config::ConfigError;

/// Bad user input. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A call to one of the remote services failed.
#[derive(Debug, thiserror::Error)]
pub enum RemoteServiceError {
    /// The service answered with a non-2xx status.
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The response body was not what we expected.
    #[error("{service} sent an unreadable response: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },
    /// A well-formed response with nothing usable in it.
    #[error("{service} returned an empty response")]
    Empty { service: &'static str },
}

impl RemoteServiceError {
    /// HTTP status code, when the service got far enough to send one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            Self::Decode { .. } | Self::Empty { .. } => None,
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            Self::Status { service, .. }
            | Self::Transport { service, .. }
            | Self::Decode { service, .. }
            | Self::Empty { service } => service,
        }
    }
}

/// Anything that can go wrong in the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
