//! Failures surfaced by the emulator bridge.
use thiserror::Error;

use crate::fetch::FetchError;

/// Everything that can keep a ROM from running on the emulation library.
///
/// The bridge treats all variants the same way: the message is logged, handed to the error
/// observer and the bridge switches to fallback rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("ROM not found at {url} (HTTP {status})")]
    NotFound { url: String, status: u16 },

    #[error("Failed to download ROM from {url}: {message}")]
    Network { url: String, message: String },

    #[error("ROM is malformed: {reason}")]
    Malformed { reason: String },

    #[error("Emulation library failed to start: {message}")]
    LibraryInit { message: String },

    #[error("Unsupported ROM format: {reason}")]
    UnsupportedFormat { reason: String },
}

impl BridgeError {
    pub fn from_fetch(url: &str, error: FetchError) -> Self {
        match error {
            FetchError::NotFound { status } => BridgeError::NotFound {
                url: url.to_string(),
                status,
            },
            FetchError::Network(message) => BridgeError::Network {
                url: url.to_string(),
                message,
            },
        }
    }

    pub fn library(message: impl Into<String>) -> Self {
        BridgeError::LibraryInit {
            message: message.into(),
        }
    }
}
