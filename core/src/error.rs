//! Error types for the PSG client.
//!
//! # Design
//! Two failure families reach the caller. `ConfigurationError` covers
//! requests and settings the client refuses before touching the network.
//! `TransportError` covers everything between sending the form and holding a
//! 200 body: non-OK statuses (with the code attached), timeouts, and other
//! network failures. Reply classification never fails, so there is no parse
//! error variant here.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error returned by `Psg` and `PsgClient`.
#[derive(Debug, Error)]
pub enum PsgError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to read default configuration {}: {source}", .path.display())]
    DefaultConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PsgError {
    /// The HTTP status code, when the failure was a non-OK reply.
    pub fn status(&self) -> Option<u16> {
        match self {
            PsgError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

/// Problems with what the caller asked for, detected locally.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("expecting either a configuration mapping or configuration text")]
    MissingConfig,

    #[error("default configuration path must be absolute: {}", .0.display())]
    RelativeDefaultConfigPath(PathBuf),

    #[error("invalid value for {name}: {value:?}")]
    InvalidSetting { name: String, value: String },
}

/// Failures of the HTTP round-trip.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The service answered with something other than 200.
    #[error("unexpected HTTP status code received from PSG: {status}")]
    Status { status: u16, body: String },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for timeouts and connection failures.
    pub fn is_network(&self) -> bool {
        !matches!(self, TransportError::Status { .. })
    }
}
