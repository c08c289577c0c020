//! Error types for icymeta
//!
//! Centralized error handling using thiserror. Every variant belongs to
//! exactly one [`Phase`] so callers can tell where a fetch failed.

use std::fmt;
use std::io;
use std::num::ParseIntError;

use thiserror::Error;

use crate::cancel::Cancelled;

/// Step of a title fetch that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Negotiate,
    Skip,
    Frame,
    Parse,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Negotiate => "negotiate",
            Phase::Skip => "skip",
            Phase::Frame => "frame",
            Phase::Parse => "parse",
        };
        f.write_str(name)
    }
}

/// Main error type for icymeta
#[derive(Error, Debug)]
pub enum IcyError {
    #[error("failed to create request for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: RequestCause,
    },

    #[error("failed to open {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: ConnectionCause,
    },

    #[error("failed to parse Icy-Metaint value '{value}': {reason}")]
    Protocol {
        value: String,
        #[source]
        reason: MetaintError,
    },

    #[error("failed to skip bytes: got {skipped} of {expected} audio bytes")]
    Skip {
        expected: usize,
        skipped: usize,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to read {expected} metadata bytes: {source}")]
    Framing {
        expected: usize,
        #[source]
        source: io::Error,
    },

    #[error("failed to match stream title in {text:?}")]
    TitleNotFound { text: String },

    #[error("metadata of {len} bytes does not fit in one block")]
    Oversized { len: usize },
}

impl IcyError {
    pub fn phase(&self) -> Phase {
        match self {
            IcyError::Request { .. } | IcyError::Connection { .. } | IcyError::Protocol { .. } => {
                Phase::Negotiate
            }
            IcyError::Skip { .. } => Phase::Skip,
            IcyError::Io(_) | IcyError::Framing { .. } | IcyError::Oversized { .. } => {
                Phase::Frame
            }
            IcyError::TitleNotFound { .. } => Phase::Parse,
        }
    }

    /// True when the call was aborted by its `CancelToken`.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation().is_some()
    }

    fn cancellation(&self) -> Option<Cancelled> {
        match self {
            IcyError::Connection {
                source: ConnectionCause::Cancelled(reason),
                ..
            } => Some(*reason),
            IcyError::Skip { source, .. }
            | IcyError::Framing { source, .. }
            | IcyError::Io(source) => Cancelled::from_io(source),
            _ => None,
        }
    }

    /// Cancellation observed mid-read surfaces as a connection failure for `url`.
    pub(crate) fn lift_cancellation(self, url: &str) -> Self {
        match self.cancellation() {
            Some(reason) => IcyError::Connection {
                url: url.to_string(),
                source: ConnectionCause::Cancelled(reason),
            },
            None => self,
        }
    }
}

/// Why a request could not be built
#[derive(Error, Debug)]
pub enum RequestCause {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("{0}")]
    Client(#[from] reqwest::Error),
}

/// Why a connection attempt did not produce a response
#[derive(Error, Debug)]
pub enum ConnectionCause {
    #[error("{}", friendly_network_error(.0))]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Why the `Icy-Metaint` header was unusable
#[derive(Error, Debug)]
pub enum MetaintError {
    #[error("header missing")]
    Missing,

    #[error("header is not visible ASCII")]
    NotText,

    #[error(transparent)]
    Invalid(#[from] ParseIntError),
}

/// Result type alias for icymeta
pub type Result<T> = std::result::Result<T, IcyError>;

fn friendly_network_error(e: &reqwest::Error) -> String {
    if e.is_connect() {
        if let Some(url) = e.url() {
            return format!("could not connect to {}", url.host_str().unwrap_or("server"));
        }
        return "could not connect to server".to_string();
    }
    if e.is_timeout() {
        return "connection timed out".to_string();
    }
    if e.is_decode() {
        return "invalid response from server".to_string();
    }
    format!("network error: {e}")
}
