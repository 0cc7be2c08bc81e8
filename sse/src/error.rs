//! Error types for the `sse` crate.
//!
//! Follows the same pattern as the other workspace crates: a root Error struct
//! holding an error kind and an optional source for error chaining.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for the event stream client.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in the event stream client.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The endpoint URL is empty or not absolute.
    InvalidUrl,
    /// A source was created outside of a Tokio runtime.
    NoRuntime,
    /// The transport could not open a connection.
    Transport,
    /// An inbound message body could not be interpreted.
    Payload(PayloadErrorKind),
}

/// Ways an inbound message body can be malformed.
#[derive(Debug, PartialEq)]
pub enum PayloadErrorKind {
    InvalidJson,
    MissingData,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::InvalidUrl => write!(f, "Invalid event stream URL")?,
            ErrorKind::NoRuntime => write!(f, "No Tokio runtime available")?,
            ErrorKind::Transport => write!(f, "Transport error")?,
            ErrorKind::Payload(kind) => write!(f, "Malformed payload: {:?}", kind)?,
        }
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::InvalidUrl,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Payload(PayloadErrorKind::InvalidJson),
        }
    }
}

impl From<eventsource_client::Error> for Error {
    fn from(err: eventsource_client::Error) -> Self {
        Error {
            source: Some(format!("{:?}", err).into()),
            error_kind: ErrorKind::Transport,
        }
    }
}

/// Helper function to create URL errors.
pub fn url_error(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::InvalidUrl,
    }
}

/// Helper function to create transport errors.
pub fn transport_error(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Transport,
    }
}

/// Helper function to create payload errors.
pub fn payload_error(kind: PayloadErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Payload(kind),
    }
}
