//! Transport factory abstraction for server-push connections.
//!
//! The resumable source never talks to the network directly; it asks a
//! [`Transport`] to open a [`Connection`] and receives everything that
//! connection produces through a [`SignalHandler`].

use crate::error::Error;
use crate::message::Message;
use std::sync::Arc;
use url::Url;

/// Something a live connection reports to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportSignal {
    /// A server push, including keep-alive pings.
    Message(Message),
    /// The transport reported a failure. The connection may or may not recover.
    Error(String),
}

/// Receives every signal of one connection, in delivery order.
pub type SignalHandler = Arc<dyn Fn(TransportSignal) + Send + Sync>;

/// Opens streaming connections.
pub trait Transport: Send + Sync {
    /// Open a connection to `url`, delivering its signals to `handler`.
    ///
    /// Implementations must not call `handler` before returning.
    fn open(&self, url: &Url, handler: SignalHandler) -> Result<Box<dyn Connection>, Error>;
}

/// A live streaming connection.
pub trait Connection: Send {
    /// Tear the connection down. Must be safe to call more than once.
    fn close(&mut self);
}
