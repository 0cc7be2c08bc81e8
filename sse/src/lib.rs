//! Resumable Server-Sent Events client for Business Elements event streams.
//!
//! This crate keeps a typed event feed alive across silent connection drops
//! for the live collaboration streams (cursor positions, value and cell
//! mutations, activity feeds).
//!
//! # Architecture
//!
//! - **One connection per source**: A `ResumableEventSource` owns exactly one
//!   transport connection to its endpoint at a time.
//! - **Silence detection**: Every inbound message, including keep-alive pings,
//!   re-arms a single keep-alive timer. When it expires the connection is
//!   presumed dead and replaced.
//! - **Resumption**: The last delivered event id is kept across reconnects and
//!   sent back as `lastEventId`, so the server replays what was missed.
//! - **Typed dispatch**: Listeners are registered per event type from the
//!   `events` registries; one listener per type, later registrations win.
//! - **Injected transport**: Connections are opened through the `Transport`
//!   trait. `EventSourceTransport` is the network implementation.
//!
//! # Message Flow
//!
//! 1. The source opens `url` through its transport and arms the keep-alive timer
//! 2. Each message records its id and re-arms the timer
//! 3. A JSON body `{"name": ..., "data": ...}` is decoded and `data` handed to
//!    the listener registered for `name`
//! 4. A `connected` event's `timeout` becomes the deadline for future timers
//! 5. On expiry the connection is closed and reopened at
//!    `url?lastEventId=<last id>`
//!
//! # Modules
//!
//! - `source`: ResumableEventSource, its configuration and lifecycle states
//! - `transport`: Transport and Connection traits
//! - `eventsource`: Transport backed by `eventsource-client`
//! - `listener`: Listener registry keyed by event wire value
//! - `message`: Inbound messages, payload decoding and malformed-payload policy
//! - `error`: Error types

pub mod error;
pub mod eventsource;
mod keep_alive;
pub mod listener;
pub mod message;
pub mod source;
pub mod transport;

pub use error::{Error, ErrorKind};
pub use eventsource::EventSourceTransport;
pub use message::MalformedPayloadPolicy;
pub use source::{ResumableEventSource, SourceConfig, SourceState, DEFAULT_KEEP_ALIVE};
pub use transport::{Connection, Transport, TransportSignal};
