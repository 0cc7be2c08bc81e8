//! Event-type registries for the Business Elements event streams.
//!
//! Every server push on a Business Elements stream carries a JSON body of the
//! shape `{"name": "<wire value>", "data": {...}}`. The `name` field selects
//! which listener receives `data`. This crate names those wire values.
//!
//! # Architecture
//!
//! - **EventType**: Trait exposing the wire string of an event-type constant
//! - **One enum per stream domain**: Closed sets of event types for the
//!   project-context, bout and activity streams, plus the connection
//!   lifecycle events shared by all of them
//!
//! This crate has no dependencies on internal crates so both the stream
//! client and tooling can depend on it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire value of the connection-established event.
///
/// Every stream sends this event first; its payload carries the server's
/// keep-alive `timeout` in milliseconds.
pub const CONNECTED: &str = "connected";

/// Trait for getting the wire name of an event type.
pub trait EventType {
    fn value(&self) -> &'static str;
}

impl<T: EventType + ?Sized> EventType for &T {
    fn value(&self) -> &'static str {
        (**self).value()
    }
}

/// Generates the enum boilerplate shared by every registry: the `EventType`
/// impl, a `Display` impl, the full variant list and reverse lookup.
macro_rules! registry {
    ($name:ident { $($variant:ident => $wire:expr),+ $(,)? }) => {
        impl $name {
            const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Every event type of this stream domain.
            pub fn all() -> &'static [$name] {
                Self::ALL
            }

            /// Looks up the event type with the given wire value.
            pub fn from_value(value: &str) -> Option<$name> {
                Self::ALL.iter().copied().find(|event| event.value() == value)
            }
        }

        impl EventType for $name {
            fn value(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.value())
            }
        }
    };
}

/// Connection lifecycle events common to all streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionEvent {
    Connected,
}

registry!(ConnectionEvent {
    Connected => CONNECTED,
});

/// Events on a project context stream: collaborators' cursor positions and
/// cell/value mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectContextEvent {
    Connected,
    Cursor,
    Value,
    Cell,
}

registry!(ProjectContextEvent {
    Connected => CONNECTED,
    Cursor => "cursor",
    Value => "value",
    Cell => "cell",
});

/// Events on a bout stream (a live editing session on one context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoutEvent {
    Connected,
    Joined,
    Left,
    Cursor,
    Value,
}

registry!(BoutEvent {
    Connected => CONNECTED,
    Joined => "joined",
    Left => "left",
    Cursor => "cursor",
    Value => "value",
});

/// Events on a tenant's activity stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStreamEvent {
    Connected,
    Activity,
}

registry!(ActivityStreamEvent {
    Connected => CONNECTED,
    Activity => "activity",
});
