use dashmap::DashMap;
use events::EventType;
use log::*;
use serde_json::Value;
use std::sync::Arc;

/// Callback invoked with an event's `data` payload.
pub type Listener = Arc<dyn Fn(Value) + Send + Sync>;

/// Listener registry keyed by event wire value.
///
/// Holds at most one listener per event type. Lookups clone the listener out
/// of the map before calling it, so a listener may register other listeners.
pub struct ListenerRegistry {
    listeners: DashMap<&'static str, Listener>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
        }
    }

    /// Register a listener, replacing any previous one for the same type.
    pub fn register<E: EventType>(&self, event_type: E, listener: Listener) {
        let key = event_type.value();
        if self.listeners.insert(key, listener).is_some() {
            debug!("Replaced listener for event type {}", key);
        }
    }

    pub fn get(&self, name: &str) -> Option<Listener> {
        self.listeners.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Invoke the listener registered for `name`, if any.
    ///
    /// Returns whether a listener was invoked.
    pub fn dispatch(&self, name: &str, data: Value) -> bool {
        match self.get(name) {
            Some(listener) => {
                listener(data);
                true
            }
            None => {
                trace!("No listener registered for event type {}", name);
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
