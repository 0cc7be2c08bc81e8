use crate::error::{url_error, Error, ErrorKind};
use crate::keep_alive::KeepAlive;
use crate::listener::ListenerRegistry;
use crate::message::{Event, MalformedPayloadPolicy, Message};
use crate::transport::{Connection, SignalHandler, Transport, TransportSignal};
use events::{EventType, CONNECTED};
use log::*;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use url::Url;

/// Keep-alive deadline used until the server advertises its own.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_millis(31_000);

/// Query parameter carrying the last delivered event id on reconnect.
pub const LAST_EVENT_ID_PARAM: &str = "lastEventId";

/// Tunables for a [`ResumableEventSource`].
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Silence tolerated before reconnecting, until the server says otherwise.
    pub keep_alive: Duration,
    /// Reconnect as soon as the transport reports an error instead of waiting
    /// out the keep-alive deadline.
    pub reconnect_on_transport_error: bool,
    /// What to do with message bodies that cannot be decoded.
    pub malformed_payload: MalformedPayloadPolicy,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            keep_alive: DEFAULT_KEEP_ALIVE,
            reconnect_on_transport_error: false,
            malformed_payload: MalformedPayloadPolicy::default(),
        }
    }
}

impl SourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_reconnect_on_transport_error(mut self, enabled: bool) -> Self {
        self.reconnect_on_transport_error = enabled;
        self
    }

    pub fn with_malformed_payload(mut self, policy: MalformedPayloadPolicy) -> Self {
        self.malformed_payload = policy;
        self
    }
}

/// Lifecycle of a [`ResumableEventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Connecting,
    Connected,
    Reconnecting,
    Closed,
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceState::Connecting => write!(f, "connecting"),
            SourceState::Connected => write!(f, "connected"),
            SourceState::Reconnecting => write!(f, "reconnecting"),
            SourceState::Closed => write!(f, "closed"),
        }
    }
}

/// A server-push event stream that survives silent connection death.
///
/// The source opens its connection on construction and keeps a keep-alive
/// timer armed at all times. Every inbound message (including pings) pushes
/// the deadline back. If the deadline passes the connection is presumed dead:
/// it is closed and a new one is opened at the same URL, carrying
/// `lastEventId=<id>` when an event id has been seen so the server replays
/// what was missed.
///
/// Message bodies are JSON objects `{"name": ..., "data": ...}`; `data` goes
/// to the listener registered for `name` with [`ResumableEventSource::on`].
///
/// Must be created inside a Tokio runtime. Dropping the source closes it.
///
/// ```rust,ignore
/// use events::ProjectContextEvent;
/// use sse::{EventSourceTransport, ResumableEventSource};
/// use std::sync::Arc;
///
/// let transport = Arc::new(EventSourceTransport::new().with_session_cookie(&session));
/// let source = ResumableEventSource::new(&stream_url, transport)?;
/// source.on(ProjectContextEvent::Value, |data| println!("value changed: {data}"));
/// ```
pub struct ResumableEventSource {
    inner: Arc<Inner>,
}

struct Inner {
    url: Url,
    transport: Arc<dyn Transport>,
    config: SourceConfig,
    listeners: ListenerRegistry,
    runtime: Handle,
    state: Mutex<State>,
}

struct State {
    phase: SourceState,
    connection: Option<Box<dyn Connection>>,
    // Identifies the live connection; signals from older ones are dropped.
    generation: u64,
    last_event_id: Option<String>,
    keep_alive_deadline: Duration,
    keep_alive: KeepAlive,
}

impl ResumableEventSource {
    /// Open a source on `url` with the default configuration.
    pub fn new(url: &str, transport: Arc<dyn Transport>) -> Result<Self, Error> {
        Self::with_config(url, transport, SourceConfig::default())
    }

    pub fn with_config(
        url: &str,
        transport: Arc<dyn Transport>,
        config: SourceConfig,
    ) -> Result<Self, Error> {
        if url.trim().is_empty() {
            return Err(url_error("Event stream URL is empty"));
        }
        let url = Url::parse(url)?;
        if url.cannot_be_a_base() {
            return Err(url_error("Event stream URL must be absolute"));
        }
        let runtime = Handle::try_current().map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::NoRuntime,
        })?;

        let inner = Arc::new(Inner {
            url,
            transport,
            listeners: ListenerRegistry::new(),
            runtime,
            state: Mutex::new(State {
                phase: SourceState::Connecting,
                connection: None,
                generation: 0,
                last_event_id: None,
                keep_alive_deadline: config.keep_alive,
                keep_alive: KeepAlive::new(),
            }),
            config,
        });

        {
            let mut state = inner.lock_state();
            inner.open_connection(&mut state);
        }

        Ok(Self { inner })
    }

    /// Register `listener` for `event_type`, replacing any previous listener
    /// for the same type.
    pub fn on<E, F>(&self, event_type: E, listener: F)
    where
        E: EventType,
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.inner.listeners.register(event_type, Arc::new(listener));
    }

    /// Close the connection and cancel the keep-alive timer. Terminal.
    pub fn close(&self) {
        let mut state = self.inner.lock_state();
        if state.phase == SourceState::Closed {
            return;
        }
        state.phase = SourceState::Closed;
        state.keep_alive.cancel();
        if let Some(mut connection) = state.connection.take() {
            connection.close();
        }
        info!("Closed event stream {}", self.inner.url);
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn state(&self) -> SourceState {
        self.inner.lock_state().phase
    }

    pub fn last_event_id(&self) -> Option<String> {
        self.inner.lock_state().last_event_id.clone()
    }

    /// The deadline the next keep-alive timer will be armed with.
    pub fn keep_alive_deadline(&self) -> Duration {
        self.inner.lock_state().keep_alive_deadline
    }

    #[cfg(test)]
    fn keep_alive_armed(&self) -> bool {
        self.inner.lock_state().keep_alive.is_armed()
    }
}

impl Drop for ResumableEventSource {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for ResumableEventSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ResumableEventSource")
            .field("url", &self.inner.url.as_str())
            .field("state", &self.state())
            .field("last_event_id", &self.last_event_id())
            .finish()
    }
}

/// `base` with the resumption parameter appended when an id is known.
pub(crate) fn resume_url(base: &Url, last_event_id: Option<&str>) -> Url {
    let mut url = base.clone();
    if let Some(id) = last_event_id {
        url.query_pairs_mut().append_pair(LAST_EVENT_ID_PARAM, id);
    }
    url
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a connection, resuming from the last event id if there is one,
    /// and arm the keep-alive timer.
    fn open_connection(self: &Arc<Self>, state: &mut State) {
        let url = resume_url(&self.url, state.last_event_id.as_deref());
        state.generation += 1;
        let generation = state.generation;

        let weak: Weak<Inner> = Arc::downgrade(self);
        let handler: SignalHandler = Arc::new(move |signal: TransportSignal| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_signal(generation, signal);
            }
        });

        match self.transport.open(&url, handler) {
            Ok(connection) => {
                info!("Opened event stream {}", url);
                state.connection = Some(connection);
            }
            Err(e) => {
                // The keep-alive timer retries.
                error!("Failed to open event stream {}: {}", url, e);
                state.connection = None;
            }
        }

        state.phase = SourceState::Connected;
        self.arm_keep_alive(state);
    }

    fn arm_keep_alive(self: &Arc<Self>, state: &mut State) {
        let weak = Arc::downgrade(self);
        state
            .keep_alive
            .arm(&self.runtime, state.keep_alive_deadline, move |sequence| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_keep_alive_expired(sequence);
                }
            });
    }

    fn on_keep_alive_expired(self: &Arc<Self>, sequence: u64) {
        let mut state = self.lock_state();
        if state.phase == SourceState::Closed || !state.keep_alive.expire(sequence) {
            return;
        }
        warn!(
            "No traffic on {} for {:?}, reconnecting",
            self.url, state.keep_alive_deadline
        );
        self.reconnect(&mut state);
    }

    fn reconnect(self: &Arc<Self>, state: &mut State) {
        state.phase = SourceState::Reconnecting;
        if let Some(mut connection) = state.connection.take() {
            connection.close();
        }
        match &state.last_event_id {
            Some(id) => info!("Resuming event stream {} after event {}", self.url, id),
            None => info!("Resubscribing to event stream {}", self.url),
        }
        self.open_connection(state);
    }

    fn handle_signal(self: &Arc<Self>, generation: u64, signal: TransportSignal) {
        match signal {
            TransportSignal::Message(message) => self.dispatch(generation, message),
            TransportSignal::Error(reason) => {
                let mut state = self.lock_state();
                if state.phase == SourceState::Closed || state.generation != generation {
                    return;
                }
                warn!("Transport error on {}: {}", self.url, reason);
                if self.config.reconnect_on_transport_error {
                    self.reconnect(&mut state);
                }
            }
        }
    }

    fn dispatch(self: &Arc<Self>, generation: u64, message: Message) {
        {
            let mut state = self.lock_state();
            if state.phase == SourceState::Closed || state.generation != generation {
                trace!("Ignoring message from superseded connection to {}", self.url);
                return;
            }
            if let Some(id) = message.id.as_ref().filter(|id| !id.is_empty()) {
                state.last_event_id = Some(id.clone());
            }
            self.arm_keep_alive(&mut state);
        }

        let Some(body) = message.body() else {
            return;
        };

        let event = match Event::parse(body) {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(e) => {
                self.config
                    .malformed_payload
                    .report(self.url.as_str(), &e, body);
                return;
            }
        };

        if event.name == CONNECTED {
            if let Some(timeout) = event.advertised_timeout() {
                debug!("Server keep-alive for {} is {:?}", self.url, timeout);
                self.lock_state().keep_alive_deadline = timeout;
            }
        }

        trace!("Dispatching {} event from {}", event.name, self.url);
        self.listeners.dispatch(&event.name, event.data);
    }
}
