use crate::error::Error;
use crate::message::Message;
use crate::transport::{Connection, SignalHandler, Transport, TransportSignal};
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use log::*;
use url::Url;

/// [`Transport`] backed by `eventsource-client`.
///
/// The client's built-in reconnection is turned off: the resumable source
/// decides when and where to reconnect. Headers are sent on every open, which
/// is how session credentials travel with the stream.
#[derive(Debug, Clone, Default)]
pub struct EventSourceTransport {
    headers: Vec<(String, String)>,
}

impl EventSourceTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request header sent on every connection.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Authenticate with a session cookie.
    pub fn with_session_cookie(self, session_id: &str) -> Self {
        self.with_header("Cookie", format!("id={}", session_id))
    }

    /// Authenticate with a bearer token.
    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_header("Authorization", format!("Bearer {}", token))
    }

    #[cfg(test)]
    pub(crate) fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

impl Transport for EventSourceTransport {
    fn open(&self, url: &Url, handler: SignalHandler) -> Result<Box<dyn Connection>, Error> {
        let mut builder = es::ClientBuilder::for_url(url.as_str())?
            .reconnect(es::ReconnectOptions::reconnect(false).build());
        for (name, value) in &self.headers {
            builder = builder.header(name, value)?;
        }
        let client = builder.build();

        let label = url.to_string();
        let task = tokio::spawn(async move {
            let mut stream = client.stream();

            loop {
                match stream.next().await {
                    Some(Ok(es::SSE::Event(event))) => {
                        handler(TransportSignal::Message(Message {
                            id: event.id,
                            data: Some(event.data),
                        }));
                    }
                    Some(Ok(es::SSE::Comment(_))) => {
                        // Comments are the server's keep-alive pings
                        handler(TransportSignal::Message(Message::ping()));
                    }
                    Some(Err(e)) => {
                        warn!("SSE error for {}: {:?}", label, e);
                        handler(TransportSignal::Error(format!("{:?}", e)));
                    }
                    None => {
                        debug!("SSE stream ended for {}", label);
                        break;
                    }
                }
            }
        });

        Ok(Box::new(EventSourceConnection { task }))
    }
}

struct EventSourceConnection {
    task: tokio::task::JoinHandle<()>,
}

impl Connection for EventSourceConnection {
    fn close(&mut self) {
        self.task.abort();
    }
}

impl Drop for EventSourceConnection {
    fn drop(&mut self) {
        self.task.abort();
    }
}
