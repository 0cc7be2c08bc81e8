use crate::error::{payload_error, Error, PayloadErrorKind};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A single server push as delivered by a transport.
///
/// `id` is the protocol-level event id used for resumption, `data` the raw
/// body. Keep-alive pings carry neither.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub id: Option<String>,
    pub data: Option<String>,
}

impl Message {
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            data: Some(data.into()),
        }
    }

    /// A keep-alive ping: no id, no body.
    pub fn ping() -> Self {
        Self::default()
    }

    /// The body, unless it is absent or blank.
    pub fn body(&self) -> Option<&str> {
        self.data.as_deref().filter(|data| !data.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    name: Option<String>,
    // `None` only when the key is absent; an explicit `null` is data.
    #[serde(default, deserialize_with = "present")]
    data: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A named event decoded from a message body.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub data: Value,
}

impl Event {
    /// Decodes a message body.
    ///
    /// Returns `Ok(None)` for a body without `name`, which the server sends as
    /// a keep-alive ping.
    pub fn parse(body: &str) -> Result<Option<Event>, Error> {
        let raw: RawPayload = serde_json::from_str(body)?;
        match (raw.name, raw.data) {
            (None, _) => Ok(None),
            (Some(name), Some(data)) => Ok(Some(Event { name, data })),
            (Some(name), None) => Err(payload_error(
                PayloadErrorKind::MissingData,
                &format!("event {name} has no data"),
            )),
        }
    }

    /// The keep-alive deadline advertised in a connection-established payload.
    pub fn advertised_timeout(&self) -> Option<Duration> {
        let timeout = self.data.get("timeout")?;
        let millis = match timeout.as_u64() {
            Some(millis) => millis,
            None => {
                let millis = timeout.as_f64().filter(|m| m.is_finite())?.round();
                if millis < 1.0 || millis > u64::MAX as f64 {
                    return None;
                }
                millis as u64
            }
        };
        (millis > 0).then(|| Duration::from_millis(millis))
    }
}

/// Callback receiving a malformed payload's error and raw body.
pub type MalformedPayloadHandler = Arc<dyn Fn(&Error, &str) + Send + Sync>;

/// What to do with a message body that cannot be decoded.
///
/// The stream always continues; the policy only decides who hears about it.
#[derive(Clone, Default)]
pub enum MalformedPayloadPolicy {
    /// Log at `warn` and drop the message.
    #[default]
    Log,
    /// Drop the message silently.
    Ignore,
    /// Hand the error and raw body to a callback, then drop the message.
    Notify(MalformedPayloadHandler),
}

impl MalformedPayloadPolicy {
    pub fn notify<F>(handler: F) -> Self
    where
        F: Fn(&Error, &str) + Send + Sync + 'static,
    {
        MalformedPayloadPolicy::Notify(Arc::new(handler))
    }

    pub(crate) fn report(&self, url: &str, err: &Error, body: &str) {
        match self {
            MalformedPayloadPolicy::Log => {
                log::warn!("Dropping malformed event from {}: {}", url, err);
            }
            MalformedPayloadPolicy::Ignore => {}
            MalformedPayloadPolicy::Notify(handler) => handler(err, body),
        }
    }
}

impl fmt::Debug for MalformedPayloadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MalformedPayloadPolicy::Log => write!(f, "Log"),
            MalformedPayloadPolicy::Ignore => write!(f, "Ignore"),
            MalformedPayloadPolicy::Notify(_) => write!(f, "Notify(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_body_treats_blank_data_as_absent() {
        assert_eq!(Message::ping().body(), None);
        let blank = Message {
            id: Some("3".to_string()),
            data: Some("  \n".to_string()),
        };
        assert_eq!(blank.body(), None);
        assert_eq!(Message::new("4", "{}").body(), Some("{}"));
    }

    #[test]
    fn test_parse_named_event() {
        let event = Event::parse(r#"{"name":"value","data":{"x":1}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event.name, "value");
        assert_eq!(event.data, json!({"x": 1}));
    }

    #[test]
    fn test_parse_body_without_name_is_a_ping() {
        assert_eq!(Event::parse("{}").unwrap(), None);
        assert_eq!(Event::parse(r#"{"data":{"x":1}}"#).unwrap(), None);
    }

    #[test]
    fn test_parse_null_data_is_present() {
        let event = Event::parse(r#"{"name":"cell","data":null}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event.name, "cell");
        assert_eq!(event.data, Value::Null);
    }

    #[test]
    fn test_parse_named_event_without_data_is_malformed() {
        let err = Event::parse(r#"{"name":"cell"}"#).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Payload(PayloadErrorKind::MissingData)
        );
    }

    #[test]
    fn test_parse_invalid_json_is_malformed() {
        let err = Event::parse("not json").unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Payload(PayloadErrorKind::InvalidJson)
        );
    }

    #[test]
    fn test_advertised_timeout() {
        let event = Event {
            name: "connected".to_string(),
            data: json!({"timeout": 5000}),
        };
        assert_eq!(event.advertised_timeout(), Some(Duration::from_millis(5000)));

        for (timeout, millis) in [(json!(5000.0), 5000), (json!(2499.6), 2500)] {
            let event = Event {
                name: "connected".to_string(),
                data: json!({ "timeout": timeout }),
            };
            assert_eq!(event.advertised_timeout(), Some(Duration::from_millis(millis)));
        }

        for data in [
            json!({}),
            json!({"timeout": 0}),
            json!({"timeout": 0.2}),
            json!({"timeout": -5000}),
            json!({"timeout": -5000.0}),
            json!({"timeout": "5000"}),
        ] {
            let event = Event {
                name: "connected".to_string(),
                data,
            };
            assert_eq!(event.advertised_timeout(), None);
        }
    }

    #[test]
    fn test_notify_policy_receives_error_and_body() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let policy = MalformedPayloadPolicy::notify(move |_, body| {
            sink.lock().unwrap().push(body.to_string());
        });

        let err = Event::parse("{oops").unwrap_err();
        policy.report("https://example.test/events", &err, "{oops");

        assert_eq!(*seen.lock().unwrap(), vec!["{oops".to_string()]);
    }
}
