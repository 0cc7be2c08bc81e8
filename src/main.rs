use anyhow::{Context, Result};
use colored::*;
use events::{ActivityStreamEvent, BoutEvent, EventType, ProjectContextEvent};
use log::*;
use service::config::{Config, StreamKind};
use service::logging::Logger;
use sse::{EventSourceTransport, ResumableEventSource, SourceConfig};
use std::sync::Arc;

mod output;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::new();
    Logger::init_logger(&config).context("Failed to start logger")?;

    let mut transport = EventSourceTransport::new();
    if let Some(session_id) = config.session_cookie() {
        transport = transport.with_session_cookie(session_id);
    }
    if let Some(token) = config.bearer_token() {
        transport = transport.with_bearer_token(token);
    }

    let source_config = SourceConfig::new()
        .with_keep_alive(config.keep_alive())
        .with_reconnect_on_transport_error(config.reconnect_on_transport_error);

    let source =
        ResumableEventSource::with_config(config.url(), Arc::new(transport), source_config)
            .context("Failed to open event stream")?;

    match config.stream {
        StreamKind::ProjectContext => subscribe(&source, ProjectContextEvent::all()),
        StreamKind::Bout => subscribe(&source, BoutEvent::all()),
        StreamKind::ActivityStream => subscribe(&source, ActivityStreamEvent::all()),
    }

    println!(
        "{} Listening for {} events on {} (Ctrl-C to stop)",
        "→".blue(),
        config.stream.to_string().yellow(),
        source.url()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("Shutting down, last event id: {:?}", source.last_event_id());
    source.close();
    println!("{} Event stream closed", "✓".green());

    Ok(())
}

/// Print every event of the given types as it arrives.
fn subscribe<E>(source: &ResumableEventSource, event_types: &[E])
where
    E: EventType + Copy + Send + Sync + 'static,
{
    for &event_type in event_types {
        source.on(event_type, move |data| {
            output::print_event(event_type.value(), &data)
        });
    }
}
