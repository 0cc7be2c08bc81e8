use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::time::Duration;

/// Default keep-alive deadline in milliseconds, used until the server
/// advertises its own.
pub const DEFAULT_KEEP_ALIVE_MS: u64 = 31_000;

/// Which event-type registry to subscribe with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StreamKind {
    /// Cursor, value and cell events of a project context
    ProjectContext,
    /// Events of a live bout on a context
    Bout,
    /// A tenant's activity feed
    ActivityStream,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StreamKind::ProjectContext => write!(f, "project-context"),
            StreamKind::Bout => write!(f, "bout"),
            StreamKind::ActivityStream => write!(f, "activity-stream"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Absolute URL of the event stream endpoint to subscribe to
    #[arg(short, long, env = "EVENT_STREAM_URL")]
    url: String,

    /// The kind of stream, which selects the event types to listen for
    #[arg(short, long, env, value_enum, default_value_t = StreamKind::ProjectContext)]
    pub stream: StreamKind,

    /// Session id sent as the `id` cookie on every connection
    #[arg(long, env)]
    session_cookie: Option<String>,

    /// Bearer token sent in the Authorization header on every connection
    #[arg(long, env)]
    bearer_token: Option<String>,

    /// Milliseconds of silence tolerated before reconnecting, until the server
    /// advertises its own deadline
    #[arg(long, env, default_value_t = DEFAULT_KEEP_ALIVE_MS,
        value_parser = clap::value_parser!(u64).range(1..))]
    pub keep_alive_ms: u64,

    /// Reconnect immediately when the transport reports an error instead of
    /// waiting for the keep-alive deadline
    #[arg(long, env, default_value_t = false)]
    pub reconnect_on_transport_error: bool,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn session_cookie(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }
}
