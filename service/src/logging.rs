use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Transport dependencies whose logs are hidden unless running at Trace.
/// Every SSE reconnect makes them log a burst of connection setup noise.
const FILTERED_MODULES: &[&str] = &["hyper", "rustls", "h2", "eventsource_client"];

pub struct Logger {}

impl Logger {
    /// Installs a terminal logger at the configured level.
    ///
    /// Below Trace, logs from the noisy transport dependencies are dropped.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let level = config.log_level_filter;
        TermLogger::init(
            level,
            Self::build_log_config(Self::should_filter_dependencies(level)),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        )
    }

    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
