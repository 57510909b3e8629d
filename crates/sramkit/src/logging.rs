use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Per-target filter directives, e.g. `sramkit_store=debug,warn`.
pub const LOG_ENV: &str = "SRAMKIT_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// An explicit `--log-level` wins; otherwise `SRAMKIT_LOG` directives apply
/// on top of a `warn` default. Bad directives are skipped, not fatal.
pub fn build_filter(level: Option<LogLevel>, directives: Option<&str>) -> EnvFilter {
    let default = level.map_or(LevelFilter::WARN, LogLevel::as_filter);
    let builder = EnvFilter::builder().with_default_directive(default.into());
    match (level, directives) {
        (None, Some(directives)) => builder.parse_lossy(directives),
        _ => builder.parse_lossy(""),
    }
}

/// Install the stderr subscriber. stdout is reserved for command output.
pub fn init_logging(format: LogFormat, level: Option<LogLevel>) {
    let directives = std::env::var(LOG_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(level, directives.as_deref()))
        .with_ansi(false)
        .with_target(level.is_none() && directives.is_some());

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
