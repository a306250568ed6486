//! Logging setup for projgate.
//!
//! Every fail-closed decision is reported through `tracing` from
//! `projgate_domain::resolver`, so the filter built here keeps the projgate
//! crates at the configured level while other crates stay at `warn`.
//! `RUST_LOG`, when set, replaces the generated directives entirely.
//!
//! A fail-closed resolution in JSON format:
//!
//! ```json
//! {"timestamp":"...","level":"WARN","fields":{"message":"Access resolution failed, denying access to all projects","user_id":"alice","error":"..."},"target":"projgate_domain::resolver::access_resolver","span":{"user_id":"alice","name":"explain"}}
//! ```

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type FilteredRegistry = Layered<EnvFilter, Registry>;

/// Crates whose events follow the configured level.
const PROJGATE_TARGETS: [&str; 3] = ["projgate_domain", "projgate_storage", "projgate_server"];

/// Level applied to every other crate.
const DEPENDENCY_LEVEL: &str = "warn";

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: Level,
    /// Also log span creation and close (with busy/idle timings), e.g. one
    /// line per `explain` call.
    pub span_events: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: Level::INFO,
            span_events: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Filter directives used when `RUST_LOG` is not set, e.g.
    /// `warn,projgate_domain=info,projgate_storage=info,projgate_server=info`.
    pub fn directives(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        let mut directives = DEPENDENCY_LEVEL.to_string();
        for target in PROJGATE_TARGETS {
            directives.push_str(&format!(",{}={}", target, level));
        }
        directives
    }

    fn fmt_span(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn fmt_layer<W>(&self, writer: W) -> Box<dyn Layer<FilteredRegistry> + Send + Sync>
    where
        W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
    {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_span_events(self.fmt_span());
        match self.format {
            LogFormat::Json => layer
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
        }
    }
}

/// Installs the global subscriber. Returns false if one was already set.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directives()));

    tracing_subscriber::registry()
        .with(filter)
        .with(config.fmt_layer(std::io::stdout))
        .try_init()
        .is_ok()
}

/// Builds a subscriber writing to `writer` with the configured directives,
/// ignoring `RUST_LOG`. Used to capture log output in tests.
pub fn subscriber_with_writer<W>(
    config: &LoggingConfig,
    writer: W,
) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(EnvFilter::new(config.directives()))
        .with(config.fmt_layer(writer))
}
