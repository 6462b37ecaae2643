//! Tracing and logging setup
//!
//! Configures the `tracing` subscriber with `RUST_LOG` filtering and either
//! human-readable or JSON output.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {other}")),
        }
    }
}

/// Tracing configuration options
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Fallback filter when `RUST_LOG` is unset
    pub level: Level,
    pub format: LogFormat,
    /// Log span open/close
    pub span_events: bool,
    pub file_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            span_events: false,
            file_line: true,
        }
    }
}

impl TracingConfig {
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Pretty,
            span_events: true,
            file_line: true,
        }
    }

    #[must_use]
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Json,
            span_events: false,
            file_line: false,
        }
    }

    /// Pick a preset from `APP_ENV`, then let `LOG_FORMAT` override the format
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = match std::env::var("APP_ENV").as_deref() {
            Ok("production" | "staging") => Self::production(),
            Ok("development") => Self::development(),
            _ => Self::default(),
        };
        if let Some(format) = std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.format = format;
        }
        config
    }

    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        let span_events = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = fmt::layer()
            .with_file(self.file_line)
            .with_line_number(self.file_line)
            .with_span_events(span_events);

        match self.format {
            LogFormat::Pretty => layer.boxed(),
            LogFormat::Json => layer.json().boxed(),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.to_string()))
    }
}

/// Initialize tracing from the environment
///
/// # Panics
/// Panics if a global subscriber is already set.
pub fn init_tracing() {
    let config = TracingConfig::from_env();
    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(config.fmt_layer())
        .init();
}

/// Initialize tracing from the environment, tolerating a prior initialization
pub fn try_init_tracing() -> Result<(), TracingError> {
    try_init_tracing_with_config(TracingConfig::from_env())
}

pub fn try_init_tracing_with_config(config: TracingConfig) -> Result<(), TracingError> {
    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(config.fmt_layer())
        .try_init()
        .map_err(|_| TracingError::AlreadyInitialized)
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let config = TracingConfig::development();
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.span_events);

        let config = TracingConfig::production();
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.file_line);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_second_init_reports_already_initialized() {
        let _ = try_init_tracing_with_config(TracingConfig::default());
        assert!(matches!(
            try_init_tracing_with_config(TracingConfig::default()),
            Err(TracingError::AlreadyInitialized)
        ));
    }
}
