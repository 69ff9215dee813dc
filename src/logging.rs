// src/logging.rs

//! Tracing subscriber setup for the CLI driver.
//!
//! The effective level comes from the `--log-level` flag when given,
//! otherwise from the `EVENTDAG_LOG` environment variable, otherwise
//! `info`. `EVENTDAG_LOG` accepts anything `tracing::Level` can parse
//! ("warn", "DEBUG", "3", ...).

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Install the global subscriber. Call once, before any span or event.
pub fn init_logging(cli_level: Option<LogLevel>) {
    fmt()
        .with_max_level(effective_level(cli_level))
        .with_target(false)
        .compact()
        .init();
}

fn effective_level(cli_level: Option<LogLevel>) -> Level {
    if let Some(level) = cli_level {
        return level.into();
    }
    std::env::var("EVENTDAG_LOG")
        .ok()
        .and_then(|value| Level::from_str(value.trim()).ok())
        .unwrap_or(Level::INFO)
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
