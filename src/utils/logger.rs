//! Logging utilities
//!
//! Provides logging configuration and helpers.

use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    /// `--verbose` raises the configured level to debug
    pub fn with_verbose(self, verbose: bool) -> Self {
        match (verbose, self) {
            (true, LogLevel::Info | LogLevel::Warn | LogLevel::Error) => LogLevel::Debug,
            _ => self,
        }
    }
}

fn filter_directive(level: LogLevel) -> String {
    format!("webhook_tester={}", level.to_tracing_level())
}

/// Initialize the logger; `RUST_LOG` takes precedence over `level`
pub fn init_logger(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
