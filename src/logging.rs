//! # Tracing Module
//!
//! Environment-aware console logging using the tracing ecosystem.
//! Designed for embedding hosts where logs should go to stdout/stderr.
//!
//! This module provides:
//! - Simple console-only logging (host-friendly)
//! - Environment-based log level configuration
//! - Optional JSON output for log aggregation (LOG_FORMAT=json)
//! - TTY-aware ANSI color output

use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize console logging
///
/// Sets up structured logging that outputs to stdout/stderr. Safe to call
/// more than once and from multiple embedding hosts; only the first call
/// installs a subscriber.
///
/// Log levels resolve from `LOG_LEVEL`, then `RUST_LOG`, then an
/// environment-based default (`STAGECHECK_ENV` / `APP_ENV`).
pub fn init_tracing() {
    TRACING_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        // Determine if we're in a TTY for ANSI color support
        let use_ansi = IsTerminal::is_terminal(&std::io::stdout());
        let json_output = std::env::var("LOG_FORMAT")
            .map(|v| v.to_lowercase() == "json")
            .unwrap_or(false);

        let initialized = if json_output {
            let console_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(EnvFilter::new(&log_level));

            tracing_subscriber::registry()
                .with(console_layer)
                .try_init()
                .is_ok()
        } else {
            let console_layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(use_ansi)
                .with_filter(EnvFilter::new(&log_level));

            tracing_subscriber::registry()
                .with(console_layer)
                .try_init()
                .is_ok()
        };

        if initialized {
            tracing::info!(
                environment = %environment,
                ansi_colors = use_ansi,
                json_output,
                "Console logging initialized"
            );
        } else {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("STAGECHECK_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment variables or environment defaults
fn get_log_level(environment: &str) -> String {
    // First check for explicit LOG_LEVEL environment variable
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        return level.to_lowercase();
    }

    // Then check for RUST_LOG environment variable
    if let Ok(level) = std::env::var("RUST_LOG") {
        return level.to_lowercase();
    }

    // Fall back to environment-based defaults
    match environment {
        "test" => "debug".to_string(),
        "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}
