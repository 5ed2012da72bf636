//! Tracing setup shared by both binaries
//!
//! Stdout carries the command result (JSON or progress lines), so log events
//! are written to stderr. The filter comes from `LOG_LEVEL`, then `RUST_LOG`,
//! then the caller's default.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when neither `LOG_LEVEL` nor `RUST_LOG` is set.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global subscriber. Call once, first thing in `main`.
pub fn init(default_directive: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();
}
