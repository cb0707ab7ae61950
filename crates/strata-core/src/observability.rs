//! Observability infrastructure for Strata.
//!
//! Structured logging with consistent spans. Every dual-write failure path
//! in the dispatcher logs with the correlation shape
//! `{op, ident, phase, cause}` so operators can reconcile backend and store
//! state from logs alone. This module provides the subscriber bootstrap and
//! the span constructor that anchors those fields.

use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration for the embedding process.
///
/// The dispatcher emits only `tracing` events; how they are rendered is the
/// host's choice. Reconciliation diagnostics sit at `debug`, so the default
/// directives raise the dispatch crates above the baseline — without them,
/// the import and degraded-view paths are invisible until something is
/// already wrong.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Emit newline-delimited JSON records instead of human-readable lines.
    pub json: bool,
    /// Filter directives used when `RUST_LOG` does not override them.
    pub default_directives: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            json: false,
            default_directives: "info,strata_dispatch=debug,strata_store=debug".to_string(),
        }
    }
}

impl LogConfig {
    /// Builds a config for machine-consumed JSON output.
    #[must_use]
    pub fn json() -> Self {
        Self {
            json: true,
            ..Self::default()
        }
    }

    /// Returns a copy with the given fallback filter directives.
    #[must_use]
    pub fn with_default_directives(mut self, directives: impl Into<String>) -> Self {
        self.default_directives = directives.into();
        self
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured fallback directives, so operators
/// can re-scope logging without redeploying. If a subscriber is already
/// installed (tests, or a host that brings its own), the existing one is
/// kept and this call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::new(directives),
        Err(_) => EnvFilter::new(&config.default_directives),
    };

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(true))
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed, keeping it");
    }
}

/// Creates a span for dispatcher operations with standard fields.
///
/// # Example
///
/// ```rust
/// use strata_core::observability::dispatch_span;
///
/// let span = dispatch_span("create_schema", "lake.pg.sales");
/// let _guard = span.enter();
/// // ... dispatch the operation
/// ```
#[must_use]
pub fn dispatch_span(operation: &str, ident: &str) -> Span {
    tracing::info_span!("dispatch", op = operation, ident = ident)
}
