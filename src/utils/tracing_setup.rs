//! Tracing Setup
//!
//! Installs the global `tracing` subscriber for the binary.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "RAG_PIPELINE_LOG";

/// Build the filter: `RAG_PIPELINE_LOG` when set and valid, else `default_level`.
pub fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the tracing subscriber.
///
/// Logs go to stderr so answers streamed to stdout stay clean. Calling this
/// more than once keeps the first subscriber.
pub fn init_tracing(default_level: &str, json: bool) {
    let filter = build_filter(default_level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        tracing::debug!("tracing subscriber already installed: {}", e);
    }
}
