//! Development-time tracing for debugging the agent.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Not part of the product output.
//!
//! - **Console (`io/console`)**: Plans, code, results and prompts shown to the
//!   user on stdout. Unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=task_agent=debug cargo run
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
