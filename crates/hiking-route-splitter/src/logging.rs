//! Logging setup for the command line tool
//!
//! Logs go to stderr so that stdout stays free for the split route.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "info,hiking_route_lib=debug,hiking_route_splitter=debug"
    } else {
        "info"
    }
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the built-in default filter.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "{} {} logging initialized",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
}
