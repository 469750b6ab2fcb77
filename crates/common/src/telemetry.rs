//! Tracing initialization shared by service binaries

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing for a service binary
///
/// Respects `RUST_LOG`; defaults to `info` for our crates. Set `json` for
/// machine-readable output in deployed environments.
pub fn init_tracing(service: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,runweave=debug"));

    if json {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        fmt().with_env_filter(filter).with_target(true).init();
    }

    tracing::info!(service = service, version = crate::VERSION, "Tracing initialized");
}
