//! Tracing setup.
//!
//! Reads `RUST_LOG`; defaults to `info`.  Output goes to stderr so the
//! run summary on stdout stays clean.
//!
//! ```bash
//! RUST_LOG=bdi_agent=debug,bdi_graph=debug bdi --paired
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
