//! Logging and tracing setup

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging and tracing
///
/// Diagnostics go through tracing; the report text itself is written to
/// stdout by the service and is not routed through the subscriber.
pub fn initialize_logging() -> Result<()> {
    // Set up environment filter
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Set up formatting layer
    let fmt_layer = fmt::layer().with_target(false).with_ansi(true);

    // Initialize the subscriber
    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();

    Ok(())
}
