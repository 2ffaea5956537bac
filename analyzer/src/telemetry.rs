//! Tracing subscriber initialization.
//!
//! Log output goes to stdout through the `tracing_subscriber` fmt layer. Verbosity is controlled
//! with the standard `RUST_LOG` environment variable and defaults to `info`:
//!
//! ```bash
//! RUST_LOG=analyzer=debug,tower_http=debug analyzer -f config.yaml
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber.
///
/// Fails if a global subscriber has already been set.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
