use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "optiquant_core=info";

/// Install a `fmt` subscriber honouring `RUST_LOG`.
///
/// Safe to call more than once; only the first call has an effect, and an
/// already-installed global subscriber is left alone.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        if fmt().with_env_filter(filter).try_init().is_ok() {
            tracing::info!("OptiQuant core tracing initialized.");
        }
    });
}
