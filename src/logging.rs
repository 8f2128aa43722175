//! Tracing initialization.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` wins over `default_filter`; an unparsable directive falls back
/// to [`DEFAULT_LOG_FILTER`](crate::config::DEFAULT_LOG_FILTER).
pub fn init_tracing(default_filter: &str, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|e| {
            eprintln!("Warning: invalid log filter '{default_filter}': {e}");
            EnvFilter::new(crate::config::DEFAULT_LOG_FILTER)
        });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true);

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init();
}
