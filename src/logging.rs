use tracing_subscriber::EnvFilter;

/// Initialise structured logging. `RUST_LOG` overrides the default filter;
/// absent any override this forwarder logs at `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
