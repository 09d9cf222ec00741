use thiserror::Error;

/// Startup-time failures. Every variant here is fatal: the process logs and
/// exits non-zero before any task is spawned.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("failed to bind client listener on {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to bind upstream socket: {source}")]
    UpstreamBindFailed {
        #[source]
        source: std::io::Error,
    },
    #[error("failed to connect upstream socket to {addr}: {source}")]
    DialFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load configuration: {0}")]
    ConfigLoadFailed(#[from] anyhow::Error),
}
