use rust_decimal::Decimal;
use thiserror::Error;

/// Fatal configuration problems. These abort worker construction; nothing
/// else in the crate is allowed to kill the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors surfaced by the venue gateway boundary. Each call is atomic:
/// a failed call produced no partial placement the worker must reason about.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned {status} for {route}: {body}")]
    Status {
        route: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode gateway response for {route}: {source}")]
    Decode {
        route: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-tick failures. All of these are logged and swallowed by the tick
/// loop; the next tick retries from a clean slate.
#[derive(Debug, Error)]
pub enum TickError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("invalid reference price: {}", price.map(|p| p.to_string()).unwrap_or_else(|| "none".into()))]
    InvalidPrice { price: Option<Decimal> },

    #[error("no balance entry for token {token}")]
    MissingBalance { token: String },

    #[error("worker is not initialized")]
    NotInitialized,
}
