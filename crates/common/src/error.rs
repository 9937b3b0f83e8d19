use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Non-retryable HTTP failure from the market data provider. Aborts the
    /// affected asset only; the batch continues.
    #[error("Provider HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Transport-level failure that survived the retry budget.
    #[error("Network error: {0}")]
    Network(String),

    /// A store document could not be read or written. Fatal to the run in
    /// progress.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
