use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("rate limit from {0}, retry after {1}s")]
    RateLimit(String, u64),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("location unavailable: {0}")]
    Location(String),

    #[error(transparent)]
    Core(#[from] addrfill_core::AddrfillError),
}

pub type Result<T> = std::result::Result<T, GeocodeError>;
