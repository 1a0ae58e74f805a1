//! Error types for the liquidity analyzer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid token price: {0}")]
    InvalidPrice(rust_decimal::Decimal),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Rate limited by upstream API")]
    RateLimited,

    #[error("Fetch failed after retries: {0}")]
    FetchFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
