use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResearchError {
    /// No financial data available at all, neither cached nor fetchable.
    #[error("no financial data for {0}")]
    DataMissing(String),

    /// Provider reports the ticker does not exist.
    #[error("ticker not found: {0}")]
    NotFound(String),

    /// Transient or permanent provider failure (HTTP error, parse error, rate limit).
    #[error("provider error: {0}")]
    Provider(String),

    /// Provider call exceeded the configured deadline.
    #[error("provider request timed out after {0}s")]
    Timeout(u64),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("database error: {0}")]
    Database(String),
}
