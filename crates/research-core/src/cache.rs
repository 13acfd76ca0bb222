use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Kind of cached payload. Each kind carries its own TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Statements,
    Quote,
    Dcf,
}

impl DataType {
    /// Full statement periods move slowly; quotes and DCF values daily.
    pub fn ttl(&self) -> Duration {
        match self {
            DataType::Statements => Duration::days(7),
            DataType::Quote => Duration::hours(24),
            DataType::Dcf => Duration::hours(24),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Statements => "statements",
            DataType::Quote => "quote",
            DataType::Dcf => "dcf",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Annual,
    Quarterly,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Annual => "annual",
            PeriodType::Quarterly => "quarterly",
        }
    }
}

/// Cache row identity: one entry per (ticker, data type, period type).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub data_type: DataType,
    pub period_type: PeriodType,
}

impl CacheKey {
    pub fn new(ticker: &str, data_type: DataType, period_type: PeriodType) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            data_type,
            period_type,
        }
    }
}

/// A cached payload with its fetch timestamp.
#[derive(Debug, Clone)]
pub struct CachedPayload {
    pub payload: String,
    pub fetched_at: DateTime<Utc>,
}

impl CachedPayload {
    /// Staleness is `now - fetched_at > ttl` for the entry's data type.
    pub fn is_fresh(&self, data_type: DataType, now: DateTime<Utc>) -> bool {
        now - self.fetched_at <= data_type.ttl()
    }
}
