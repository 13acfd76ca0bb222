use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::cache::{CacheKey, CachedPayload};
use crate::error::ResearchError;
use crate::types::{DcfSnapshot, FinancialPeriod, Quote};
use crate::PeriodType;

/// A third-party fundamentals source. Implementations are selected once at
/// startup by configuration; business logic never branches on the concrete type.
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    /// Fetch up to `periods` statement periods, newest first, already
    /// normalized to absolute units and a single currency.
    async fn fetch_statements(
        &self,
        ticker: &str,
        period_type: PeriodType,
        periods: usize,
    ) -> Result<Vec<FinancialPeriod>, ResearchError>;

    async fn fetch_quote(&self, ticker: &str) -> Result<Quote, ResearchError>;

    /// Provider-computed DCF intrinsic value. `Ok(None)` means the provider
    /// does not offer one for this ticker; that is not an error.
    async fn fetch_dcf(&self, ticker: &str) -> Result<Option<DcfSnapshot>, ResearchError>;

    fn name(&self) -> &'static str;
}

/// Persistent cache store. One independent row per key; upserts only.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedPayload>, ResearchError>;

    async fn put(
        &self,
        key: &CacheKey,
        payload: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), ResearchError>;
}
