//! Cache-aside repository: persistent cache first, provider on miss, stale
//! data over unavailability.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use research_core::{
    CacheKey, CacheStore, DataType, DcfSnapshot, FinancialPeriod, FundamentalsProvider,
    PeriodType, Quote, ResearchError, ScoredStock,
};
use scoring_engine::ScoringEngine;
use sector_metrics::{SectorMetricsEngine, SectorTables};

/// Annual periods fetched per statement request; scoring needs two, the rest
/// is history for consumers.
const ANNUAL_PERIODS_FETCHED: usize = 5;

/// In-process quote cache TTL, in front of the persistent 24h entry.
const QUOTE_HOT_TTL_SECS: i64 = 300;

struct HotQuote {
    quote: Quote,
    cached_at: DateTime<Utc>,
}

pub struct StockRepository {
    provider: Arc<dyn FundamentalsProvider>,
    store: Arc<dyn CacheStore>,
    scoring: ScoringEngine,
    sectors: SectorMetricsEngine,
    provider_timeout: Duration,
    quote_hot_cache: DashMap<String, HotQuote>,
}

impl StockRepository {
    pub fn new(
        provider: Arc<dyn FundamentalsProvider>,
        store: Arc<dyn CacheStore>,
        tables: Arc<SectorTables>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            scoring: ScoringEngine::new(),
            sectors: SectorMetricsEngine::new(tables),
            provider_timeout,
            quote_hot_cache: DashMap::new(),
        }
    }

    /// Statement periods for a ticker, newest first. 7-day TTL.
    pub async fn get_statements(
        &self,
        ticker: &str,
        period_type: PeriodType,
    ) -> Result<Vec<FinancialPeriod>, ResearchError> {
        let ticker = validate_ticker(ticker)?;
        let key = CacheKey::new(&ticker, DataType::Statements, period_type);
        let fetch = self
            .provider
            .fetch_statements(&ticker, period_type, ANNUAL_PERIODS_FETCHED);

        let periods: Vec<FinancialPeriod> = self.cached_fetch(key, fetch).await?;
        if periods.is_empty() {
            return Err(ResearchError::DataMissing(ticker));
        }
        Ok(periods)
    }

    /// Current quote. A short in-process layer sits in front of the
    /// persistent 24h entry so bursts of requests share one row read.
    pub async fn get_quote(&self, ticker: &str) -> Result<Quote, ResearchError> {
        let ticker = validate_ticker(ticker)?;

        if let Some(entry) = self.quote_hot_cache.get(&ticker) {
            let age = (Utc::now() - entry.cached_at).num_seconds();
            if age < QUOTE_HOT_TTL_SECS {
                return Ok(entry.quote.clone());
            }
        }

        let key = CacheKey::new(&ticker, DataType::Quote, PeriodType::Annual);
        let fetch = self.provider.fetch_quote(&ticker);
        let quote: Quote = self.cached_fetch(key, fetch).await?;

        self.quote_hot_cache.insert(
            ticker,
            HotQuote {
                quote: quote.clone(),
                cached_at: Utc::now(),
            },
        );

        Ok(quote)
    }

    /// Provider-computed DCF value. `None` round-trips through the cache:
    /// "the provider has no DCF for this ticker" is itself cacheable.
    pub async fn get_dcf(&self, ticker: &str) -> Result<Option<DcfSnapshot>, ResearchError> {
        let ticker = validate_ticker(ticker)?;
        let key = CacheKey::new(&ticker, DataType::Dcf, PeriodType::Annual);
        let fetch = self.provider.fetch_dcf(&ticker);
        self.cached_fetch(key, fetch).await
    }

    /// The inbound contract: everything the dashboard needs for one ticker.
    /// Statement or quote unavailability is an error; a missing DCF or prior
    /// period only degrades the affected fields.
    pub async fn get_scored_stock(&self, ticker: &str) -> Result<ScoredStock, ResearchError> {
        let ticker = validate_ticker(ticker)?;

        let statements = self.get_statements(&ticker, PeriodType::Annual).await?;
        let current = &statements[0];
        let prior = statements
            .iter()
            .find(|p| p.fiscal_year < current.fiscal_year);

        let quote = self.get_quote(&ticker).await?;

        let dcf = match self.get_dcf(&ticker).await {
            Ok(dcf) => dcf,
            Err(e) => {
                tracing::warn!("dcf unavailable for {}: {}", ticker, e);
                None
            }
        };

        let sector = quote.sector.as_deref();
        let scores = self.scoring.score(current, prior, &quote, dcf.as_ref());
        let sector_metrics = self.sectors.metric_bundle(sector, current, prior, &quote);
        let multiples = self.sectors.multiple_bundle(sector, current, prior, &quote);

        Ok(ScoredStock {
            ticker,
            as_of: Utc::now(),
            price: quote.price,
            sector: quote.sector,
            scores,
            sector_metrics,
            multiples,
        })
    }

    /// The cache-aside state machine for one key.
    ///
    /// Fresh entry: return it, no provider call. Stale or missing: run the
    /// provider fetch under the timeout; on success persist and return fresh,
    /// on failure serve the stale entry if one exists, else propagate. The
    /// cache write runs on a spawned task so it completes even if the caller
    /// is cancelled mid-request.
    async fn cached_fetch<T, Fut>(&self, key: CacheKey, fetch: Fut) -> Result<T, ResearchError>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
        Fut: Future<Output = Result<T, ResearchError>>,
    {
        let existing = match self.store.get(&key).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("cache read failed for {}: {}", key.ticker, e);
                None
            }
        };

        if let Some(entry) = &existing {
            if entry.is_fresh(key.data_type, Utc::now()) {
                match serde_json::from_str(&entry.payload) {
                    Ok(value) => {
                        tracing::debug!(
                            ticker = %key.ticker,
                            data_type = key.data_type.as_str(),
                            "cache hit"
                        );
                        return Ok(value);
                    }
                    Err(e) => {
                        tracing::warn!("corrupt cache payload for {}: {}", key.ticker, e)
                    }
                }
            }
        }

        let timeout_secs = self.provider_timeout.as_secs();
        let fetched = match tokio::time::timeout(self.provider_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(ResearchError::Timeout(timeout_secs)),
        };

        match fetched {
            Ok(value) => {
                match serde_json::to_string(&value) {
                    Ok(payload) => {
                        let store = Arc::clone(&self.store);
                        let write_key = key.clone();
                        // spawned so an in-flight write survives caller cancellation
                        let write = tokio::spawn(async move {
                            if let Err(e) = store.put(&write_key, &payload, Utc::now()).await {
                                tracing::warn!(
                                    "cache write failed for {}: {}",
                                    write_key.ticker,
                                    e
                                );
                            }
                        });
                        let _ = write.await;
                    }
                    Err(e) => tracing::warn!("cache serialize failed for {}: {}", key.ticker, e),
                }
                Ok(value)
            }
            Err(provider_err) => {
                if let Some(entry) = existing {
                    if let Ok(value) = serde_json::from_str(&entry.payload) {
                        tracing::warn!(
                            ticker = %key.ticker,
                            data_type = key.data_type.as_str(),
                            error = %provider_err,
                            "provider failed, serving stale cache entry"
                        );
                        return Ok(value);
                    }
                }
                Err(provider_err)
            }
        }
    }
}

/// Tickers are short uppercase symbols, optionally with a class or exchange
/// suffix ("BRK.B", "RDS-A"). Anything else is NotFound before we spend a
/// provider call on it.
fn validate_ticker(ticker: &str) -> Result<String, ResearchError> {
    let normalized = ticker.trim().to_uppercase();
    let valid_len = (1..=10).contains(&normalized.len());
    let valid_chars = normalized
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');

    if valid_len && valid_chars {
        Ok(normalized)
    } else {
        Err(ResearchError::NotFound(ticker.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use research_core::CachedPayload;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    fn scenario_current() -> FinancialPeriod {
        let mut p = FinancialPeriod::empty("TEST", 2024);
        p.net_income = Some(100.0);
        p.operating_cash_flow = Some(150.0);
        p.total_assets = Some(1000.0);
        p.long_term_debt = Some(200.0);
        p.current_assets = Some(500.0);
        p.current_liabilities = Some(250.0);
        p.gross_profit = Some(400.0);
        p.revenue = Some(1000.0);
        p.retained_earnings = Some(300.0);
        p.ebit = Some(150.0);
        p.total_liabilities = Some(400.0);
        p
    }

    fn scenario_prior() -> FinancialPeriod {
        let mut p = FinancialPeriod::empty("TEST", 2023);
        p.net_income = Some(80.0);
        p.operating_cash_flow = Some(120.0);
        p.total_assets = Some(900.0);
        p.long_term_debt = Some(250.0);
        p.current_assets = Some(400.0);
        p.current_liabilities = Some(250.0);
        p.gross_profit = Some(300.0);
        p.revenue = Some(900.0);
        p
    }

    struct MockProvider {
        statement_calls: AtomicUsize,
        quote_calls: AtomicUsize,
        fail: AtomicBool,
        delay: Option<Duration>,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                statement_calls: AtomicUsize::new(0),
                quote_calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                delay: None,
            }
        }

        fn failing() -> Self {
            let p = Self::new();
            p.fail.store(true, Ordering::SeqCst);
            p
        }

        fn slow(delay: Duration) -> Self {
            let mut p = Self::new();
            p.delay = Some(delay);
            p
        }
    }

    #[async_trait]
    impl FundamentalsProvider for MockProvider {
        async fn fetch_statements(
            &self,
            ticker: &str,
            _period_type: PeriodType,
            _periods: usize,
        ) -> Result<Vec<FinancialPeriod>, ResearchError> {
            self.statement_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(ResearchError::Provider("boom".to_string()));
            }
            if ticker == "NOPE" {
                return Err(ResearchError::NotFound(ticker.to_string()));
            }
            Ok(vec![scenario_current(), scenario_prior()])
        }

        async fn fetch_quote(&self, ticker: &str) -> Result<Quote, ResearchError> {
            self.quote_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ResearchError::Provider("boom".to_string()));
            }
            Ok(Quote {
                ticker: ticker.to_string(),
                price: 100.0,
                market_cap: Some(2000.0),
                sector: Some("Technology".to_string()),
                as_of: Utc::now(),
            })
        }

        async fn fetch_dcf(&self, ticker: &str) -> Result<Option<DcfSnapshot>, ResearchError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ResearchError::Provider("boom".to_string()));
            }
            Ok(Some(DcfSnapshot {
                ticker: ticker.to_string(),
                intrinsic_value: 130.0,
                as_of: Utc::now(),
            }))
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    struct MemoryStore {
        entries: Mutex<HashMap<String, CachedPayload>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
            }
        }

        fn key_str(key: &CacheKey) -> String {
            format!(
                "{}:{}:{}",
                key.ticker,
                key.data_type.as_str(),
                key.period_type.as_str()
            )
        }

        async fn seed(&self, key: &CacheKey, payload: &str, fetched_at: DateTime<Utc>) {
            self.entries.lock().await.insert(
                Self::key_str(key),
                CachedPayload {
                    payload: payload.to_string(),
                    fetched_at,
                },
            );
        }
    }

    #[async_trait]
    impl CacheStore for MemoryStore {
        async fn get(&self, key: &CacheKey) -> Result<Option<CachedPayload>, ResearchError> {
            Ok(self.entries.lock().await.get(&Self::key_str(key)).cloned())
        }

        async fn put(
            &self,
            key: &CacheKey,
            payload: &str,
            fetched_at: DateTime<Utc>,
        ) -> Result<(), ResearchError> {
            self.entries.lock().await.insert(
                Self::key_str(key),
                CachedPayload {
                    payload: payload.to_string(),
                    fetched_at,
                },
            );
            Ok(())
        }
    }

    fn repository(provider: Arc<MockProvider>, store: Arc<MemoryStore>) -> StockRepository {
        StockRepository::new(
            provider,
            store,
            Arc::new(SectorTables::builtin()),
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn fresh_cache_reads_are_idempotent_and_skip_the_provider() {
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(MemoryStore::new());
        let repo = repository(Arc::clone(&provider), store);

        let first = repo.get_statements("TEST", PeriodType::Annual).await.unwrap();
        assert_eq!(provider.statement_calls.load(Ordering::SeqCst), 1);

        let second = repo.get_statements("TEST", PeriodType::Annual).await.unwrap();
        assert_eq!(provider.statement_calls.load(Ordering::SeqCst), 1);

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn provider_failure_serves_stale_cache() {
        let provider = Arc::new(MockProvider::failing());
        let store = Arc::new(MemoryStore::new());

        let key = CacheKey::new("TEST", DataType::Statements, PeriodType::Annual);
        let payload = serde_json::to_string(&vec![scenario_current(), scenario_prior()]).unwrap();
        // well past the 7-day statements TTL
        store.seed(&key, &payload, Utc::now() - chrono::Duration::days(30)).await;

        let repo = repository(Arc::clone(&provider), store);
        let statements = repo.get_statements("TEST", PeriodType::Annual).await.unwrap();

        assert_eq!(provider.statement_calls.load(Ordering::SeqCst), 1);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].fiscal_year, 2024);
    }

    #[tokio::test]
    async fn provider_failure_without_cache_propagates() {
        let provider = Arc::new(MockProvider::failing());
        let store = Arc::new(MemoryStore::new());
        let repo = repository(provider, store);

        let err = repo.get_statements("TEST", PeriodType::Annual).await.unwrap_err();
        assert!(matches!(err, ResearchError::Provider(_)));
    }

    #[tokio::test]
    async fn stale_entry_is_replaced_by_successful_refetch() {
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(MemoryStore::new());

        let key = CacheKey::new("TEST", DataType::Statements, PeriodType::Annual);
        let old = vec![FinancialPeriod::empty("TEST", 2019)];
        store
            .seed(&key, &serde_json::to_string(&old).unwrap(), Utc::now() - chrono::Duration::days(30))
            .await;

        let repo = repository(Arc::clone(&provider), Arc::clone(&store));
        let statements = repo.get_statements("TEST", PeriodType::Annual).await.unwrap();

        assert_eq!(provider.statement_calls.load(Ordering::SeqCst), 1);
        assert_eq!(statements[0].fiscal_year, 2024);

        let rewritten = store.get(&key).await.unwrap().unwrap();
        let cached: Vec<FinancialPeriod> = serde_json::from_str(&rewritten.payload).unwrap();
        assert_eq!(cached[0].fiscal_year, 2024);
    }

    #[tokio::test]
    async fn slow_provider_times_out_and_falls_back_to_stale() {
        let provider = Arc::new(MockProvider::slow(Duration::from_secs(5)));
        let store = Arc::new(MemoryStore::new());

        let key = CacheKey::new("TEST", DataType::Statements, PeriodType::Annual);
        let payload = serde_json::to_string(&vec![scenario_current()]).unwrap();
        store.seed(&key, &payload, Utc::now() - chrono::Duration::days(30)).await;

        let repo = StockRepository::new(
            provider,
            store,
            Arc::new(SectorTables::builtin()),
            Duration::from_millis(50),
        );

        let statements = repo.get_statements("TEST", PeriodType::Annual).await.unwrap();
        assert_eq!(statements[0].fiscal_year, 2024);
    }

    #[tokio::test]
    async fn slow_provider_without_cache_is_a_timeout_error() {
        let provider = Arc::new(MockProvider::slow(Duration::from_secs(5)));
        let store = Arc::new(MemoryStore::new());
        let repo = StockRepository::new(
            provider,
            store,
            Arc::new(SectorTables::builtin()),
            Duration::from_millis(50),
        );

        let err = repo.get_statements("TEST", PeriodType::Annual).await.unwrap_err();
        assert!(matches!(err, ResearchError::Timeout(_)));
    }

    #[tokio::test]
    async fn invalid_ticker_never_reaches_the_provider() {
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(MemoryStore::new());
        let repo = repository(Arc::clone(&provider), store);

        let err = repo.get_scored_stock("not a ticker!").await.unwrap_err();
        assert!(matches!(err, ResearchError::NotFound(_)));
        assert_eq!(provider.statement_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scored_stock_assembles_all_engines() {
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(MemoryStore::new());
        let repo = repository(provider, store);

        let scored = repo.get_scored_stock("test").await.unwrap();

        assert_eq!(scored.ticker, "TEST");
        assert_eq!(scored.price, 100.0);
        assert_eq!(scored.sector.as_deref(), Some("Technology"));

        // scenario-A statement pair: seven of nine Piotroski tests pass
        let piotroski = scored.scores.piotroski.unwrap();
        assert_eq!(piotroski.score, 7);

        let altman = scored.scores.altman.unwrap();
        assert!((altman.score - 5.215).abs() < 1e-9);

        // intrinsic 130 vs price 100 is +30%
        assert_eq!(
            scored.scores.dcf.verdict,
            research_core::ValuationVerdict::Undervalued
        );

        for metric in [
            &scored.sector_metrics.roe,
            &scored.sector_metrics.current_ratio,
            &scored.sector_metrics.revenue_growth_yoy,
            &scored.sector_metrics.accrual_ratio,
        ] {
            if let Some(pct) = metric.percentile {
                assert!((0.0..=100.0).contains(&pct));
            }
        }
    }

    #[tokio::test]
    async fn quote_hot_cache_shares_one_fetch() {
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(MemoryStore::new());
        let repo = repository(Arc::clone(&provider), store);

        repo.get_quote("TEST").await.unwrap();
        repo.get_quote("TEST").await.unwrap();

        assert_eq!(provider.quote_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dcf_none_round_trips_through_the_cache() {
        struct NoDcfProvider(MockProvider);

        #[async_trait]
        impl FundamentalsProvider for NoDcfProvider {
            async fn fetch_statements(
                &self,
                ticker: &str,
                period_type: PeriodType,
                periods: usize,
            ) -> Result<Vec<FinancialPeriod>, ResearchError> {
                self.0.fetch_statements(ticker, period_type, periods).await
            }
            async fn fetch_quote(&self, ticker: &str) -> Result<Quote, ResearchError> {
                self.0.fetch_quote(ticker).await
            }
            async fn fetch_dcf(
                &self,
                _ticker: &str,
            ) -> Result<Option<DcfSnapshot>, ResearchError> {
                Ok(None)
            }
            fn name(&self) -> &'static str {
                "no-dcf"
            }
        }

        let provider = Arc::new(NoDcfProvider(MockProvider::new()));
        let store = Arc::new(MemoryStore::new());
        let repo = StockRepository::new(
            provider,
            Arc::clone(&store) as Arc<dyn CacheStore>,
            Arc::new(SectorTables::builtin()),
            Duration::from_secs(10),
        );

        assert!(repo.get_dcf("TEST").await.unwrap().is_none());

        // the None is cached, not treated as a miss
        let key = CacheKey::new("TEST", DataType::Dcf, PeriodType::Annual);
        assert!(store.get(&key).await.unwrap().is_some());

        // and the scored stock degrades to NotAvailable rather than erroring
        let scored = repo.get_scored_stock("TEST").await.unwrap();
        assert_eq!(
            scored.scores.dcf.verdict,
            research_core::ValuationVerdict::NotAvailable
        );
    }
}
