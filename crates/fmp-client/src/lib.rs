//! Financial Modeling Prep provider adapter.
//!
//! Fetches the three statements plus quote/profile/DCF endpoints and maps
//! them into the canonical `FinancialPeriod` shape. Responsible for unit and
//! currency normalization; FMP already reports absolute-unit values in the
//! filing currency, so mapping is field selection plus statement zipping.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use research_core::{
    DcfSnapshot, FinancialPeriod, FundamentalsProvider, PeriodType, Quote, ResearchError,
};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let wait_until = ts.front().and_then(|f| f.checked_add(self.window));
            drop(ts);
            let sleep_dur = wait_until
                .map(|w| w.duration_since(now))
                .unwrap_or(self.window)
                + Duration::from_millis(50);
            tracing::debug!("rate limiter: waiting {:.1}s for FMP slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

#[derive(Clone)]
pub struct FmpClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl FmpClient {
    pub fn new(api_key: String) -> Self {
        // FMP Starter allows 300 req/min; free tier users should set FMP_RATE_LIMIT=10.
        let rate_limit: usize = std::env::var("FMP_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// GET a JSON endpoint with rate limiting and bounded 429 retry.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        extra_query: &[(&str, String)],
    ) -> Result<T, ResearchError> {
        let url = format!("{}/{}", BASE_URL, path);

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;

            let mut request = self.client.get(&url).query(&[("apikey", &self.api_key)]);
            for (k, v) in extra_query {
                request = request.query(&[(*k, v.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| ResearchError::Provider(e.to_string()))?;

            let status = response.status();
            if status.as_u16() == 429 {
                let wait_secs = 10u64;
                tracing::warn!("FMP 429 rate limited, waiting {}s before retry {}/3", wait_secs, attempt + 1);
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }
            if status.as_u16() == 404 {
                return Err(ResearchError::NotFound(path.to_string()));
            }
            if !status.is_success() {
                return Err(ResearchError::Provider(format!(
                    "HTTP {}: {}",
                    status,
                    response.text().await.unwrap_or_default()
                )));
            }

            return response
                .json()
                .await
                .map_err(|e| ResearchError::Provider(e.to_string()));
        }

        Err(ResearchError::Provider(
            "rate limited by FMP after 3 retries".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeStatementRow {
    calendar_year: String,
    period: String,
    revenue: Option<f64>,
    gross_profit: Option<f64>,
    operating_income: Option<f64>,
    net_income: Option<f64>,
    ebitda: Option<f64>,
    interest_expense: Option<f64>,
    #[serde(rename = "epsdiluted")]
    eps_diluted: Option<f64>,
    depreciation_and_amortization: Option<f64>,
    #[serde(rename = "weightedAverageShsOutDil")]
    weighted_shares_diluted: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceSheetRow {
    calendar_year: String,
    period: String,
    total_assets: Option<f64>,
    total_liabilities: Option<f64>,
    total_current_assets: Option<f64>,
    total_current_liabilities: Option<f64>,
    long_term_debt: Option<f64>,
    total_debt: Option<f64>,
    total_stockholders_equity: Option<f64>,
    retained_earnings: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CashFlowRow {
    calendar_year: String,
    period: String,
    operating_cash_flow: Option<f64>,
    free_cash_flow: Option<f64>,
    capital_expenditure: Option<f64>,
    common_stock_repurchased: Option<f64>,
    depreciation_and_amortization: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRow {
    symbol: String,
    price: Option<f64>,
    market_cap: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRow {
    sector: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DcfRow {
    dcf: Option<f64>,
}

/// FMP reports quarters as "Q1".."Q4" and annuals as "FY".
fn parse_quarter(period: &str) -> Option<u8> {
    match period {
        "Q1" => Some(1),
        "Q2" => Some(2),
        "Q3" => Some(3),
        "Q4" => Some(4),
        _ => None,
    }
}

fn period_key(year: &str, period: &str) -> (i32, Option<u8>) {
    (year.parse().unwrap_or(0), parse_quarter(period))
}

#[async_trait]
impl FundamentalsProvider for FmpClient {
    async fn fetch_statements(
        &self,
        ticker: &str,
        period_type: PeriodType,
        periods: usize,
    ) -> Result<Vec<FinancialPeriod>, ResearchError> {
        let period_param = match period_type {
            PeriodType::Annual => "annual",
            PeriodType::Quarterly => "quarter",
        };
        let query = [
            ("period", period_param.to_string()),
            ("limit", periods.to_string()),
        ];

        let income: Vec<IncomeStatementRow> = self
            .get_json(&format!("income-statement/{}", ticker), &query)
            .await?;
        if income.is_empty() {
            return Err(ResearchError::NotFound(ticker.to_string()));
        }

        let balance: Vec<BalanceSheetRow> = self
            .get_json(&format!("balance-sheet-statement/{}", ticker), &query)
            .await?;
        let cash_flow: Vec<CashFlowRow> = self
            .get_json(&format!("cash-flow-statement/{}", ticker), &query)
            .await?;

        // Zip the three statements by (calendar year, quarter). Missing
        // balance/cash-flow rows leave those fields None rather than dropping
        // the whole period.
        let balance_by_key: HashMap<(i32, Option<u8>), &BalanceSheetRow> = balance
            .iter()
            .map(|b| (period_key(&b.calendar_year, &b.period), b))
            .collect();
        let cash_flow_by_key: HashMap<(i32, Option<u8>), &CashFlowRow> = cash_flow
            .iter()
            .map(|c| (period_key(&c.calendar_year, &c.period), c))
            .collect();

        let mapped = income
            .into_iter()
            .map(|inc| {
                let key = period_key(&inc.calendar_year, &inc.period);
                let bal = balance_by_key.get(&key);
                let cf = cash_flow_by_key.get(&key);

                let mut p = FinancialPeriod::empty(ticker, key.0);
                p.fiscal_quarter = key.1;

                p.revenue = inc.revenue;
                p.gross_profit = inc.gross_profit;
                p.operating_income = inc.operating_income;
                p.net_income = inc.net_income;
                p.ebitda = inc.ebitda;
                // FMP does not report EBIT directly; derive it from EBITDA
                // and D&A when both are present.
                p.ebit = match (inc.ebitda, inc.depreciation_and_amortization) {
                    (Some(e), Some(da)) => Some(e - da),
                    _ => inc.operating_income,
                };
                p.interest_expense = inc.interest_expense;
                p.eps_diluted = inc.eps_diluted;
                p.shares_diluted = inc.weighted_shares_diluted;

                if let Some(b) = bal {
                    p.total_assets = b.total_assets;
                    p.total_liabilities = b.total_liabilities;
                    p.current_assets = b.total_current_assets;
                    p.current_liabilities = b.total_current_liabilities;
                    p.long_term_debt = b.long_term_debt;
                    p.total_debt = b.total_debt;
                    p.shareholders_equity = b.total_stockholders_equity;
                    p.retained_earnings = b.retained_earnings;
                }

                if let Some(c) = cf {
                    p.operating_cash_flow = c.operating_cash_flow;
                    p.free_cash_flow = c.free_cash_flow;
                    p.capital_expenditure = c.capital_expenditure;
                    p.common_stock_repurchased = c.common_stock_repurchased;
                    if p.depreciation_amortization.is_none() {
                        p.depreciation_amortization = c.depreciation_and_amortization;
                    }
                }
                if p.depreciation_amortization.is_none() {
                    p.depreciation_amortization = inc.depreciation_and_amortization;
                }

                p
            })
            .collect();

        Ok(mapped)
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<Quote, ResearchError> {
        let quotes: Vec<QuoteRow> = self.get_json(&format!("quote/{}", ticker), &[]).await?;
        let row = quotes
            .into_iter()
            .next()
            .ok_or_else(|| ResearchError::NotFound(ticker.to_string()))?;

        // Profile carries the sector; a profile failure only loses the sector.
        let sector = match self
            .get_json::<Vec<ProfileRow>>(&format!("profile/{}", ticker), &[])
            .await
        {
            Ok(profiles) => profiles.into_iter().next().and_then(|p| p.sector),
            Err(e) => {
                tracing::warn!("profile fetch failed for {}: {}", ticker, e);
                None
            }
        };

        Ok(Quote {
            ticker: row.symbol,
            price: row.price.unwrap_or(0.0),
            market_cap: row.market_cap,
            sector,
            as_of: Utc::now(),
        })
    }

    async fn fetch_dcf(&self, ticker: &str) -> Result<Option<DcfSnapshot>, ResearchError> {
        let rows: Vec<DcfRow> = match self
            .get_json(&format!("discounted-cash-flow/{}", ticker), &[])
            .await
        {
            Ok(rows) => rows,
            // DCF is optional data; a missing endpoint is "unavailable", not an error
            Err(ResearchError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(rows.into_iter().next().and_then(|r| {
            r.dcf.map(|iv| DcfSnapshot {
                ticker: ticker.to_string(),
                intrinsic_value: iv,
                as_of: Utc::now(),
            })
        }))
    }

    fn name(&self) -> &'static str {
        "fmp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_parsing() {
        assert_eq!(parse_quarter("FY"), None);
        assert_eq!(parse_quarter("Q1"), Some(1));
        assert_eq!(parse_quarter("Q4"), Some(4));
        assert_eq!(parse_quarter("H1"), None);
    }

    #[test]
    fn statement_rows_deserialize_from_fmp_shape() {
        let json = r#"[{
            "calendarYear": "2024",
            "period": "FY",
            "revenue": 391035000000,
            "grossProfit": 180683000000,
            "operatingIncome": 123216000000,
            "netIncome": 93736000000,
            "ebitda": 134661000000,
            "interestExpense": 0,
            "epsdiluted": 6.08,
            "depreciationAndAmortization": 11445000000,
            "weightedAverageShsOutDil": 15408095000
        }]"#;

        let rows: Vec<IncomeStatementRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].calendar_year, "2024");
        assert_eq!(rows[0].eps_diluted, Some(6.08));
        assert_eq!(rows[0].weighted_shares_diluted, Some(15_408_095_000.0));
    }
}
