//! Finnhub provider adapter.
//!
//! Maps Finnhub's as-reported filings (concept/value pairs) into the canonical
//! `FinancialPeriod` shape. Finnhub has no DCF endpoint, so `fetch_dcf`
//! returns `Ok(None)`: unavailable, not an error.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use research_core::{
    DcfSnapshot, FinancialPeriod, FundamentalsProvider, PeriodType, Quote, ResearchError,
};
use reqwest::Client;
use serde::Deserialize;

const BASE_URL: &str = "https://finnhub.io/api/v1";

#[derive(Clone)]
pub struct FinnhubClient {
    api_key: String,
    client: Client,
}

impl FinnhubClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { api_key, client }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ResearchError> {
        let url = format!("{}/{}", BASE_URL, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ResearchError::Provider(e.to_string()))?;

        let status = response.status();
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

        response
            .json()
            .await
            .map_err(|e| ResearchError::Provider(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct FinancialsReported {
    #[serde(default)]
    data: Vec<ReportEntry>,
}

#[derive(Debug, Deserialize)]
struct ReportEntry {
    year: i32,
    /// 0 for annual filings.
    quarter: u8,
    report: Report,
}

#[derive(Debug, Deserialize)]
struct Report {
    #[serde(default)]
    bs: Vec<ConceptValue>,
    #[serde(default)]
    ic: Vec<ConceptValue>,
    #[serde(default)]
    cf: Vec<ConceptValue>,
}

#[derive(Debug, Deserialize)]
struct ConceptValue {
    concept: String,
    /// Numeric in practice, but occasionally "N/A" as a string.
    value: serde_json::Value,
}

/// First matching concept's numeric value.
fn find(items: &[ConceptValue], concepts: &[&str]) -> Option<f64> {
    for concept in concepts {
        if let Some(cv) = items.iter().find(|cv| cv.concept == *concept) {
            if let Some(v) = cv.value.as_f64() {
                return Some(v);
            }
        }
    }
    None
}

fn map_entry(ticker: &str, entry: &ReportEntry) -> FinancialPeriod {
    let ic = &entry.report.ic;
    let bs = &entry.report.bs;
    let cf = &entry.report.cf;

    let mut p = FinancialPeriod::empty(ticker, entry.year);
    p.fiscal_quarter = (entry.quarter > 0).then_some(entry.quarter);

    p.revenue = find(ic, &[
        "us-gaap_Revenues",
        "us-gaap_RevenueFromContractWithCustomerExcludingAssessedTax",
    ]);
    p.gross_profit = find(ic, &["us-gaap_GrossProfit"]);
    p.operating_income = find(ic, &["us-gaap_OperatingIncomeLoss"]);
    p.net_income = find(ic, &["us-gaap_NetIncomeLoss"]);
    p.ebit = p.operating_income;
    p.interest_expense = find(ic, &["us-gaap_InterestExpense"]);
    p.eps_diluted = find(ic, &["us-gaap_EarningsPerShareDiluted"]);
    p.shares_diluted = find(ic, &[
        "us-gaap_WeightedAverageNumberOfDilutedSharesOutstanding",
    ]);

    p.total_assets = find(bs, &["us-gaap_Assets"]);
    p.total_liabilities = find(bs, &["us-gaap_Liabilities"]);
    p.current_assets = find(bs, &["us-gaap_AssetsCurrent"]);
    p.current_liabilities = find(bs, &["us-gaap_LiabilitiesCurrent"]);
    p.long_term_debt = find(bs, &["us-gaap_LongTermDebtNoncurrent", "us-gaap_LongTermDebt"]);
    p.shareholders_equity = find(bs, &[
        "us-gaap_StockholdersEquity",
        "us-gaap_StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
    ]);
    p.retained_earnings = find(bs, &["us-gaap_RetainedEarningsAccumulatedDeficit"]);

    p.operating_cash_flow = find(cf, &[
        "us-gaap_NetCashProvidedByUsedInOperatingActivities",
        "us-gaap_NetCashProvidedByUsedInOperatingActivitiesContinuingOperations",
    ]);
    p.depreciation_amortization = find(cf, &[
        "us-gaap_DepreciationDepletionAndAmortization",
        "us-gaap_DepreciationAmortizationAndAccretionNet",
    ]);
    // Filings report these as positive payments; canonical form is signed outflow.
    p.capital_expenditure =
        find(cf, &["us-gaap_PaymentsToAcquirePropertyPlantAndEquipment"]).map(|v| -v);
    p.common_stock_repurchased =
        find(cf, &["us-gaap_PaymentsForRepurchaseOfCommonStock"]).map(|v| -v);
    p.free_cash_flow = match (p.operating_cash_flow, p.capital_expenditure) {
        (Some(ocf), Some(capex)) => Some(ocf + capex),
        _ => None,
    };

    p
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price; 0 for unknown symbols.
    c: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    /// Reported in millions USD.
    market_capitalization: Option<f64>,
    finnhub_industry: Option<String>,
}

#[async_trait]
impl FundamentalsProvider for FinnhubClient {
    async fn fetch_statements(
        &self,
        ticker: &str,
        period_type: PeriodType,
        periods: usize,
    ) -> Result<Vec<FinancialPeriod>, ResearchError> {
        let freq = match period_type {
            PeriodType::Annual => "annual",
            PeriodType::Quarterly => "quarterly",
        };

        let reported: FinancialsReported = self
            .get_json(
                "stock/financials-reported",
                &[("symbol", ticker), ("freq", freq)],
            )
            .await?;

        if reported.data.is_empty() {
            return Err(ResearchError::NotFound(ticker.to_string()));
        }

        Ok(reported
            .data
            .iter()
            .take(periods)
            .map(|entry| map_entry(ticker, entry))
            .collect())
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<Quote, ResearchError> {
        let quote: QuoteResponse = self.get_json("quote", &[("symbol", ticker)]).await?;
        if quote.c == 0.0 {
            return Err(ResearchError::NotFound(ticker.to_string()));
        }

        let profile = match self
            .get_json::<Profile>("stock/profile2", &[("symbol", ticker)])
            .await
        {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("profile fetch failed for {}: {}", ticker, e);
                None
            }
        };

        Ok(Quote {
            ticker: ticker.to_uppercase(),
            price: quote.c,
            market_cap: profile
                .as_ref()
                .and_then(|p| p.market_capitalization)
                .map(|m| m * 1_000_000.0),
            sector: profile.and_then(|p| p.finnhub_industry),
            as_of: Utc::now(),
        })
    }

    async fn fetch_dcf(&self, _ticker: &str) -> Result<Option<DcfSnapshot>, ResearchError> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "finnhub"
    }
}
