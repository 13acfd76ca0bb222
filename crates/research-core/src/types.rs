use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fiscal period's fundamentals for a ticker, normalized by a provider
/// adapter into absolute units and a single currency. Immutable once built;
/// a refetch produces a new record, it never patches an old one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub ticker: String,
    pub fiscal_year: i32,
    /// None = annual period.
    pub fiscal_quarter: Option<u8>,

    // Income statement
    pub revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,
    pub ebit: Option<f64>,
    pub ebitda: Option<f64>,
    pub interest_expense: Option<f64>,
    pub eps_diluted: Option<f64>,

    // Balance sheet
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub current_assets: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub long_term_debt: Option<f64>,
    pub total_debt: Option<f64>,
    pub shareholders_equity: Option<f64>,
    pub retained_earnings: Option<f64>,

    // Cash flow. capital_expenditure is as reported (negative = outflow).
    // common_stock_repurchased is signed: negative = cash spent on buybacks.
    pub operating_cash_flow: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub capital_expenditure: Option<f64>,
    pub depreciation_amortization: Option<f64>,
    pub common_stock_repurchased: Option<f64>,

    /// Weighted diluted share count for the period, when the provider reports it.
    pub shares_diluted: Option<f64>,
}

impl FinancialPeriod {
    pub fn empty(ticker: &str, fiscal_year: i32) -> Self {
        Self {
            ticker: ticker.to_string(),
            fiscal_year,
            fiscal_quarter: None,
            revenue: None,
            gross_profit: None,
            operating_income: None,
            net_income: None,
            ebit: None,
            ebitda: None,
            interest_expense: None,
            eps_diluted: None,
            total_assets: None,
            total_liabilities: None,
            current_assets: None,
            current_liabilities: None,
            long_term_debt: None,
            total_debt: None,
            shareholders_equity: None,
            retained_earnings: None,
            operating_cash_flow: None,
            free_cash_flow: None,
            capital_expenditure: None,
            depreciation_amortization: None,
            common_stock_repurchased: None,
            shares_diluted: None,
        }
    }
}

/// Current market quote plus the profile fields scoring needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: String,
    pub price: f64,
    pub market_cap: Option<f64>,
    /// GICS-style sector name from the provider profile.
    pub sector: Option<String>,
    pub as_of: DateTime<Utc>,
}

/// Externally computed DCF intrinsic value. The discounting happens upstream
/// at the provider; we only classify price against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfSnapshot {
    pub ticker: String,
    pub intrinsic_value: f64,
    pub as_of: DateTime<Utc>,
}

/// The nine Piotroski tests, in canonical order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiotroskiBreakdown {
    pub positive_net_income: bool,
    pub positive_return_on_assets: bool,
    pub positive_operating_cash_flow: bool,
    pub cash_flow_exceeds_net_income: bool,
    pub lower_leverage: bool,
    pub higher_current_ratio: bool,
    pub no_new_shares: bool,
    pub higher_gross_margin: bool,
    pub higher_asset_turnover: bool,
}

impl PiotroskiBreakdown {
    pub fn count(&self) -> u8 {
        [
            self.positive_net_income,
            self.positive_return_on_assets,
            self.positive_operating_cash_flow,
            self.cash_flow_exceeds_net_income,
            self.lower_leverage,
            self.higher_current_ratio,
            self.no_new_shares,
            self.higher_gross_margin,
            self.higher_asset_turnover,
        ]
        .iter()
        .filter(|&&t| t)
        .count() as u8
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiotroskiScore {
    /// 0..=9
    pub score: u8,
    pub breakdown: PiotroskiBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltmanZone {
    Distress,
    Gray,
    Safe,
}

impl AltmanZone {
    pub fn from_score(score: f64) -> Self {
        if score > 2.99 {
            AltmanZone::Safe
        } else if score < 1.81 {
            AltmanZone::Distress
        } else {
            AltmanZone::Gray
        }
    }
}

/// The five Altman ratios before weighting.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AltmanComponents {
    /// (current assets - current liabilities) / total assets
    pub working_capital_ratio: f64,
    /// retained earnings / total assets
    pub retained_earnings_ratio: f64,
    /// EBIT / total assets
    pub ebit_ratio: f64,
    /// market cap / total liabilities
    pub market_leverage_ratio: f64,
    /// revenue / total assets
    pub asset_turnover: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AltmanZScore {
    pub score: f64,
    pub zone: AltmanZone,
    pub components: AltmanComponents,
}

/// Which margin fed the Rule of 40.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginSource {
    FreeCashFlow,
    Ebitda,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOf40 {
    pub score: Option<f64>,
    pub revenue_growth_percent: Option<f64>,
    pub profit_margin_percent: Option<f64>,
    pub margin_source: Option<MarginSource>,
    pub passed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationVerdict {
    Undervalued,
    Overvalued,
    FairlyValued,
    NotAvailable,
}

/// Threshold classification of price vs an externally supplied intrinsic value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfAssessment {
    pub intrinsic_value: Option<f64>,
    pub current_price: f64,
    pub difference_percent: Option<f64>,
    pub verdict: ValuationVerdict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerEarnings {
    pub owner_earnings: Option<f64>,
    pub yield_percent: Option<f64>,
}

/// All point-in-time scores for one ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub piotroski: Option<PiotroskiScore>,
    pub altman: Option<AltmanZScore>,
    pub rule_of_40: RuleOf40,
    pub dcf: DcfAssessment,
    pub owner_earnings: OwnerEarnings,
}

/// One ratio placed inside its sector's typical range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorMetric {
    pub value: Option<f64>,
    pub sector_min: f64,
    pub sector_median: f64,
    pub sector_max: f64,
    /// 0..=100, None when the underlying value could not be computed.
    pub percentile: Option<f64>,
}

/// The ten sector-relative fundamental metrics surfaced per stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorMetricBundle {
    pub roic: SectorMetric,
    pub roe: SectorMetric,
    pub operating_margin: SectorMetric,
    pub debt_to_equity: SectorMetric,
    pub current_ratio: SectorMetric,
    pub asset_turnover: SectorMetric,
    pub revenue_growth_yoy: SectorMetric,
    pub eps_growth_yoy: SectorMetric,
    pub accrual_ratio: SectorMetric,
    pub buyback_yield: SectorMetric,
}

/// One valuation multiple against its sector median.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipleComparison {
    pub value: Option<f64>,
    pub sector_median: f64,
    /// value / median, None when the multiple itself is unavailable.
    pub ratio_to_median: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipleBundle {
    pub pe: MultipleComparison,
    pub peg: MultipleComparison,
    pub ev_to_ebitda: MultipleComparison,
    pub price_to_fcf: MultipleComparison,
    pub price_to_book: MultipleComparison,
}

/// The externally visible scored-stock bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredStock {
    pub ticker: String,
    pub as_of: DateTime<Utc>,
    pub price: f64,
    pub sector: Option<String>,
    pub scores: ScoreResult,
    pub sector_metrics: SectorMetricBundle,
    pub multiples: MultipleBundle,
}
