//! Sector-relative metric placement.
//!
//! Computes each fundamental ratio from statement data, then places it within
//! the sector's typical range as a 0-100 percentile. Valuation multiples are
//! compared against sector medians instead of ranges.

pub mod percentile;
pub mod tables;

use std::sync::Arc;

use research_core::{
    FinancialPeriod, MultipleBundle, MultipleComparison, Quote, SectorMetric, SectorMetricBundle,
};
use scoring_engine::{metrics, valuation};

pub use percentile::{percentile, percentile_inverted};
pub use tables::{MultipleMedians, RatioRanges, SectorRange, SectorTables, DEFAULT_SECTOR};

pub struct SectorMetricsEngine {
    tables: Arc<SectorTables>,
}

impl SectorMetricsEngine {
    pub fn new(tables: Arc<SectorTables>) -> Self {
        Self { tables }
    }

    /// Place the ten fundamental ratios within the sector's ranges.
    /// A missing sector uses the default row; a missing underlying value
    /// degrades that one metric's percentile to `None`.
    pub fn metric_bundle(
        &self,
        sector: Option<&str>,
        current: &FinancialPeriod,
        prior: Option<&FinancialPeriod>,
        quote: &Quote,
    ) -> SectorMetricBundle {
        let ranges = self.tables.ratio_ranges(sector.unwrap_or(DEFAULT_SECTOR));

        SectorMetricBundle {
            roic: place(metrics::roic(current), &ranges.roic, false),
            roe: place(metrics::roe(current), &ranges.roe, false),
            operating_margin: place(
                metrics::operating_margin(current),
                &ranges.operating_margin,
                false,
            ),
            debt_to_equity: place(metrics::debt_to_equity(current), &ranges.debt_to_equity, true),
            current_ratio: place(metrics::current_ratio(current), &ranges.current_ratio, false),
            asset_turnover: place(metrics::asset_turnover(current), &ranges.asset_turnover, false),
            revenue_growth_yoy: place(
                prior.and_then(|p| metrics::revenue_growth_yoy(current, p)),
                &ranges.revenue_growth,
                false,
            ),
            eps_growth_yoy: place(
                prior.and_then(|p| metrics::eps_growth_yoy(current, p)),
                &ranges.eps_growth,
                false,
            ),
            accrual_ratio: place(
                metrics::accrual_ratio(current, prior),
                &ranges.accrual_ratio,
                true,
            ),
            buyback_yield: place(
                metrics::buyback_yield(current, quote.market_cap),
                &ranges.buyback_yield,
                false,
            ),
        }
    }

    /// Compare valuation multiples against sector medians.
    pub fn multiple_bundle(
        &self,
        sector: Option<&str>,
        current: &FinancialPeriod,
        prior: Option<&FinancialPeriod>,
        quote: &Quote,
    ) -> MultipleBundle {
        let medians = self.tables.multiple_medians(sector.unwrap_or(DEFAULT_SECTOR));

        let pe = valuation::pe_ratio(current, quote);
        let eps_growth = prior.and_then(|p| metrics::eps_growth_yoy(current, p));

        MultipleBundle {
            pe: compare(pe, medians.pe),
            peg: compare(valuation::peg_ratio(pe, eps_growth), medians.peg),
            ev_to_ebitda: compare(valuation::ev_to_ebitda(current, quote), medians.ev_to_ebitda),
            price_to_fcf: compare(valuation::price_to_fcf(current, quote), medians.price_to_fcf),
            price_to_book: compare(
                valuation::price_to_book(current, quote),
                medians.price_to_book,
            ),
        }
    }
}

fn place(value: Option<f64>, range: &SectorRange, inverted: bool) -> SectorMetric {
    let pct = value.map(|v| {
        if inverted {
            percentile_inverted(v, range.min, range.max)
        } else {
            percentile(v, range.min, range.max)
        }
    });

    SectorMetric {
        value,
        sector_min: range.min,
        sector_median: range.median,
        sector_max: range.max,
        percentile: pct,
    }
}

fn compare(value: Option<f64>, median: f64) -> MultipleComparison {
    let ratio_to_median = match value {
        Some(v) if median > 0.0 => Some(v / median),
        _ => None,
    };

    MultipleComparison {
        value,
        sector_median: median,
        ratio_to_median,
    }
}
