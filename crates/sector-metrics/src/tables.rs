//! Static sector reference tables.
//!
//! Typical (min, median, max) ranges per GICS sector for ten fundamental
//! ratios, plus median valuation multiples. Built once at startup as an
//! immutable object and injected into the engines, so tests can substitute
//! synthetic tables without touching global state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Unknown or missing sector names resolve to this row. Deliberate: always
/// return some percentile rather than omitting the field.
pub const DEFAULT_SECTOR: &str = "Technology";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SectorRange {
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

const fn r(min: f64, median: f64, max: f64) -> SectorRange {
    SectorRange { min, median, max }
}

/// Typical ranges for the ten sector-relative ratios. Percent units except
/// debt/equity, current ratio, and asset turnover, which are plain ratios.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RatioRanges {
    pub roic: SectorRange,
    pub roe: SectorRange,
    pub operating_margin: SectorRange,
    pub debt_to_equity: SectorRange,
    pub current_ratio: SectorRange,
    pub asset_turnover: SectorRange,
    pub revenue_growth: SectorRange,
    pub eps_growth: SectorRange,
    pub accrual_ratio: SectorRange,
    pub buyback_yield: SectorRange,
}

/// Median valuation multiples per sector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MultipleMedians {
    pub pe: f64,
    pub peg: f64,
    pub ev_to_ebitda: f64,
    pub price_to_fcf: f64,
    pub price_to_book: f64,
}

pub struct SectorTables {
    ranges: HashMap<String, RatioRanges>,
    multiples: HashMap<String, MultipleMedians>,
    default_ranges: RatioRanges,
    default_multiples: MultipleMedians,
}

impl SectorTables {
    /// Build from explicit maps plus the fallback row used for unknown sectors.
    pub fn new(
        ranges: HashMap<String, RatioRanges>,
        multiples: HashMap<String, MultipleMedians>,
        default_ranges: RatioRanges,
        default_multiples: MultipleMedians,
    ) -> Self {
        Self {
            ranges,
            multiples,
            default_ranges,
            default_multiples,
        }
    }

    pub fn ratio_ranges(&self, sector: &str) -> &RatioRanges {
        self.ranges.get(sector).unwrap_or_else(|| {
            tracing::warn!(sector, "unknown sector, falling back to {DEFAULT_SECTOR} ranges");
            &self.default_ranges
        })
    }

    pub fn multiple_medians(&self, sector: &str) -> &MultipleMedians {
        self.multiples.get(sector).unwrap_or_else(|| {
            tracing::warn!(sector, "unknown sector, falling back to {DEFAULT_SECTOR} multiples");
            &self.default_multiples
        })
    }

    /// The built-in 11-sector GICS table.
    pub fn builtin() -> Self {
        let rows: [(&str, RatioRanges, MultipleMedians); 11] = [
            (
                "Technology",
                RatioRanges {
                    roic: r(2.0, 15.0, 35.0),
                    roe: r(5.0, 18.0, 45.0),
                    operating_margin: r(5.0, 20.0, 35.0),
                    debt_to_equity: r(0.1, 0.6, 1.5),
                    current_ratio: r(1.0, 1.8, 3.5),
                    asset_turnover: r(0.3, 0.7, 1.2),
                    revenue_growth: r(0.0, 12.0, 40.0),
                    eps_growth: r(-5.0, 12.0, 45.0),
                    accrual_ratio: r(-15.0, -5.0, 10.0),
                    buyback_yield: r(0.0, 1.5, 6.0),
                },
                MultipleMedians {
                    pe: 28.0,
                    peg: 2.0,
                    ev_to_ebitda: 18.0,
                    price_to_fcf: 25.0,
                    price_to_book: 6.0,
                },
            ),
            (
                "Healthcare",
                RatioRanges {
                    roic: r(0.0, 10.0, 28.0),
                    roe: r(0.0, 14.0, 35.0),
                    operating_margin: r(2.0, 15.0, 30.0),
                    debt_to_equity: r(0.2, 0.8, 2.0),
                    current_ratio: r(0.9, 1.6, 3.0),
                    asset_turnover: r(0.3, 0.6, 1.1),
                    revenue_growth: r(0.0, 8.0, 25.0),
                    eps_growth: r(-10.0, 8.0, 30.0),
                    accrual_ratio: r(-12.0, -4.0, 12.0),
                    buyback_yield: r(0.0, 1.0, 4.0),
                },
                MultipleMedians {
                    pe: 22.0,
                    peg: 2.2,
                    ev_to_ebitda: 14.0,
                    price_to_fcf: 20.0,
                    price_to_book: 4.0,
                },
            ),
            (
                "Financial Services",
                RatioRanges {
                    roic: r(1.0, 6.0, 15.0),
                    roe: r(4.0, 11.0, 22.0),
                    operating_margin: r(10.0, 25.0, 45.0),
                    debt_to_equity: r(0.5, 1.5, 4.0),
                    current_ratio: r(0.8, 1.1, 2.0),
                    asset_turnover: r(0.02, 0.08, 0.25),
                    revenue_growth: r(-2.0, 6.0, 20.0),
                    eps_growth: r(-10.0, 7.0, 25.0),
                    accrual_ratio: r(-10.0, -2.0, 15.0),
                    buyback_yield: r(0.0, 2.0, 7.0),
                },
                MultipleMedians {
                    pe: 13.0,
                    peg: 1.4,
                    ev_to_ebitda: 10.0,
                    price_to_fcf: 12.0,
                    price_to_book: 1.4,
                },
            ),
            (
                "Consumer Cyclical",
                RatioRanges {
                    roic: r(2.0, 10.0, 25.0),
                    roe: r(4.0, 15.0, 40.0),
                    operating_margin: r(2.0, 9.0, 20.0),
                    debt_to_equity: r(0.3, 1.0, 2.5),
                    current_ratio: r(0.8, 1.4, 2.5),
                    asset_turnover: r(0.6, 1.2, 2.2),
                    revenue_growth: r(-5.0, 6.0, 25.0),
                    eps_growth: r(-15.0, 8.0, 35.0),
                    accrual_ratio: r(-12.0, -4.0, 12.0),
                    buyback_yield: r(0.0, 1.8, 6.0),
                },
                MultipleMedians {
                    pe: 18.0,
                    peg: 1.6,
                    ev_to_ebitda: 11.0,
                    price_to_fcf: 16.0,
                    price_to_book: 3.0,
                },
            ),
            (
                "Consumer Defensive",
                RatioRanges {
                    roic: r(4.0, 11.0, 25.0),
                    roe: r(6.0, 16.0, 40.0),
                    operating_margin: r(3.0, 10.0, 22.0),
                    debt_to_equity: r(0.3, 1.0, 2.2),
                    current_ratio: r(0.7, 1.2, 2.2),
                    asset_turnover: r(0.7, 1.3, 2.5),
                    revenue_growth: r(-2.0, 4.0, 15.0),
                    eps_growth: r(-8.0, 6.0, 20.0),
                    accrual_ratio: r(-10.0, -3.0, 10.0),
                    buyback_yield: r(0.0, 1.5, 5.0),
                },
                MultipleMedians {
                    pe: 20.0,
                    peg: 2.6,
                    ev_to_ebitda: 13.0,
                    price_to_fcf: 19.0,
                    price_to_book: 4.0,
                },
            ),
            (
                "Industrials",
                RatioRanges {
                    roic: r(3.0, 10.0, 22.0),
                    roe: r(5.0, 14.0, 32.0),
                    operating_margin: r(4.0, 11.0, 22.0),
                    debt_to_equity: r(0.3, 0.9, 2.2),
                    current_ratio: r(0.9, 1.5, 2.8),
                    asset_turnover: r(0.5, 0.9, 1.6),
                    revenue_growth: r(-3.0, 5.0, 18.0),
                    eps_growth: r(-10.0, 8.0, 28.0),
                    accrual_ratio: r(-12.0, -4.0, 10.0),
                    buyback_yield: r(0.0, 1.5, 5.0),
                },
                MultipleMedians {
                    pe: 19.0,
                    peg: 1.9,
                    ev_to_ebitda: 12.0,
                    price_to_fcf: 18.0,
                    price_to_book: 3.2,
                },
            ),
            (
                "Energy",
                RatioRanges {
                    roic: r(-5.0, 8.0, 25.0),
                    roe: r(-8.0, 10.0, 30.0),
                    operating_margin: r(0.0, 12.0, 30.0),
                    debt_to_equity: r(0.2, 0.7, 1.8),
                    current_ratio: r(0.8, 1.3, 2.4),
                    asset_turnover: r(0.4, 0.8, 1.5),
                    revenue_growth: r(-20.0, 5.0, 40.0),
                    eps_growth: r(-30.0, 5.0, 50.0),
                    accrual_ratio: r(-15.0, -5.0, 12.0),
                    buyback_yield: r(0.0, 2.5, 9.0),
                },
                MultipleMedians {
                    pe: 11.0,
                    peg: 1.2,
                    ev_to_ebitda: 6.0,
                    price_to_fcf: 9.0,
                    price_to_book: 1.8,
                },
            ),
            (
                "Utilities",
                RatioRanges {
                    roic: r(2.0, 5.0, 10.0),
                    roe: r(4.0, 9.0, 16.0),
                    operating_margin: r(10.0, 20.0, 32.0),
                    debt_to_equity: r(0.8, 1.5, 2.8),
                    current_ratio: r(0.6, 0.9, 1.5),
                    asset_turnover: r(0.2, 0.35, 0.6),
                    revenue_growth: r(-2.0, 3.0, 10.0),
                    eps_growth: r(-8.0, 4.0, 14.0),
                    accrual_ratio: r(-8.0, 0.0, 14.0),
                    buyback_yield: r(0.0, 0.2, 2.0),
                },
                MultipleMedians {
                    pe: 17.0,
                    peg: 3.0,
                    ev_to_ebitda: 11.0,
                    price_to_fcf: 15.0,
                    price_to_book: 1.9,
                },
            ),
            (
                "Real Estate",
                RatioRanges {
                    roic: r(1.0, 4.0, 9.0),
                    roe: r(2.0, 7.0, 15.0),
                    operating_margin: r(10.0, 28.0, 50.0),
                    debt_to_equity: r(0.6, 1.2, 2.5),
                    current_ratio: r(0.5, 1.0, 2.5),
                    asset_turnover: r(0.08, 0.18, 0.4),
                    revenue_growth: r(-5.0, 4.0, 15.0),
                    eps_growth: r(-15.0, 4.0, 22.0),
                    accrual_ratio: r(-8.0, 0.0, 15.0),
                    buyback_yield: r(0.0, 0.5, 3.0),
                },
                MultipleMedians {
                    pe: 32.0,
                    peg: 3.2,
                    ev_to_ebitda: 17.0,
                    price_to_fcf: 18.0,
                    price_to_book: 2.2,
                },
            ),
            (
                "Basic Materials",
                RatioRanges {
                    roic: r(0.0, 9.0, 22.0),
                    roe: r(2.0, 12.0, 28.0),
                    operating_margin: r(3.0, 12.0, 25.0),
                    debt_to_equity: r(0.2, 0.8, 2.0),
                    current_ratio: r(1.0, 1.7, 3.0),
                    asset_turnover: r(0.4, 0.8, 1.4),
                    revenue_growth: r(-12.0, 4.0, 28.0),
                    eps_growth: r(-25.0, 6.0, 40.0),
                    accrual_ratio: r(-14.0, -5.0, 10.0),
                    buyback_yield: r(0.0, 1.2, 5.0),
                },
                MultipleMedians {
                    pe: 14.0,
                    peg: 1.6,
                    ev_to_ebitda: 8.0,
                    price_to_fcf: 13.0,
                    price_to_book: 2.0,
                },
            ),
            (
                "Communication Services",
                RatioRanges {
                    roic: r(1.0, 9.0, 24.0),
                    roe: r(2.0, 12.0, 30.0),
                    operating_margin: r(3.0, 14.0, 30.0),
                    debt_to_equity: r(0.3, 1.0, 2.4),
                    current_ratio: r(0.7, 1.3, 2.6),
                    asset_turnover: r(0.3, 0.6, 1.1),
                    revenue_growth: r(-4.0, 6.0, 22.0),
                    eps_growth: r(-15.0, 8.0, 35.0),
                    accrual_ratio: r(-12.0, -4.0, 12.0),
                    buyback_yield: r(0.0, 2.0, 7.0),
                },
                MultipleMedians {
                    pe: 17.0,
                    peg: 1.5,
                    ev_to_ebitda: 9.0,
                    price_to_fcf: 14.0,
                    price_to_book: 2.6,
                },
            ),
        ];

        let mut ranges = HashMap::new();
        let mut multiples = HashMap::new();
        let mut default_ranges = None;
        let mut default_multiples = None;

        for (sector, rr, mm) in rows {
            if sector == DEFAULT_SECTOR {
                default_ranges = Some(rr);
                default_multiples = Some(mm);
            }
            ranges.insert(sector.to_string(), rr);
            multiples.insert(sector.to_string(), mm);
        }

        // The row list above always carries the default sector.
        let default_ranges = default_ranges.unwrap_or(rows[0].1);
        let default_multiples = default_multiples.unwrap_or(rows[0].2);

        Self::new(ranges, multiples, default_ranges, default_multiples)
    }
}
