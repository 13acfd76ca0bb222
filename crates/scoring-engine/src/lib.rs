//! Pure scoring functions over normalized financial statements.
//!
//! Every formula guards every division: a zero or missing denominator degrades
//! that single metric to its documented default (0, `false`, or `None`) rather
//! than raising. Only a wholesale missing period is an error, and that is
//! surfaced by the repository, never here.

pub mod altman;
pub mod metrics;
pub mod piotroski;
pub mod valuation;

use research_core::{DcfSnapshot, FinancialPeriod, Quote, ScoreResult};

/// Stateless facade over the individual scoring functions. Safe to share
/// across any number of request tasks.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute the full score bundle from the most recent period, the prior
    /// fiscal-year period when available, and the current quote. YoY-based
    /// scores degrade to `None` without a prior period.
    pub fn score(
        &self,
        current: &FinancialPeriod,
        prior: Option<&FinancialPeriod>,
        quote: &Quote,
        dcf: Option<&DcfSnapshot>,
    ) -> ScoreResult {
        let piotroski = prior.map(|p| piotroski::f_score(current, p));
        let altman = Some(altman::z_score(current, quote.market_cap));
        let rule_of_40 = valuation::rule_of_40(current, prior);
        let dcf = valuation::assess_dcf(dcf.map(|d| d.intrinsic_value), quote.price);
        let owner_earnings = metrics::owner_earnings(current, quote.market_cap);

        ScoreResult {
            piotroski,
            altman,
            rule_of_40,
            dcf,
            owner_earnings,
        }
    }
}

/// `numerator / denominator` when the denominator is strictly positive.
/// Negative and zero denominators both yield `None`; the ratios we compute
/// are meaningless against a non-positive base.
pub(crate) fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => Some(n / d),
        _ => None,
    }
}
