//! Rule of 40, the DCF threshold classifier, and valuation multiples.

use research_core::{
    DcfAssessment, FinancialPeriod, MarginSource, Quote, RuleOf40, ValuationVerdict,
};

use crate::{metrics, safe_ratio};

/// Rule of 40: revenue growth YoY % + profit margin %. FCF margin is the
/// canonical margin; EBITDA margin is the fallback when FCF is unreported.
/// The choice is recorded in the result so consumers can tell them apart.
pub fn rule_of_40(current: &FinancialPeriod, prior: Option<&FinancialPeriod>) -> RuleOf40 {
    let revenue_growth = prior.and_then(|p| metrics::revenue_growth_yoy(current, p));

    let (margin, margin_source) = match safe_ratio(current.free_cash_flow, current.revenue) {
        Some(fcf_margin) => (Some(fcf_margin * 100.0), Some(MarginSource::FreeCashFlow)),
        None => match safe_ratio(current.ebitda, current.revenue) {
            Some(ebitda_margin) => (Some(ebitda_margin * 100.0), Some(MarginSource::Ebitda)),
            None => (None, None),
        },
    };

    let score = match (revenue_growth, margin) {
        (Some(g), Some(m)) => Some(g + m),
        _ => None,
    };

    RuleOf40 {
        score,
        revenue_growth_percent: revenue_growth,
        profit_margin_percent: margin,
        margin_source,
        passed: score.is_some_and(|s| s >= 40.0),
    }
}

/// Classify price against an externally supplied intrinsic value.
/// >15% upside = undervalued, >15% downside = overvalued, else fairly valued.
/// A zero price or a missing intrinsic value yields NotAvailable with the
/// difference unset.
pub fn assess_dcf(intrinsic_value: Option<f64>, current_price: f64) -> DcfAssessment {
    let (difference_percent, verdict) = match intrinsic_value {
        Some(iv) if current_price > 0.0 => {
            let diff = (iv - current_price) / current_price * 100.0;
            let verdict = if diff > 15.0 {
                ValuationVerdict::Undervalued
            } else if diff < -15.0 {
                ValuationVerdict::Overvalued
            } else {
                ValuationVerdict::FairlyValued
            };
            (Some(diff), verdict)
        }
        _ => (None, ValuationVerdict::NotAvailable),
    };

    DcfAssessment {
        intrinsic_value,
        current_price,
        difference_percent,
        verdict,
    }
}

/// P/E from price and diluted EPS. Negative earnings yield no multiple.
pub fn pe_ratio(period: &FinancialPeriod, quote: &Quote) -> Option<f64> {
    safe_ratio(Some(quote.price), period.eps_diluted)
}

/// PEG from P/E and EPS growth; only meaningful for positive growth.
pub fn peg_ratio(pe: Option<f64>, eps_growth_percent: Option<f64>) -> Option<f64> {
    safe_ratio(pe, eps_growth_percent)
}

/// Enterprise value / EBITDA, with EV approximated as
/// market cap + total debt - nothing (cash is not modeled separately).
pub fn ev_to_ebitda(period: &FinancialPeriod, quote: &Quote) -> Option<f64> {
    let ev = match (quote.market_cap, period.total_debt) {
        (Some(mc), Some(debt)) => Some(mc + debt),
        (Some(mc), None) => Some(mc),
        _ => None,
    };
    safe_ratio(ev, period.ebitda)
}

/// Price / free cash flow per the whole company (market cap / FCF).
pub fn price_to_fcf(period: &FinancialPeriod, quote: &Quote) -> Option<f64> {
    safe_ratio(quote.market_cap, period.free_cash_flow)
}

/// Price / book value (market cap / shareholders' equity).
pub fn price_to_book(period: &FinancialPeriod, quote: &Quote) -> Option<f64> {
    safe_ratio(quote.market_cap, period.shareholders_equity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn period_with(revenue: f64, fcf: Option<f64>, ebitda: Option<f64>) -> FinancialPeriod {
        let mut p = FinancialPeriod::empty("TEST", 2024);
        p.revenue = Some(revenue);
        p.free_cash_flow = fcf;
        p.ebitda = ebitda;
        p
    }

    #[test]
    fn scenario_c_rule_of_40() {
        // 25% growth + 20% FCF margin = 45, passes
        let current = period_with(1250.0, Some(250.0), None);
        let mut prior = FinancialPeriod::empty("TEST", 2023);
        prior.revenue = Some(1000.0);

        let r = rule_of_40(&current, Some(&prior));
        assert!((r.revenue_growth_percent.unwrap() - 25.0).abs() < 1e-9);
        assert!((r.profit_margin_percent.unwrap() - 20.0).abs() < 1e-9);
        assert!((r.score.unwrap() - 45.0).abs() < 1e-9);
        assert!(r.passed);

        // 10% growth + 15% margin = 25, fails
        let current = period_with(1100.0, Some(165.0), None);
        let r = rule_of_40(&current, Some(&prior));
        assert!((r.score.unwrap() - 25.0).abs() < 1e-9);
        assert!(!r.passed);
    }

    #[test]
    fn rule_of_40_falls_back_to_ebitda_margin() {
        let current = period_with(1000.0, None, Some(300.0));
        let mut prior = FinancialPeriod::empty("TEST", 2023);
        prior.revenue = Some(800.0);

        let r = rule_of_40(&current, Some(&prior));
        assert_eq!(r.margin_source, Some(MarginSource::Ebitda));
        assert!((r.profit_margin_percent.unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn rule_of_40_degrades_without_prior_period() {
        let current = period_with(1000.0, Some(200.0), None);
        let r = rule_of_40(&current, None);
        assert_eq!(r.score, None);
        assert!(!r.passed);
        // the margin side is still reported
        assert!((r.profit_margin_percent.unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn dcf_thresholds() {
        assert_eq!(
            assess_dcf(Some(120.0), 100.0).verdict,
            ValuationVerdict::Undervalued
        );
        assert_eq!(
            assess_dcf(Some(80.0), 100.0).verdict,
            ValuationVerdict::Overvalued
        );
        assert_eq!(
            assess_dcf(Some(110.0), 100.0).verdict,
            ValuationVerdict::FairlyValued
        );

        let na = assess_dcf(Some(120.0), 0.0);
        assert_eq!(na.verdict, ValuationVerdict::NotAvailable);
        assert_eq!(na.difference_percent, None);

        assert_eq!(
            assess_dcf(None, 100.0).verdict,
            ValuationVerdict::NotAvailable
        );
    }

    #[test]
    fn multiples_guard_denominators() {
        let mut p = FinancialPeriod::empty("TEST", 2024);
        p.eps_diluted = Some(-2.0);
        let quote = Quote {
            ticker: "TEST".to_string(),
            price: 100.0,
            market_cap: Some(1_000_000.0),
            sector: None,
            as_of: Utc::now(),
        };
        assert_eq!(pe_ratio(&p, &quote), None);

        p.eps_diluted = Some(5.0);
        assert_eq!(pe_ratio(&p, &quote), Some(20.0));
        assert_eq!(peg_ratio(Some(20.0), Some(10.0)), Some(2.0));
        assert_eq!(peg_ratio(Some(20.0), Some(-5.0)), None);
    }
}
