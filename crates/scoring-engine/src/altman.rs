//! Altman Z-Score: Z = 1.2A + 1.4B + 3.3C + 0.6D + 1.0E.
//!
//! Any component whose denominator is zero or missing contributes 0, never an
//! error. Zones: > 2.99 safe, < 1.81 distress, gray between (inclusive).

use research_core::{AltmanComponents, AltmanZScore, AltmanZone, FinancialPeriod};

use crate::safe_ratio;

pub fn z_score(period: &FinancialPeriod, market_cap: Option<f64>) -> AltmanZScore {
    let working_capital = match (period.current_assets, period.current_liabilities) {
        (Some(ca), Some(cl)) => Some(ca - cl),
        _ => None,
    };

    let components = AltmanComponents {
        working_capital_ratio: safe_ratio(working_capital, period.total_assets).unwrap_or(0.0),
        retained_earnings_ratio: safe_ratio(period.retained_earnings, period.total_assets)
            .unwrap_or(0.0),
        ebit_ratio: safe_ratio(period.ebit, period.total_assets).unwrap_or(0.0),
        market_leverage_ratio: safe_ratio(market_cap, period.total_liabilities).unwrap_or(0.0),
        asset_turnover: safe_ratio(period.revenue, period.total_assets).unwrap_or(0.0),
    };

    let score = 1.2 * components.working_capital_ratio
        + 1.4 * components.retained_earnings_ratio
        + 3.3 * components.ebit_ratio
        + 0.6 * components.market_leverage_ratio
        + 1.0 * components.asset_turnover;

    AltmanZScore {
        score,
        zone: AltmanZone::from_score(score),
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_b() -> FinancialPeriod {
        let mut p = FinancialPeriod::empty("TEST", 2024);
        p.current_assets = Some(500.0);
        p.current_liabilities = Some(250.0);
        p.total_assets = Some(1000.0);
        p.retained_earnings = Some(300.0);
        p.ebit = Some(150.0);
        p.total_liabilities = Some(400.0);
        p.revenue = Some(1000.0);
        p
    }

    #[test]
    fn scenario_b_safe_zone() {
        let z = z_score(&scenario_b(), Some(2000.0));

        assert!((z.components.working_capital_ratio - 0.25).abs() < 1e-9);
        assert!((z.components.retained_earnings_ratio - 0.30).abs() < 1e-9);
        assert!((z.components.ebit_ratio - 0.15).abs() < 1e-9);
        assert!((z.components.market_leverage_ratio - 5.0).abs() < 1e-9);
        assert!((z.components.asset_turnover - 1.0).abs() < 1e-9);

        assert!((z.score - 5.215).abs() < 1e-9);
        assert_eq!(z.zone, AltmanZone::Safe);
    }

    #[test]
    fn zero_denominators_zero_components() {
        let mut p = scenario_b();
        p.total_assets = Some(0.0);
        p.total_liabilities = Some(0.0);

        let z = z_score(&p, Some(2000.0));
        assert_eq!(z.components.working_capital_ratio, 0.0);
        assert_eq!(z.components.market_leverage_ratio, 0.0);
        assert_eq!(z.score, 0.0);
        assert_eq!(z.zone, AltmanZone::Distress);
    }

    #[test]
    fn zone_thresholds_are_exact() {
        assert_eq!(AltmanZone::from_score(3.0), AltmanZone::Safe);
        assert_eq!(AltmanZone::from_score(2.99), AltmanZone::Gray);
        assert_eq!(AltmanZone::from_score(1.81), AltmanZone::Gray);
        assert_eq!(AltmanZone::from_score(1.80), AltmanZone::Distress);
    }
}
