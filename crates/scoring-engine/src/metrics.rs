//! Point-in-time ratios, YoY growth, and earnings-quality metrics.

use research_core::{FinancialPeriod, OwnerEarnings};

use crate::safe_ratio;

/// US corporate tax rate applied to EBIT for the NOPAT side of ROIC.
const TAX_RATE: f64 = 0.21;

/// ROIC as NOPAT / invested capital (total debt + equity), in percent.
pub fn roic(period: &FinancialPeriod) -> Option<f64> {
    let invested_capital = match (period.total_debt, period.shareholders_equity) {
        (Some(debt), Some(equity)) => Some(debt + equity),
        _ => None,
    };
    let nopat = period.ebit.map(|e| e * (1.0 - TAX_RATE));
    safe_ratio(nopat, invested_capital).map(|r| r * 100.0)
}

/// Return on equity, in percent.
pub fn roe(period: &FinancialPeriod) -> Option<f64> {
    safe_ratio(period.net_income, period.shareholders_equity).map(|r| r * 100.0)
}

/// Operating margin, in percent.
pub fn operating_margin(period: &FinancialPeriod) -> Option<f64> {
    safe_ratio(period.operating_income, period.revenue).map(|r| r * 100.0)
}

pub fn debt_to_equity(period: &FinancialPeriod) -> Option<f64> {
    safe_ratio(period.total_debt, period.shareholders_equity)
}

pub fn current_ratio(period: &FinancialPeriod) -> Option<f64> {
    safe_ratio(period.current_assets, period.current_liabilities)
}

pub fn asset_turnover(period: &FinancialPeriod) -> Option<f64> {
    safe_ratio(period.revenue, period.total_assets)
}

/// Revenue growth YoY in percent. Requires a strictly positive prior revenue.
pub fn revenue_growth_yoy(current: &FinancialPeriod, prior: &FinancialPeriod) -> Option<f64> {
    match (current.revenue, prior.revenue) {
        (Some(c), Some(p)) if p > 0.0 => Some((c - p) / p * 100.0),
        _ => None,
    }
}

/// EPS growth YoY in percent, with the three-way sign rule:
/// prior > 0 -> normal percent change; loss to profit -> flat +100;
/// loss to smaller loss -> (current - prior) / -prior * 100, so a shrinking
/// loss reads as positive growth. prior == 0 degrades to None.
pub fn eps_growth_yoy(current: &FinancialPeriod, prior: &FinancialPeriod) -> Option<f64> {
    let (c, p) = match (current.eps_diluted, prior.eps_diluted) {
        (Some(c), Some(p)) => (c, p),
        _ => return None,
    };

    if p > 0.0 {
        Some((c - p) / p * 100.0)
    } else if p < 0.0 && c > 0.0 {
        Some(100.0)
    } else if p < 0.0 {
        Some((c - p) / -p * 100.0)
    } else {
        None
    }
}

/// Owner earnings = net income + D&A - maintenance capex, with all capex
/// treated as maintenance (conservative default). Capex arrives as reported
/// (negative = outflow), so its magnitude is subtracted. Yield needs a
/// positive market cap.
pub fn owner_earnings(period: &FinancialPeriod, market_cap: Option<f64>) -> OwnerEarnings {
    let earnings = match (period.net_income, period.depreciation_amortization) {
        (Some(ni), Some(da)) => {
            let maintenance_capex = period.capital_expenditure.map_or(0.0, f64::abs);
            Some(ni + da - maintenance_capex)
        }
        _ => None,
    };

    let yield_percent = safe_ratio(earnings, market_cap).map(|r| r * 100.0);

    OwnerEarnings {
        owner_earnings: earnings,
        yield_percent,
    }
}

/// Accrual ratio = (net income - OCF) / average total assets * 100.
/// Uses the two-period average of assets when both are present, else the
/// current period's. Lower is better.
pub fn accrual_ratio(current: &FinancialPeriod, prior: Option<&FinancialPeriod>) -> Option<f64> {
    let avg_assets = match (current.total_assets, prior.and_then(|p| p.total_assets)) {
        (Some(c), Some(p)) => Some((c + p) / 2.0),
        (Some(c), None) => Some(c),
        _ => None,
    };

    let accruals = match (current.net_income, current.operating_cash_flow) {
        (Some(ni), Some(ocf)) => Some(ni - ocf),
        _ => None,
    };

    safe_ratio(accruals, avg_assets).map(|r| r * 100.0)
}

/// Buyback yield in percent, clamped to >= 0. Stock issuance (positive
/// repurchase field) reports exactly 0 rather than a negative yield; dilution
/// is penalized elsewhere.
pub fn buyback_yield(period: &FinancialPeriod, market_cap: Option<f64>) -> Option<f64> {
    let repurchased = period.common_stock_repurchased?;
    safe_ratio(Some(-repurchased), market_cap).map(|r| (r * 100.0).max(0.0))
}
