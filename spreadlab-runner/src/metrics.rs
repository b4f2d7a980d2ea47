//! Performance metrics: pure functions over the trade list.
//!
//! Every run is one trade per date, so the trade list doubles as the daily
//! P&L series. Amounts are in premium points times lot size.

use serde::{Deserialize, Serialize};
use spreadlab_core::domain::{InstrumentType, Trade};

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub trade_count: usize,
    pub winners: usize,
    pub losers: usize,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub avg_pnl_pct: f64,
    pub win_rate: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    /// Mean over sample standard deviation of per-trade P&L, not annualized.
    pub sharpe: f64,
    /// Largest peak-to-trough fall of cumulative P&L, as a non-positive amount.
    pub max_drawdown: f64,
    pub profit_factor: f64,
    pub pe_trades: usize,
    pub ce_trades: usize,
    pub pe_pnl: f64,
    pub ce_pnl: f64,
    pub main_pnl: f64,
    pub hedge_pnl: f64,
}

impl PerformanceMetrics {
    pub fn compute(trades: &[Trade]) -> Self {
        let pnls: Vec<f64> = trades.iter().map(|t| t.total_pnl).collect();

        Self {
            trade_count: trades.len(),
            winners: trades.iter().filter(|t| t.is_winner()).count(),
            losers: trades.iter().filter(|t| t.total_pnl < 0.0).count(),
            total_pnl: pnls.iter().sum(),
            avg_pnl: mean_f64(&pnls),
            avg_pnl_pct: mean_f64(&trades.iter().map(|t| t.total_pnl_pct).collect::<Vec<_>>()),
            win_rate: win_rate(trades),
            best_trade: pnls.iter().copied().reduce(f64::max).unwrap_or(0.0),
            worst_trade: pnls.iter().copied().reduce(f64::min).unwrap_or(0.0),
            sharpe: sharpe_ratio(&pnls),
            max_drawdown: max_drawdown(&cumulative(&pnls)),
            profit_factor: profit_factor(&pnls),
            pe_trades: of_type(trades, InstrumentType::Put).count(),
            ce_trades: of_type(trades, InstrumentType::Call).count(),
            pe_pnl: of_type(trades, InstrumentType::Put).map(|t| t.total_pnl).sum(),
            ce_pnl: of_type(trades, InstrumentType::Call).map(|t| t.total_pnl).sum(),
            main_pnl: trades.iter().map(|t| t.main_pnl).sum(),
            hedge_pnl: trades.iter().map(|t| t.hedge_pnl).sum(),
        }
    }
}

fn of_type(trades: &[Trade], instrument: InstrumentType) -> impl Iterator<Item = &Trade> {
    trades.iter().filter(move |t| t.instrument == instrument)
}

// ─── Individual metric functions ────────────────────────────────────

/// Running sum of a P&L series.
pub fn cumulative(pnls: &[f64]) -> Vec<f64> {
    pnls.iter()
        .scan(0.0, |acc, p| {
            *acc += p;
            Some(*acc)
        })
        .collect()
}

/// Fraction of trades with positive total P&L.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Mean over sample standard deviation. 0.0 with fewer than two trades or no dispersion.
pub fn sharpe_ratio(pnls: &[f64]) -> f64 {
    if pnls.len() < 2 {
        return 0.0;
    }
    let std = std_dev(pnls);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(pnls) / std
}

/// Maximum drawdown of a cumulative P&L curve that starts from zero.
///
/// Returned as a non-positive amount: -40.0 means the curve fell 40 points
/// below its running peak.
pub fn max_drawdown(cumulative: &[f64]) -> f64 {
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for &value in cumulative {
        peak = peak.max(value);
        max_dd = max_dd.min(value - peak);
    }
    max_dd
}

/// Gross profits over gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(pnls: &[f64]) -> f64 {
    if pnls.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = pnls.iter().filter(|p| **p > 0.0).sum();
    let gross_loss: f64 = pnls.iter().filter(|p| **p < 0.0).map(|p| p.abs()).sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
