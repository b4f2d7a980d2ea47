//! Markdown report generator.

use spreadlab_core::domain::Trade;

use crate::runner::BacktestResult;

pub struct MarkdownReportGenerator;

impl MarkdownReportGenerator {
    pub fn generate(&self, result: &BacktestResult) -> String {
        let m = &result.metrics;
        let s = &result.summary;
        let mut report = format!(
            "# SpreadLab Run Report\n\n\
Run ID: `{}`\n\
Exit policy: `{}`\n\
Data: {}\n\n\
## Summary\n\
- Dates processed: {}\n\
- Trades: {} ({:.1}% of dates)\n\
- Skipped: {}\n\
- Failed: {}\n\
- Total P&L: {:+.2}\n\
- Average P&L: {:+.2} ({:+.2}%)\n\
- Win Rate: {:.1}% ({} winners, {} losers)\n\
- Best / Worst: {:+.2} / {:+.2}\n\
- Sharpe (per trade): {:.2}\n\
- Max Drawdown: {:.2}\n\
- Profit Factor: {:.2}\n",
            result.run_id,
            result.exit_policy,
            result.data_source,
            s.dates_processed,
            s.trades,
            s.success_rate() * 100.0,
            s.skipped,
            s.failed,
            m.total_pnl,
            m.avg_pnl,
            m.avg_pnl_pct,
            m.win_rate * 100.0,
            m.winners,
            m.losers,
            m.best_trade,
            m.worst_trade,
            m.sharpe,
            m.max_drawdown,
            m.profit_factor,
        );

        report.push_str("\n## Parameters\n\n| Parameter | Value |\n|-----------|-------|\n");
        for (name, value) in result.strategy.parameter_table() {
            report.push_str(&format!("| {name} | {value} |\n"));
        }

        report.push_str("\n## Breakdown\n\n| Slice | Trades | P&L |\n|-------|--------|-----|\n");
        report.push_str(&format!("| PE (market up) | {} | {:+.2} |\n", m.pe_trades, m.pe_pnl));
        report.push_str(&format!("| CE (market down) | {} | {:+.2} |\n", m.ce_trades, m.ce_pnl));
        report.push_str(&format!("| Main legs | {} | {:+.2} |\n", m.trade_count, m.main_pnl));
        report.push_str(&format!("| Hedge legs | {} | {:+.2} |\n", m.trade_count, m.hedge_pnl));

        if !s.skip_reasons.is_empty() {
            report.push_str("\n## Skipped Dates\n\n| Reason | Count |\n|--------|-------|\n");
            for (reason, count) in &s.skip_reasons {
                report.push_str(&format!("| {reason} | {count} |\n"));
            }
        }

        if !s.failures.is_empty() {
            report.push_str("\n## Failures\n\n");
            for f in &s.failures {
                report.push_str(&format!("- {}: {}\n", f.date, f.reason));
            }
        }

        if !result.pnl.monthly.is_empty() {
            report.push_str("\n## Monthly P&L\n\n| Month | Trades | P&L |\n|-------|--------|-----|\n");
            for row in &result.pnl.monthly {
                report.push_str(&format!("| {} | {} | {:+.2} |\n", row.period, row.trades, row.pnl));
            }
            report.push_str("\n## Yearly P&L\n\n| Year | Trades | P&L |\n|------|--------|-----|\n");
            for row in &result.pnl.yearly {
                report.push_str(&format!("| {} | {} | {:+.2} |\n", row.period, row.trades, row.pnl));
            }
        }

        // Trade tape section (top 5 winners and losers)
        if !result.trades.is_empty() {
            report.push_str("\n## Trade Tape\n\n");

            let mut sorted_trades: Vec<&Trade> = result.trades.iter().collect();
            sorted_trades.sort_by(|a, b| b.total_pnl.total_cmp(&a.total_pnl));

            report.push_str("### Top Winners\n");
            push_trade_header(&mut report);
            for trade in sorted_trades.iter().take(5).filter(|t| t.total_pnl > 0.0) {
                push_trade_row(&mut report, trade);
            }

            report.push_str("\n### Top Losers\n");
            push_trade_header(&mut report);
            for trade in sorted_trades.iter().rev().take(5).filter(|t| t.total_pnl <= 0.0) {
                push_trade_row(&mut report, trade);
            }
        }

        report.push_str(
            "\n## Notes\n\
- Trades, daily/monthly/yearly P&L and parameters are exported alongside this report.\n",
        );

        report
    }
}

fn push_trade_header(report: &mut String) {
    report.push_str("| Entry | Exit | Type | Strike | Hedge | Exit Reason | P&L | Return |\n");
    report.push_str("|-------|------|------|--------|-------|-------------|-----|--------|\n");
}

fn push_trade_row(report: &mut String, trade: &Trade) {
    report.push_str(&format!(
        "| {} | {} {} | {} | {} | {} | {} | {:+.2} | {:+.2}% |\n",
        trade.entry_date,
        trade.exit_date,
        trade.exit_time,
        trade.instrument,
        trade.main_strike,
        trade.hedge_strike,
        trade.exit_reason,
        trade.total_pnl,
        trade.total_pnl_pct
    ));
}
