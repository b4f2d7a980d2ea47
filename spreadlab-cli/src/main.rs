//! SpreadLab CLI: backtest, date listing and data-quality commands.
//!
//! Commands:
//! - `run`: simulate one overnight spread per trading date and export artifacts
//! - `dates`: list the trading dates the data source provides
//! - `inspect`: print data-quality diagnostics for the first dates

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use spreadlab_core::config::{ExitPolicyConfig, StrategyConfig, DEFAULT_TRAIL_BUFFER};
use spreadlab_runner::{
    export_run_with_report, inspect, load_provider, run_from_config, BacktestConfig,
    BacktestResult,
};

#[derive(Parser)]
#[command(
    name = "spreadlab",
    version,
    about = "SpreadLab CLI: overnight option-spread backtester"
)]
struct Cli {
    /// Debug logging (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest over every trading date and export artifacts.
    Run {
        #[command(flatten)]
        data: DataArgs,

        /// Exit policy (required unless the config file names one).
        #[arg(long, value_enum)]
        exit_policy: Option<ExitPolicyArg>,

        /// Trailing-stop buffer for the independent policy (fraction, e.g. 0.03).
        #[arg(long)]
        buffer: Option<f64>,

        /// Simulate dates in parallel.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Output directory for artifacts.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Skip the Markdown report.
        #[arg(long, default_value_t = false)]
        no_report: bool,

        /// Print the run summary and metrics as JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List trading dates in the data source.
    Dates {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Print data-quality diagnostics.
    Inspect {
        #[command(flatten)]
        data: DataArgs,

        /// Number of dates to inspect.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

/// Data-source options shared by every command.
#[derive(Args)]
struct DataArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Options database (one table per date).
    #[arg(long)]
    opt_db: Option<PathBuf>,

    /// Underlying database (one table per date).
    #[arg(long)]
    spot_db: Option<PathBuf>,

    /// Read the `_sample` copies of both databases.
    #[arg(long, default_value_t = false)]
    sample: bool,

    /// Use a seeded synthetic market instead of SQLite.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Seed for --synthetic.
    #[arg(long)]
    seed: Option<u64>,

    /// Weekdays generated by --synthetic.
    #[arg(long)]
    days: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExitPolicyArg {
    /// Rolling-high trail on both legs; either trigger closes the spread.
    Coupled,
    /// Side-aware trail with a buffer; each leg exits on its own.
    Independent,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            data,
            exit_policy,
            buffer,
            parallel,
            output_dir,
            no_report,
            json,
        } => {
            require_exit_policy(&data, exit_policy)?;
            let mut config = build_config(&data, exit_policy, buffer)?;
            if parallel {
                config.run.parallel = true;
            }
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            if no_report {
                config.output.report = false;
            }
            run_backtest_cmd(&config, json)
        }
        Commands::Dates { data } => {
            let config = build_config(&data, None, None)?;
            run_dates(&config)
        }
        Commands::Inspect { data, limit } => {
            let config = build_config(&data, None, None)?;
            run_inspect(&config, limit)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "spreadlab=debug" } else { "spreadlab=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Config file (if any) with command-line overrides applied on top.
///
/// `dates` and `inspect` never reach the exit engine, so they fall back to the
/// coupled policy when neither the file nor the flags name one.
fn build_config(
    data: &DataArgs,
    exit_policy: Option<ExitPolicyArg>,
    buffer: Option<f64>,
) -> Result<BacktestConfig> {
    let mut config = match &data.config {
        Some(path) => BacktestConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BacktestConfig::new(StrategyConfig::new(ExitPolicyConfig::CoupledTrail)),
    };

    match (exit_policy, buffer) {
        (Some(ExitPolicyArg::Coupled), Some(_)) => {
            bail!("--buffer only applies to the independent exit policy")
        }
        (Some(ExitPolicyArg::Coupled), None) => {
            config.strategy.exit_policy = ExitPolicyConfig::CoupledTrail;
        }
        (Some(ExitPolicyArg::Independent), b) => {
            config.strategy.exit_policy = ExitPolicyConfig::IndependentTrail {
                buffer: b.unwrap_or(DEFAULT_TRAIL_BUFFER),
            };
        }
        (None, Some(b)) => match config.strategy.exit_policy {
            ExitPolicyConfig::IndependentTrail { .. } => {
                config.strategy.exit_policy = ExitPolicyConfig::IndependentTrail { buffer: b };
            }
            ExitPolicyConfig::CoupledTrail => {
                bail!("--buffer only applies to the independent exit policy")
            }
        },
        (None, None) => {}
    }

    if let Some(p) = &data.opt_db {
        config.data.opt_db = p.clone();
    }
    if let Some(p) = &data.spot_db {
        config.data.spot_db = p.clone();
    }
    if data.sample {
        config.data.use_sample = true;
    }
    if data.synthetic {
        config.data.synthetic = true;
    }
    if let Some(seed) = data.seed {
        config.data.seed = seed;
    }
    if let Some(days) = data.days {
        config.data.synthetic_days = days;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// `run` without `--config` must name the exit policy explicitly.
fn require_exit_policy(data: &DataArgs, exit_policy: Option<ExitPolicyArg>) -> Result<()> {
    if data.config.is_none() && exit_policy.is_none() {
        bail!("--exit-policy is required without --config (coupled or independent)");
    }
    Ok(())
}

fn run_backtest_cmd(config: &BacktestConfig, json: bool) -> Result<()> {
    let result = run_from_config(config)?;
    if json {
        let out = serde_json::json!({
            "run_id": result.run_id,
            "summary": result.summary,
            "metrics": result.metrics,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_summary(&result);
    }

    let paths = export_run_with_report(&config.output.dir, &result, config.output.report)
        .context("trades were simulated but exporting artifacts failed")?;
    info!(run_dir = %paths.run_dir.display(), "artifacts saved");
    if !json {
        println!("Artifacts saved to: {}", paths.run_dir.display());
    }
    Ok(())
}

fn run_dates(config: &BacktestConfig) -> Result<()> {
    let loaded = load_provider(&config.data, &config.strategy)?;
    let dates = loaded
        .provider
        .list_trading_dates()
        .context("failed to list trading dates")?;
    for date in &dates {
        println!("{date}");
    }
    eprintln!("{} trading dates ({})", dates.len(), loaded.source);
    Ok(())
}

fn run_inspect(config: &BacktestConfig, limit: usize) -> Result<()> {
    let loaded = load_provider(&config.data, &config.strategy)?;
    let report = inspect(loaded.provider.as_ref(), &config.strategy, Some(limit))
        .context("data-quality inspection failed")?;
    print!("{}", report.render());
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let s = &result.summary;
    let m = &result.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Run ID:         {}", result.run_id);
    println!("Data:           {}", result.data_source);
    println!("Exit Policy:    {}", result.exit_policy);
    println!(
        "Dates:          {} ({} traded, {} skipped, {} failed)",
        s.dates_processed, s.trades, s.skipped, s.failed
    );
    println!();
    println!("--- Performance ---");
    println!("Total P&L:      {:+.2}", m.total_pnl);
    println!("Average P&L:    {:+.2} ({:+.2}%)", m.avg_pnl, m.avg_pnl_pct);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Best / Worst:   {:+.2} / {:+.2}", m.best_trade, m.worst_trade);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Max Drawdown:   {:.2}", m.max_drawdown);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!(
        "PE / CE:        {} ({:+.2}) / {} ({:+.2})",
        m.pe_trades, m.pe_pnl, m.ce_trades, m.ce_pnl
    );
    println!("Main / Hedge:   {:+.2} / {:+.2}", m.main_pnl, m.hedge_pnl);
    if !s.skip_reasons.is_empty() {
        println!();
        println!("--- Skipped ---");
        for (reason, count) in &s.skip_reasons {
            println!("{reason:<22} {count}");
        }
    }
    for f in &s.failures {
        println!("FAILED {}: {}", f.date, f.reason);
    }
    println!();
}
