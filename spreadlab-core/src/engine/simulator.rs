//! Trade simulator: one overnight spread per trading date.
//!
//! For each date: read the session direction, sell the ATM option on the
//! protective side, buy the OTM hedge, carry both legs overnight and close them
//! on the next trading morning according to the exit policy.
//!
//! Every date ends in exactly one `Trade` or one `SkipReason`.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use tracing::debug;

use crate::components::{
    create_exit_policy, select_strikes, ClassificationError, DirectionClassifier, ExitError,
    ExitPolicy, MarketMove, SelectionError, SpreadExit, StrikeSelection,
};
use crate::config::StrategyConfig;
use crate::data::{price_bars, DataError, OptionFilter, PriceSeriesProvider, TradingCalendar};
use crate::domain::bar::last_at_or_before;
use crate::domain::trade::pct_of;
use crate::domain::{InstrumentType, LegRole, Position, PriceBar, Strike, Trade};
use crate::execution::{Action, Phase, SlippageModel};

/// Which piece of data was missing when a date was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingData {
    Underlying,
    OptionChain,
    LegSeries(LegRole),
    EntryBar(LegRole),
    ExitSeries(LegRole),
}

impl std::fmt::Display for MissingData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Underlying => f.write_str("no underlying bars in session"),
            Self::OptionChain => f.write_str("no option rows"),
            Self::LegSeries(leg) => write!(f, "no {leg} leg series on entry date"),
            Self::EntryBar(leg) => write!(f, "no {leg} leg bar at or before entry time"),
            Self::ExitSeries(leg) => write!(f, "no {leg} leg bars before exit cutoff"),
        }
    }
}

/// Why a date produced no trade.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("missing data: {0}")]
    MissingData(MissingData),

    #[error("direction classification failed: {0}")]
    Classification(#[from] ClassificationError),

    #[error("strike selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error("no trading date after {0}")]
    NoNextTradingDate(NaiveDate),

    #[error("exit undetermined: {0}")]
    ExitUndetermined(#[source] ExitError),

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

impl SkipReason {
    /// Unexpected provider failures, as opposed to ordinary gaps in the data.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    /// Short stable key used to tally skips.
    pub fn key(&self) -> &'static str {
        match self {
            Self::MissingData(MissingData::Underlying) => "missing_underlying",
            Self::MissingData(MissingData::OptionChain) => "missing_option_chain",
            Self::MissingData(MissingData::LegSeries(_)) => "missing_leg_series",
            Self::MissingData(MissingData::EntryBar(_)) => "missing_entry_bar",
            Self::MissingData(MissingData::ExitSeries(_)) => "missing_exit_series",
            Self::Classification(_) => "classification",
            Self::Selection(_) => "strike_selection",
            Self::NoNextTradingDate(_) => "no_next_trading_date",
            Self::ExitUndetermined(_) => "exit_undetermined",
            Self::Data(_) => "data_error",
        }
    }
}

/// The contracts chosen for one entry date, before any leg series is read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractPlan {
    pub market: MarketMove,
    pub selection: StrikeSelection,
    /// Nearest expiry in the entry date's chain.
    pub expiry: NaiveDate,
}

/// Simulates the spread for single dates against a provider.
pub struct TradeSimulator<'a> {
    provider: &'a dyn PriceSeriesProvider,
    calendar: TradingCalendar,
    config: StrategyConfig,
    classifier: DirectionClassifier,
    slippage: SlippageModel,
    exit_policy: Box<dyn ExitPolicy>,
}

impl<'a> TradeSimulator<'a> {
    pub fn new(
        provider: &'a dyn PriceSeriesProvider,
        calendar: TradingCalendar,
        config: StrategyConfig,
    ) -> Self {
        Self {
            provider,
            calendar,
            classifier: DirectionClassifier::new(config.market_open, config.entry_time),
            slippage: SlippageModel::from_config(&config),
            exit_policy: create_exit_policy(&config),
            config,
        }
    }

    /// Builds the calendar from the provider's trading dates.
    pub fn from_provider(
        provider: &'a dyn PriceSeriesProvider,
        config: StrategyConfig,
    ) -> Result<Self, DataError> {
        let calendar = TradingCalendar::from_provider(provider)?;
        Ok(Self::new(provider, calendar, config))
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn exit_policy_name(&self) -> &str {
        self.exit_policy.name()
    }

    /// Bars of one contract on `date`, nearest expiry, within the session.
    fn leg_bars(
        &self,
        date: NaiveDate,
        strike: Strike,
        instrument: InstrumentType,
        until: NaiveTime,
    ) -> Result<Vec<PriceBar>, DataError> {
        let rows = self
            .provider
            .option_series(date, &OptionFilter::contract(strike, instrument))?;
        Ok(price_bars(&rows)
            .into_iter()
            .filter(|b| b.time >= self.config.market_open && b.time <= until)
            .collect())
    }

    /// Direction, strikes and expiry the spread on `date` would be built from.
    pub fn plan(&self, date: NaiveDate) -> Result<ContractPlan, SkipReason> {
        let cfg = &self.config;

        let underlying =
            self.provider
                .underlying_series(date, cfg.market_open, cfg.session_close)?;
        if underlying.is_empty() {
            return Err(SkipReason::MissingData(MissingData::Underlying));
        }
        let market = self.classifier.classify(&underlying)?;

        let chain = self.provider.option_series(date, &OptionFilter::all())?;
        let Some(expiry) = chain.iter().map(|r| r.expiry).min() else {
            return Err(SkipReason::MissingData(MissingData::OptionChain));
        };
        let strikes = self.provider.list_strikes(date, expiry)?;
        let selection = select_strikes(
            market.decision_price,
            &strikes,
            market.direction,
            cfg.hedge_offset,
        )?;
        Ok(ContractPlan {
            market,
            selection,
            expiry,
        })
    }

    pub fn simulate(&self, date: NaiveDate) -> Result<Trade, SkipReason> {
        let cfg = &self.config;
        let ContractPlan {
            market,
            selection,
            expiry,
        } = self.plan(date)?;
        let instrument = selection.instrument;

        let main_today = self.leg_bars(date, selection.atm, instrument, cfg.session_close)?;
        if main_today.is_empty() {
            return Err(SkipReason::MissingData(MissingData::LegSeries(LegRole::Main)));
        }
        let hedge_today = self.leg_bars(date, selection.hedge, instrument, cfg.session_close)?;
        if hedge_today.is_empty() {
            return Err(SkipReason::MissingData(MissingData::LegSeries(LegRole::Hedge)));
        }

        let main_entry_bar = last_at_or_before(&main_today, cfg.entry_time)
            .ok_or(SkipReason::MissingData(MissingData::EntryBar(LegRole::Main)))?;
        let hedge_entry_bar = last_at_or_before(&hedge_today, cfg.entry_time)
            .ok_or(SkipReason::MissingData(MissingData::EntryBar(LegRole::Hedge)))?;

        let main = self.open_leg(LegRole::Main, selection.atm, instrument, expiry, main_entry_bar);
        let hedge = self.open_leg(LegRole::Hedge, selection.hedge, instrument, expiry, hedge_entry_bar);

        let exit_date = self
            .calendar
            .next_trading_date(date)
            .ok_or(SkipReason::NoNextTradingDate(date))?;

        let main_next = self.leg_bars(exit_date, selection.atm, instrument, cfg.exit_cutoff)?;
        if main_next.is_empty() {
            return Err(SkipReason::MissingData(MissingData::ExitSeries(LegRole::Main)));
        }
        let hedge_next = self.leg_bars(exit_date, selection.hedge, instrument, cfg.exit_cutoff)?;
        if hedge_next.is_empty() {
            return Err(SkipReason::MissingData(MissingData::ExitSeries(LegRole::Hedge)));
        }

        let exit = self
            .exit_policy
            .evaluate(&main_next, &hedge_next)
            .map_err(SkipReason::ExitUndetermined)?;

        debug!(
            %date,
            direction = %market.direction,
            atm = %selection.atm,
            hedge = %selection.hedge,
            exit = %exit.main.reason,
            "trade simulated"
        );

        Ok(self.build_trade(date, exit_date, &market, &selection, &main, &hedge, &exit))
    }

    fn open_leg(
        &self,
        role: LegRole,
        strike: Strike,
        instrument: InstrumentType,
        expiry: NaiveDate,
        bar: &PriceBar,
    ) -> Position {
        let entry_price =
            self.slippage
                .adjusted_price(bar.close, Phase::Entry, Action::opening(role.side()));
        Position {
            role,
            strike,
            instrument,
            expiry,
            entry_time: bar.time,
            entry_price,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_trade(
        &self,
        entry_date: NaiveDate,
        exit_date: NaiveDate,
        market: &MarketMove,
        selection: &StrikeSelection,
        main: &Position,
        hedge: &Position,
        exit: &SpreadExit,
    ) -> Trade {
        let lot = f64::from(self.config.lot_size);
        let close_price = |leg: &Position, raw: f64| {
            self.slippage
                .adjusted_price(raw, Phase::Exit, Action::closing(leg.side()))
        };
        let main_exit_price = close_price(main, exit.main.price);
        let hedge_exit_price = close_price(hedge, exit.hedge.price);

        let main_pnl = main.pnl_per_unit(main_exit_price) * lot;
        let hedge_pnl = hedge.pnl_per_unit(hedge_exit_price) * lot;
        let total_pnl = main_pnl + hedge_pnl;

        let (exit_time, hedge_exit_time, hedge_exit_reason) = if exit.coupled {
            (exit.exit_time(), None, None)
        } else {
            (
                exit.main.time,
                Some(exit.hedge.time),
                Some(exit.hedge.reason.to_string()),
            )
        };

        Trade {
            entry_date,
            exit_date,
            entry_time: main.entry_time,
            exit_time,
            hedge_exit_time,
            direction: market.direction,
            instrument: selection.instrument,
            main_strike: selection.atm,
            hedge_strike: selection.hedge,
            hedge_degenerate: selection.degenerate,
            spot_open: market.open_price,
            spot_at_entry: market.decision_price,
            movement_pct: market.movement * 100.0,
            main_entry_price: main.entry_price,
            main_exit_price,
            hedge_entry_price: hedge.entry_price,
            hedge_exit_price,
            main_pnl,
            hedge_pnl,
            total_pnl,
            // returns are on price x lot, so they do not grow with lot_size;
            // dividing the lot-scaled P&L by price alone would inflate them by lot_size
            main_pnl_pct: pct_of(main_pnl, main.entry_price * lot),
            hedge_pnl_pct: pct_of(hedge_pnl, hedge.entry_price * lot),
            total_pnl_pct: pct_of(total_pnl, (main.entry_price + hedge.entry_price) * lot),
            entry_reason: format!(
                "Market {}, Sell {}",
                market.direction,
                selection.instrument.code()
            ),
            exit_reason: exit.main.reason.to_string(),
            hedge_exit_reason,
            exit_policy: self.exit_policy.name().to_string(),
        }
    }
}
