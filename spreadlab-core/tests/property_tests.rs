//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Slippage is always adverse: sell <= raw <= buy
//! 2. Strike selection: ATM is nearest, hedge sits on the protective side
//! 3. Rolling windows: fast extremes match a naive scan
//! 4. Independent trail: never triggers before the third bar, for any window
//! 5. Coupled trail: exit times come from the legs' own bars
//! 6. Simulator: total P&L is the sum of the legs on any synthetic market

use chrono::NaiveTime;
use proptest::prelude::*;
use spreadlab_core::components::exit::rolling::{rolling_high, rolling_low};
use spreadlab_core::components::{
    select_strikes, CoupledTrail, ExitPolicy, ExitReason, IndependentTrail,
};
use spreadlab_core::config::{ExitPolicyConfig, StrategyConfig};
use spreadlab_core::data::SyntheticMarket;
use spreadlab_core::domain::{Direction, InstrumentType, PriceBar, Strike};
use spreadlab_core::engine::TradeSimulator;
use spreadlab_core::execution::{Action, Phase, SlippageModel};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_bars(min: usize, max: usize) -> impl Strategy<Value = Vec<PriceBar>> {
    prop::collection::vec((1.0..500.0_f64, 0.0..5.0_f64, 0.0..5.0_f64), min..=max).prop_map(
        |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (close, up, down))| PriceBar {
                    time: NaiveTime::from_hms_opt(9, 15, 0).unwrap()
                        + chrono::Duration::minutes(i as i64),
                    open: close,
                    high: close + up,
                    low: (close - down).max(0.05),
                    close,
                })
                .collect()
        },
    )
}

fn arb_strikes() -> impl Strategy<Value = Vec<Strike>> {
    prop::collection::btree_set(100i64..400, 1..30)
        .prop_map(|set| set.into_iter().map(|k| Strike(k * 50)).collect())
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Up), Just(Direction::Down)]
}

// ── 1. Slippage ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn slippage_is_adverse(raw in 0.0..10_000.0_f64, entry in 0.0..0.5_f64, exit in 0.0..0.5_f64) {
        let m = SlippageModel::new(entry, exit);
        for phase in [Phase::Entry, Phase::Exit] {
            let sell = m.adjusted_price(raw, phase, Action::Sell);
            let buy = m.adjusted_price(raw, phase, Action::Buy);
            prop_assert!(sell <= raw);
            prop_assert!(raw <= buy);
        }
    }
}

// ── 2. Strike selection ──────────────────────────────────────────────

proptest! {
    #[test]
    fn hedge_is_on_protective_side(
        strikes in arb_strikes(),
        spot in 4_000.0..21_000.0_f64,
        direction in arb_direction(),
        offset in 0.0..0.1_f64,
    ) {
        let sel = select_strikes(spot, &strikes, direction, offset).unwrap();

        let best = strikes.iter().map(|s| s.distance_to(spot)).fold(f64::INFINITY, f64::min);
        prop_assert_eq!(sel.atm.distance_to(spot), best);

        if sel.degenerate {
            prop_assert_eq!(sel.hedge, sel.atm);
        } else {
            match sel.instrument {
                InstrumentType::Put => prop_assert!(sel.hedge < sel.atm),
                InstrumentType::Call => prop_assert!(sel.hedge > sel.atm),
            }
        }
        let expected = match direction {
            Direction::Up => InstrumentType::Put,
            Direction::Down => InstrumentType::Call,
        };
        prop_assert_eq!(sel.instrument, expected);
    }

    #[test]
    fn degenerate_only_without_candidates(
        strikes in arb_strikes(),
        spot in 4_000.0..21_000.0_f64,
        direction in arb_direction(),
    ) {
        let sel = select_strikes(spot, &strikes, direction, 0.02).unwrap();
        let has_candidate = match sel.instrument {
            InstrumentType::Put => strikes.iter().any(|s| *s < sel.atm),
            InstrumentType::Call => strikes.iter().any(|s| *s > sel.atm),
        };
        prop_assert_eq!(sel.degenerate, !has_candidate);
    }
}

// ── 3. Rolling windows ───────────────────────────────────────────────

proptest! {
    #[test]
    fn rolling_extremes_match_naive(bars in arb_bars(1, 60), window in 1usize..8) {
        let highs = rolling_high(&bars, window);
        let lows = rolling_low(&bars, window);
        prop_assert_eq!(highs.len(), bars.len());
        for i in 0..bars.len() {
            let start = (i + 1).saturating_sub(window);
            let slice = &bars[start..=i];
            let hi = slice.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let lo = slice.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            prop_assert_eq!(highs[i], hi);
            prop_assert_eq!(lows[i], lo);
        }
    }
}

// ── 4. Independent trail warm-up ─────────────────────────────────────

proptest! {
    #[test]
    fn independent_trail_waits_for_third_bar(
        main in arb_bars(1, 2),
        hedge in arb_bars(1, 2),
        buffer in 0.0..0.2_f64,
        window in 1usize..8,
    ) {
        let exit = IndependentTrail::new(window, buffer).evaluate(&main, &hedge).unwrap();
        prop_assert_eq!(exit.main.reason, ExitReason::TimeExit);
        prop_assert_eq!(exit.hedge.reason, ExitReason::TimeExit);
        prop_assert_eq!(exit.main.time, main[main.len() - 1].time);
        prop_assert_eq!(exit.hedge.time, hedge[hedge.len() - 1].time);
    }

    #[test]
    fn independent_trigger_respects_stop(
        bars in arb_bars(3, 40),
        buffer in 0.0..0.2_f64,
        window in 1usize..8,
    ) {
        let exit = IndependentTrail::new(window, buffer).evaluate(&bars, &bars).unwrap();
        if exit.main.reason == ExitReason::TrailStopHit {
            let i = bars.iter().position(|b| b.time == exit.main.time).unwrap();
            prop_assert!(i >= 2);
            let lows = rolling_low(&bars, window);
            prop_assert!(bars[i].close > lows[i] * (1.0 + buffer));
        }
        if exit.hedge.reason == ExitReason::TrailStopHit {
            let i = bars.iter().position(|b| b.time == exit.hedge.time).unwrap();
            prop_assert!(i >= 2);
            let highs = rolling_high(&bars, window);
            prop_assert!(bars[i].close < highs[i] * (1.0 - buffer));
        }
    }
}

// ── 5. Coupled trail ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn coupled_exit_uses_leg_bars(main in arb_bars(1, 30), hedge in arb_bars(1, 30)) {
        let exit = CoupledTrail::new(3).evaluate(&main, &hedge).unwrap();
        prop_assert!(exit.coupled);
        prop_assert!(main.iter().any(|b| b.time == exit.main.time && b.close == exit.main.price));
        prop_assert!(hedge.iter().any(|b| b.time == exit.hedge.time && b.close == exit.hedge.price));
        prop_assert_eq!(exit.main.reason, exit.hedge.reason);
        if exit.main.reason != ExitReason::TimeExit {
            prop_assert_eq!(exit.main.time, exit.hedge.time);
        }
    }
}

// ── 6. Simulator ─────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn total_pnl_is_sum_of_legs(seed in 0u64..10_000, independent in any::<bool>()) {
        let market = SyntheticMarket { seed, days: 4, strikes_per_side: 10, ..SyntheticMarket::default() };
        let provider = market.build();
        let policy = if independent {
            ExitPolicyConfig::independent()
        } else {
            ExitPolicyConfig::CoupledTrail
        };
        let sim = TradeSimulator::from_provider(&provider, StrategyConfig::new(policy)).unwrap();
        for date in market.trading_dates() {
            if let Ok(trade) = sim.simulate(date) {
                prop_assert!((trade.total_pnl - (trade.main_pnl + trade.hedge_pnl)).abs() < 1e-9);
                prop_assert!(trade.entry_reason.starts_with("Market "));
                prop_assert!(trade.exit_date > trade.entry_date);
                prop_assert_eq!(trade.hedge_exit_time.is_some(), independent);
            }
        }
    }
}
