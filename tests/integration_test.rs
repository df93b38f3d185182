//! End-to-end engine tests over synthetic price histories.

mod common;

use approx::assert_relative_eq;
use cbquant::domain::backtest::{
    BacktestConfig, DEFAULT_INITIAL_CAPITAL, compare_strategies, run_backtest, run_strategy,
    try_run_strategy,
};
use cbquant::domain::config::EngineConfig;
use cbquant::domain::deduction::forecast_with_drift;
use cbquant::domain::error::QuantError;
use cbquant::domain::geometry::{DEFAULT_HORIZONS, GeometryVector, Horizon, compute_geometry};
use cbquant::domain::indicator::regression::angle;
use cbquant::domain::rating::{RatingTier, rate, rate_optional};
use cbquant::domain::strategy::{Signal, SignalRule, Strategy, StrategyCatalog};
use cbquant::domain::universe::scan_universe;
use cbquant::domain::wave::{WaveLabel, project_waves};
use cbquant::domain::zigzag::{PivotKind, alternates, detect_pivots};
use common::*;
use proptest::prelude::*;

mod backtest_pipeline {
    use super::*;

    #[test]
    fn rising_market_with_ma20_is_profitable() {
        let series = series_from_closes(&rising_closes(400));
        let result =
            run_strategy(&series, &Strategy::price_above(20), &BacktestConfig::default()).unwrap();

        assert!(result.cagr > 0.0);
        assert!(result.total_return > 0.0);
        assert_eq!(result.latest_signal, Signal::Long);
        assert_relative_eq!(result.latest_price, 100.0 + 0.5 * 399.0);
        assert!(result.trade_bars >= 10);
        assert_relative_eq!(result.win_rate, 1.0);
        assert_eq!(result.max_drawdown, 0.0);
        assert!(result.kelly_fraction >= 0.0);
        assert_relative_eq!(result.half_kelly, result.kelly_fraction / 2.0);
    }

    #[test]
    fn flat_market_reports_zeroes() {
        let series = series_from_closes(&flat_closes(300, 50.0));
        let result =
            run_strategy(&series, &Strategy::price_above(20), &BacktestConfig::default()).unwrap();

        assert_eq!(result.cagr, 0.0);
        assert_eq!(result.sharpe_ratio, 0.0);
        assert_eq!(result.max_drawdown, 0.0);
        assert_eq!(result.kelly_fraction, 0.0);
        assert_eq!(result.trade_bars, 0);
        assert_eq!(result.final_equity, DEFAULT_INITIAL_CAPITAL);
    }

    #[test]
    fn equity_curve_starts_at_initial_capital() {
        let config = BacktestConfig {
            initial_capital: 250_000.0,
            ..BacktestConfig::default()
        };
        let series = series_from_closes(&oscillating_closes(300, 10.0, 40.0));
        let result = run_strategy(&series, &Strategy::crossover(20, 60), &config).unwrap();

        assert_eq!(result.equity_curve[0].equity, 250_000.0);
        assert_eq!(result.equity_curve.len(), series.len());
        assert_eq!(result.drawdown_series.len(), series.len());
        assert_eq!(result.positions[0], 0.0);
        assert_eq!(result.returns[0], 0.0);
    }

    #[test]
    fn position_never_sees_same_bar_close() {
        let closes = oscillating_closes(300, 10.0, 40.0);
        let rule = Strategy::price_above(20);
        let base = run_strategy(&series_from_closes(&closes), &rule, &BacktestConfig::default())
            .unwrap();

        for t in [25, 150, 299] {
            let mut shocked = closes.clone();
            shocked[t] *= 1.5;
            let moved =
                run_strategy(&series_from_closes(&shocked), &rule, &BacktestConfig::default())
                    .unwrap();
            assert_eq!(
                base.positions[..=t],
                moved.positions[..=t],
                "position at bar {t} reacted to its own close"
            );
        }
    }

    #[test]
    fn position_is_previous_signal() {
        let series = series_from_closes(&oscillating_closes(200, 8.0, 30.0));
        let rule = Strategy::price_above(20);
        let signals = rule.signals(&series);
        let result = run_backtest(&series, &signals, &BacktestConfig::default()).unwrap();
        for t in 1..series.len() {
            assert_eq!(result.positions[t], signals[t - 1].exposure());
        }
    }

    #[test]
    fn too_short_for_strategy_is_insufficient() {
        let series = series_from_closes(&rising_closes(50));
        let err = try_run_strategy(&series, &Strategy::price_above(87), &BacktestConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            QuantError::InsufficientData { required: 88, bars: 50, .. }
        ));
        assert!(
            run_strategy(&series, &Strategy::price_above(87), &BacktestConfig::default()).is_none()
        );
    }

    #[test]
    fn single_bar_has_no_result() {
        let series = series_from_closes(&[100.0]);
        assert!(run_backtest(&series, &[Signal::Long], &BacktestConfig::default()).is_none());
    }

    #[test]
    fn compare_covers_whole_catalog() {
        let series = series_from_closes(&rising_closes(120));
        let catalog = StrategyCatalog::default();
        let reports = compare_strategies(&series, &catalog, &BacktestConfig::default());

        assert_eq!(reports.len(), catalog.len());
        let with = |key: &str| reports.iter().find(|r| r.key == key).unwrap();
        assert!(with("price-above-20").result.is_some());
        assert!(with("price-above-87").result.is_some());
        assert!(with("price-above-284").result.is_none());
        assert!(with("core-87-284").result.is_none());
    }
}

mod signals_and_projection {
    use super::*;

    #[test]
    fn pivots_on_swinging_market() {
        let series = series_from_closes(&oscillating_closes(200, 10.0, 50.0));
        let pivots = detect_pivots(&series, 0.03);

        assert_eq!(pivots.first().unwrap().kind, PivotKind::Start);
        assert_eq!(pivots.last().unwrap().kind, PivotKind::Current);
        assert_eq!(pivots.last().unwrap().index, 199);
        assert!(pivots.iter().any(|p| p.kind == PivotKind::High));
        assert!(pivots.iter().any(|p| p.kind == PivotKind::Low));
        assert!(alternates(&pivots));
    }

    #[test]
    fn rising_market_projects_impulse() {
        let series = series_from_closes(&rising_closes(100));
        let pivots = detect_pivots(&series, 0.03);
        let waves = project_waves(&pivots);

        let labels: Vec<WaveLabel> = waves.iter().map(|w| w.label).collect();
        assert_eq!(
            labels,
            vec![
                WaveLabel::Origin,
                WaveLabel::Wave2,
                WaveLabel::Wave3,
                WaveLabel::Wave4,
                WaveLabel::Wave5
            ]
        );
        assert!(waves.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn falling_market_projects_correction() {
        let series = series_from_closes(&falling_closes(100));
        let waves = project_waves(&detect_pivots(&series, 0.03));
        let labels: Vec<WaveLabel> = waves.iter().map(|w| w.label).collect();
        assert_eq!(labels, vec![WaveLabel::Origin, WaveLabel::WaveB, WaveLabel::WaveC]);
    }

    #[test]
    fn deduction_forecast_over_rising_market() {
        let series = series_from_closes(&rising_closes(400));
        let forecast = forecast_with_drift(&series, 0.0, 20, &[87, 284]).unwrap();
        assert_eq!(forecast.rows.len(), 20);
        assert!(forecast.current_ma(87).is_some());
        assert!(forecast.rows.iter().all(|r| r.date > forecast.last_date));
    }
}

mod classification {
    use super::*;

    #[test]
    fn missing_history_classifies_neutral() {
        let g = GeometryVector::from_closes(&[], &DEFAULT_HORIZONS);
        for h in Horizon::ALL {
            assert_eq!(g.angle(h), 0.0);
            assert_eq!(g.r_squared(h), 0.0);
        }
        assert_eq!(rate(&g).tier, RatingTier::Neutral);

        let nan = GeometryVector::from_closes(&[f64::NAN; 40], &DEFAULT_HORIZONS);
        assert_eq!(nan, g);
    }

    #[test]
    fn no_geometry_is_no_data() {
        assert_eq!(rate_optional(None).tier, RatingTier::NoData);
    }

    #[test]
    fn steady_exponential_climb_rates_titan() {
        // 1.2% a day; every horizon fits the same line above 45 degrees.
        let closes: Vec<f64> = (0..500).map(|i| 10.0 * (0.012 * i as f64).exp()).collect();
        let series = series_from_closes(&closes);
        let g = compute_geometry(&series, &DEFAULT_HORIZONS, false);
        assert_relative_eq!(g.angle(Horizon::M3), g.angle(Horizon::Y35), epsilon = 1e-6);
        assert_relative_eq!(g.r_squared(Horizon::Y1), 1.0, epsilon = 1e-9);
        assert!(g.angle(Horizon::Y1) > 45.0);
        assert_eq!(rate(&g).tier, RatingTier::Titan);
    }

    #[test]
    fn scan_rates_and_skips() {
        let source = MockPriceSource::new()
            .with_closes("UP", &rising_closes(400))
            .with_closes("SHORT", &rising_closes(5))
            .with_error("BROKEN", "disk on fire");
        let symbols: Vec<String> = ["UP", "BROKEN", "SHORT"].iter().map(|s| s.to_string()).collect();
        let report = scan_universe(
            &source,
            &symbols,
            &Strategy::price_above(20),
            &EngineConfig::default(),
        );

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].symbol, "UP");
        assert!(report.rows[0].cagr.unwrap() > 0.0);
        assert_eq!(report.rows[1].symbol, "SHORT");
        assert!(report.rows[1].cagr.is_none());
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].reason.contains("disk on fire"));
    }
}

fn closes_strategy() -> impl proptest::strategy::Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..500.0, 2..200)
}

proptest! {
    #[test]
    fn drawdown_is_never_positive(closes in closes_strategy(), seed in any::<u64>()) {
        let series = series_from_closes(&closes);
        let signals: Vec<Signal> = (0..closes.len())
            .map(|i| match (seed >> (i % 64)) & 3 {
                0 => Signal::Short,
                1 => Signal::Flat,
                _ => Signal::Long,
            })
            .collect();
        let result = run_backtest(&series, &signals, &BacktestConfig::default()).unwrap();
        prop_assert!(result.drawdown_series.iter().all(|d| d.drawdown <= 0.0));
        prop_assert!(result.max_drawdown <= 0.0);
        prop_assert!(result.max_drawdown >= -1.0);
        prop_assert!(result.equity_curve.iter().all(|p| p.equity >= 0.0));
        prop_assert!(result.kelly_fraction >= 0.0);
        prop_assert!((result.half_kelly - result.kelly_fraction / 2.0).abs() < 1e-12);
    }

    #[test]
    fn pivots_alternate_and_end_current(closes in closes_strategy(), deviation in 0.01f64..0.2) {
        let pivots = detect_pivots(&series_from_closes(&closes), deviation);
        prop_assert_eq!(pivots[0].kind, PivotKind::Start);
        prop_assert_eq!(pivots[pivots.len() - 1].kind, PivotKind::Current);
        prop_assert!(alternates(&pivots));
        prop_assert!(pivots.windows(2).all(|w| w[0].index <= w[1].index));
    }

    #[test]
    fn angle_is_monotone(a in -1.0f64..1.0, b in -1.0f64..1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(angle(lo) <= angle(hi));
        prop_assert!((-90.0..=90.0).contains(&angle(a)));
    }
}
