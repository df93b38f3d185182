//! Strategy catalog: named, pure rules turning a price series into a
//! per-bar position signal.

use crate::domain::error::QuantError;
use crate::domain::indicator::{IndicatorType, compute_indicators};
use crate::domain::ohlcv::PriceSeries;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Signal {
    Short,
    #[default]
    Flat,
    Long,
}

impl Signal {
    /// Signed market exposure: -1, 0 or 1.
    pub fn exposure(&self) -> f64 {
        match self {
            Signal::Short => -1.0,
            Signal::Flat => 0.0,
            Signal::Long => 1.0,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Signal::Flat)
    }

    fn long_if(cond: bool) -> Self {
        if cond { Signal::Long } else { Signal::Flat }
    }
}

/// Anything the backtest engine can evaluate.
pub trait SignalRule {
    fn name(&self) -> &str;

    /// Minimum history for a meaningful signal.
    fn required_bars(&self) -> usize;

    /// One signal per bar, aligned with `series`.
    fn signals(&self, series: &PriceSeries) -> Vec<Signal>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StrategyKind {
    /// Long while close > MA(window).
    PriceAboveMa { window: usize },
    /// Long while MA(fast) > MA(slow).
    MaCrossover { fast: usize, slow: usize },
    /// Enter once close exceeds every `entry` MA, leave once close drops
    /// below MA(`exit`). State carries across bars.
    Hysteresis { entry: Vec<usize>, exit: usize },
}

impl StrategyKind {
    pub fn windows(&self) -> Vec<usize> {
        match self {
            StrategyKind::PriceAboveMa { window } => vec![*window],
            StrategyKind::MaCrossover { fast, slow } => vec![*fast, *slow],
            StrategyKind::Hysteresis { entry, exit } => {
                let mut w = entry.clone();
                w.push(*exit);
                w
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Strategy {
    /// Stable identifier used on the command line.
    pub key: String,
    pub name: String,
    pub kind: StrategyKind,
}

impl Strategy {
    pub fn new(key: impl Into<String>, name: impl Into<String>, kind: StrategyKind) -> Self {
        Strategy {
            key: key.into(),
            name: name.into(),
            kind,
        }
    }

    pub fn price_above(window: usize) -> Self {
        Strategy::new(
            format!("price-above-{window}"),
            format!("Price > {window}MA"),
            StrategyKind::PriceAboveMa { window },
        )
    }

    pub fn crossover(fast: usize, slow: usize) -> Self {
        Strategy::new(
            format!("cross-{fast}-{slow}"),
            format!("{fast}/{slow} golden/death cross"),
            StrategyKind::MaCrossover { fast, slow },
        )
    }

    fn averages(&self, closes: &[f64]) -> HashMap<IndicatorType, Vec<f64>> {
        let types: Vec<IndicatorType> = self
            .kind
            .windows()
            .into_iter()
            .map(IndicatorType::Sma)
            .collect();
        compute_indicators(closes, &types)
    }
}

impl SignalRule for Strategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_bars(&self) -> usize {
        self.kind.windows().into_iter().max().unwrap_or(0) + 1
    }

    fn signals(&self, series: &PriceSeries) -> Vec<Signal> {
        let closes = series.closes();
        let ma = self.averages(&closes);
        let sma = |w: usize| ma.get(&IndicatorType::Sma(w)).map(Vec::as_slice).unwrap_or(&[]);
        // Undefined averages compare false, so warmup bars stay flat.
        let at = |w: usize, i: usize| sma(w).get(i).copied().unwrap_or(f64::NAN);

        match &self.kind {
            StrategyKind::PriceAboveMa { window } => (0..closes.len())
                .map(|i| Signal::long_if(closes[i] > at(*window, i)))
                .collect(),
            StrategyKind::MaCrossover { fast, slow } => (0..closes.len())
                .map(|i| Signal::long_if(at(*fast, i) > at(*slow, i)))
                .collect(),
            StrategyKind::Hysteresis { entry, exit } => {
                let mut out = vec![Signal::Flat; closes.len()];
                let mut holding = false;
                for i in 1..closes.len() {
                    let c = closes[i];
                    if !holding && entry.iter().all(|&w| c > at(w, i)) {
                        holding = true;
                    } else if holding && c < at(*exit, i) {
                        holding = false;
                    }
                    out[i] = Signal::long_if(holding);
                }
                out
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.key)
    }
}

/// Ordered registry of strategies.
#[derive(Debug, Clone)]
pub struct StrategyCatalog {
    strategies: Vec<Strategy>,
}

impl StrategyCatalog {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        StrategyCatalog { strategies }
    }

    /// Close above its 20-bar average: the quick single-asset screen.
    pub fn trend_following() -> Strategy {
        Strategy::price_above(20)
    }

    pub fn get(&self, key: &str) -> Result<&Strategy, QuantError> {
        let wanted = key.trim();
        self.strategies
            .iter()
            .find(|s| s.key.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| QuantError::UnknownStrategy {
                name: wanted.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Strategy> {
        self.strategies.iter()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyCatalog {
    fn default() -> Self {
        let mut strategies: Vec<Strategy> =
            [20, 43, 60, 87, 284].into_iter().map(Strategy::price_above).collect();
        strategies.push(Strategy::new(
            "asymmetric-20-60",
            "Asymmetric: enter P>20MA / exit P<60MA",
            StrategyKind::Hysteresis {
                entry: vec![20],
                exit: 60,
            },
        ));
        strategies.extend(
            [(20, 60), (20, 87), (20, 284), (43, 87), (43, 284), (60, 87), (60, 284)]
                .into_iter()
                .map(|(fast, slow)| Strategy::crossover(fast, slow)),
        );
        strategies.push(Strategy::new(
            "core-87-284",
            "Core: 87MA above 284MA",
            StrategyKind::MaCrossover { fast: 87, slow: 284 },
        ));
        strategies.push(Strategy::new(
            "dual-confirm-20-60",
            "Dual confirm: enter P>20MA & P>60MA / exit P<60MA",
            StrategyKind::Hysteresis {
                entry: vec![20, 60],
                exit: 60,
            },
        ));
        StrategyCatalog { strategies }
    }
}
