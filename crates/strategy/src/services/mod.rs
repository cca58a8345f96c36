use common::models::{Series, SeriesError, Signal, StrategyId};
use thiserror::Error;
use tracing::warn;

use crate::indicators::IndicatorError;

pub mod ema_cross;
pub mod rsi_cross;

pub use ema_cross::{EmaCrossStrategy, ema_cross_signal};
pub use rsi_cross::{RsiCrossStrategy, rsi_cross_signal};

/// Crossover rules compare the last two bars.
const MIN_BARS: usize = 2;

/// A strategy turns a price series into at most one directional signal.
///
/// Evaluators are stateless: indicators are recomputed on every call and
/// signal memory lives in [`crate::SignalStateStore`].
pub trait SignalStrategy: Send + Sync {
    fn id(&self) -> StrategyId;

    fn evaluate(&self, series: &Series, min_len: usize) -> Evaluation;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub signal: Signal,
    /// Close of the last bar.
    pub price: f64,
    /// RSI at the previous and the last bar, for momentum strategies.
    pub rsi: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("insufficient history: {len} candles, {required} required")]
    InsufficientHistory { len: usize, required: usize },
    #[error("invalid series: {0}")]
    InvalidSeries(SeriesError),
    #[error("RSI undefined on the last two bars")]
    RsiUndefined,
    #[error(transparent)]
    Indicator(#[from] IndicatorError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Triggered(Detection),
    NoCrossover,
    Skipped(SkipReason),
}

impl Evaluation {
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            Self::Triggered(detection) => Some(detection),
            _ => None,
        }
    }

    pub fn signal(&self) -> Option<Signal> {
        self.detection().map(|d| d.signal)
    }
}

/// Length and data-quality gate shared by all evaluators. Returns the closes.
pub(crate) fn checked_closes(series: &Series, min_len: usize) -> Result<Vec<f64>, SkipReason> {
    let required = min_len.max(MIN_BARS);
    if series.len() < required {
        return Err(SkipReason::InsufficientHistory {
            len: series.len(),
            required,
        });
    }
    series.validate().map_err(SkipReason::InvalidSeries)?;

    Ok(series.closes())
}

pub(crate) fn skipped(id: StrategyId, series: &Series, reason: SkipReason) -> Evaluation {
    warn!("{} skipped for {}: {}", id, series.symbol, reason);
    Evaluation::Skipped(reason)
}

/// Last two values of a slice holding at least two elements.
pub(crate) fn tail(values: &[f64]) -> [f64; 2] {
    let n = values.len();
    [values[n - 2], values[n - 1]]
}

#[cfg(test)]
pub(crate) mod fixtures {
    use common::models::{Candle, Series, Timeframe};

    pub fn series_from_closes(closes: &[f64]) -> Series {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: 1_700_000_000_000 + i as i64 * 3_600_000,
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect();
        Series::new("BTCUSDT", Timeframe::H1, candles)
    }

    /// 150-bar random walk from 100.00 in whole-cent steps of at most one unit.
    ///
    /// Driven by a 64-bit LCG so every platform builds the same closes.
    pub fn cent_walk(seed: u64) -> Vec<f64> {
        let mut state = seed;
        let mut cents: i64 = 10_000;
        (0..150)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                cents += ((state >> 33) % 201) as i64 - 100;
                cents as f64 / 100.0
            })
            .collect()
    }

    /// EMA9 crosses above EMA20 on the last bar while RSI drops from 59.8 to 52.7.
    pub const LONG_RSI_WALK: u64 = 76_409;

    /// EMA9 crosses below EMA20 on the last bar while RSI climbs from 44.3 to 45.4.
    pub const SHORT_RSI_WALK: u64 = 183_941;

    /// Steady decline followed by a sharp rally on the final bar.
    pub fn falling_then_jump() -> Series {
        let mut closes: Vec<f64> = (0..149).map(|i| 200.0 - 0.5 * i as f64).collect();
        let last = closes[148];
        closes.push(last + 60.0);
        series_from_closes(&closes)
    }

    /// Steady rise followed by a sharp drop on the final bar.
    pub fn rising_then_crash() -> Series {
        let mut closes: Vec<f64> = (0..149).map(|i| 100.0 + 0.5 * i as f64).collect();
        let last = closes[148];
        closes.push(last - 60.0);
        series_from_closes(&closes)
    }
}
