use common::models::{Series, Signal, StrategyId};

use super::{
    Detection, Evaluation, SignalStrategy, SkipReason, checked_closes, skipped, tail,
};
use crate::indicators::{DEFAULT_RSI_PERIOD, ema, rsi};

const LONG_RSI_LEVEL: f64 = 55.0;
const SHORT_RSI_LEVEL: f64 = 45.0;

/// EMA crossover paired with RSI leaving its band on the same bar.
///
/// LONG (RSI): fast crosses above slow while RSI falls from above 55 to 55 or
/// below. SHORT (RSI) is the mirror around 45.
pub fn rsi_cross_signal(fast: [f64; 2], slow: [f64; 2], rsi: [f64; 2]) -> Option<Signal> {
    let [fast_prev, fast_last] = fast;
    let [slow_prev, slow_last] = slow;
    let [rsi_prev, rsi_last] = rsi;

    if fast_prev < slow_prev
        && fast_last > slow_last
        && rsi_prev > LONG_RSI_LEVEL
        && rsi_last <= LONG_RSI_LEVEL
    {
        Some(Signal::LongRsi)
    } else if fast_prev > slow_prev
        && fast_last < slow_last
        && rsi_prev < SHORT_RSI_LEVEL
        && rsi_last >= SHORT_RSI_LEVEL
    {
        Some(Signal::ShortRsi)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct RsiCrossStrategy {
    fast: usize,
    slow: usize,
    rsi_period: usize,
}

impl RsiCrossStrategy {
    pub fn new() -> Self {
        Self {
            fast: 9,
            slow: 20,
            rsi_period: DEFAULT_RSI_PERIOD,
        }
    }
}

impl Default for RsiCrossStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalStrategy for RsiCrossStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::EmaCross9_20Rsi
    }

    fn evaluate(&self, series: &Series, min_len: usize) -> Evaluation {
        let closes = match checked_closes(series, min_len) {
            Ok(closes) => closes,
            Err(reason) => return skipped(self.id(), series, reason),
        };

        let indicators = ema(&closes, self.fast).and_then(|fast| {
            let slow = ema(&closes, self.slow)?;
            let rsi = rsi(&closes, self.rsi_period)?;
            Ok((fast, slow, rsi))
        });
        let (fast, slow, rsi) = match indicators {
            Ok(values) => values,
            Err(e) => return skipped(self.id(), series, e.into()),
        };

        let n = rsi.len();
        let (rsi_prev, rsi_last) = match (rsi[n - 2], rsi[n - 1]) {
            (Some(prev), Some(last)) => (prev, last),
            _ => return skipped(self.id(), series, SkipReason::RsiUndefined),
        };

        let [_, price] = tail(&closes);
        match rsi_cross_signal(tail(&fast), tail(&slow), [rsi_prev, rsi_last]) {
            Some(signal) => Evaluation::Triggered(Detection {
                signal,
                price,
                rsi: Some((rsi_prev, rsi_last)),
            }),
            None => Evaluation::NoCrossover,
        }
    }
}
