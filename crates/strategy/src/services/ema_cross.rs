use common::models::{Series, Signal, StrategyId};

use super::{Detection, Evaluation, SignalStrategy, checked_closes, skipped, tail};
use crate::indicators::ema;

/// Crossover of a fast and a slow EMA, confirmed by the close sitting on the
/// same side of both averages.
pub fn ema_cross_signal(fast: [f64; 2], slow: [f64; 2], close: f64) -> Option<Signal> {
    let [fast_prev, fast_last] = fast;
    let [slow_prev, slow_last] = slow;

    if fast_prev < slow_prev && fast_last > slow_last && close > fast_last && close > slow_last {
        Some(Signal::Long)
    } else if fast_prev > slow_prev
        && fast_last < slow_last
        && close < fast_last
        && close < slow_last
    {
        Some(Signal::Short)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct EmaCrossStrategy {
    fast: usize,
    slow: usize,
}

impl EmaCrossStrategy {
    pub fn new() -> Self {
        Self { fast: 7, slow: 30 }
    }
}

impl Default for EmaCrossStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalStrategy for EmaCrossStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::EmaCross7_30
    }

    fn evaluate(&self, series: &Series, min_len: usize) -> Evaluation {
        let closes = match checked_closes(series, min_len) {
            Ok(closes) => closes,
            Err(reason) => return skipped(self.id(), series, reason),
        };

        let (fast, slow) = match (ema(&closes, self.fast), ema(&closes, self.slow)) {
            (Ok(fast), Ok(slow)) => (fast, slow),
            (Err(e), _) | (_, Err(e)) => return skipped(self.id(), series, e.into()),
        };

        let [_, price] = tail(&closes);
        match ema_cross_signal(tail(&fast), tail(&slow), price) {
            Some(signal) => Evaluation::Triggered(Detection {
                signal,
                price,
                rsi: None,
            }),
            None => Evaluation::NoCrossover,
        }
    }
}
