use ta::Next;
use ta::indicators::ExponentialMovingAverage;
use thiserror::Error;

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Substituted for a zero average loss so RSI stays finite.
pub const RSI_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: usize },
}

/// Exponential moving average aligned with `closes`.
///
/// Smoothing factor is `2 / (period + 1)` and the first output equals the
/// first input.
pub fn ema(closes: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    let mut ema = ExponentialMovingAverage::new(period).map_err(|_| {
        IndicatorError::InvalidParameter {
            name: "ema period",
            value: period,
        }
    })?;

    Ok(closes.iter().map(|&close| ema.next(close)).collect())
}

/// Relative strength index over simple trailing means of `period` deltas.
///
/// Index `i` is defined once `period` deltas exist, so the first `period`
/// entries are `None`.
pub fn rsi(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter {
            name: "rsi period",
            value: period,
        });
    }

    let mut out = vec![None; closes.len()];
    if closes.len() <= period {
        return Ok(out);
    }

    // Delta j is close[j + 1] - close[j].
    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            (delta.max(0.0), (-delta).max(0.0))
        })
        .unzip();

    let n = period as f64;
    for (i, slot) in out.iter_mut().enumerate().skip(period) {
        let window = (i - period)..i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / n;
        let mut avg_loss = losses[window].iter().sum::<f64>() / n;
        if avg_loss == 0.0 {
            avg_loss = RSI_EPSILON;
        }
        *slot = Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss));
    }

    Ok(out)
}
