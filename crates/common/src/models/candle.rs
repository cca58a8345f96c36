use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Timeframe;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time, milliseconds since epoch.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series is empty")]
    Empty,
    #[error("candle {index} has a missing {field} value")]
    MissingValue { index: usize, field: &'static str },
    #[error("candle {index} has a non-positive {field}: {value}")]
    NonPositive {
        index: usize,
        field: &'static str,
        value: f64,
    },
    #[error("candle {index} is not later than the previous candle")]
    OutOfOrder { index: usize },
}

/// Time-ascending candles for one symbol on one timeframe.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub symbol: String,
    pub timeframe: Timeframe,
    candles: Vec<Candle>,
}

impl Series {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            candles,
        }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }

    /// Checks the invariants the evaluators rely on: every OHLCV value
    /// present, OHLC strictly positive, timestamps strictly ascending.
    pub fn validate(&self) -> Result<(), SeriesError> {
        if self.candles.is_empty() {
            return Err(SeriesError::Empty);
        }

        let mut prev_ts: Option<i64> = None;
        for (index, candle) in self.candles.iter().enumerate() {
            let prices = [
                ("open", candle.open),
                ("high", candle.high),
                ("low", candle.low),
                ("close", candle.close),
            ];

            for (field, value) in prices {
                if !value.is_finite() {
                    return Err(SeriesError::MissingValue { index, field });
                }
                if value <= 0.0 {
                    return Err(SeriesError::NonPositive {
                        index,
                        field,
                        value,
                    });
                }
            }

            if !candle.volume.is_finite() {
                return Err(SeriesError::MissingValue {
                    index,
                    field: "volume",
                });
            }

            if let Some(prev) = prev_ts {
                if candle.timestamp <= prev {
                    return Err(SeriesError::OutOfOrder { index });
                }
            }
            prev_ts = Some(candle.timestamp);
        }

        Ok(())
    }
}
