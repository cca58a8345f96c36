use common::models::Candle;
use serde::Deserialize;
use serde_json::Value;

use crate::{error::MarketDataError, traits::RemoteResponse};

/// One row of `/api/v3/klines`:
/// `[open_time, open, high, low, close, volume, close_time, ...]`.
/// The candle is built from the first six fields.
#[derive(Deserialize, Debug)]
#[serde(transparent)]
pub struct KlineRow(pub Vec<Value>);

impl KlineRow {
    /// Close time in epoch milliseconds, if the row carries one.
    pub fn close_time(&self) -> Option<i64> {
        self.0.get(6)?.as_i64()
    }
}

impl RemoteResponse<Candle> for KlineRow {
    fn to_model(&self) -> Result<Candle, MarketDataError> {
        if self.0.len() < 6 {
            return Err(MarketDataError::Malformed(format!(
                "kline row has {} fields, expected at least 6",
                self.0.len()
            )));
        }

        let timestamp = self.0[0].as_i64().ok_or_else(|| {
            MarketDataError::Malformed(format!("kline open time is not an integer: {}", self.0[0]))
        })?;

        Ok(Candle {
            timestamp,
            open: number_field(&self.0[1], "open")?,
            high: number_field(&self.0[2], "high")?,
            low: number_field(&self.0[3], "low")?,
            close: number_field(&self.0[4], "close")?,
            volume: number_field(&self.0[5], "volume")?,
        })
    }
}

// Nulls become NaN so series validation reports them as missing values
// rather than as a malformed payload.
fn number_field(value: &Value, name: &str) -> Result<f64, MarketDataError> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::String(raw) => raw
            .parse::<f64>()
            .map_err(|_| MarketDataError::Malformed(format!("{} is not a number: {:?}", name, raw))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| MarketDataError::Malformed(format!("{} is out of range: {}", name, n))),
        other => Err(MarketDataError::Malformed(format!(
            "{} has unexpected type: {}",
            name, other
        ))),
    }
}
