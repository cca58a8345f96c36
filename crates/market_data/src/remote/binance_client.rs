use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use common::config::MAX_HISTORY_LIMIT;
use common::models::{Series, Timeframe};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::MarketDataError;
use crate::remote::{ExchangeInfoResponse, KlineRow};
use crate::traits::{MarketDataSource, RemoteResponse};

const USER_AGENT: &str = "ema_signals_bot/0.1.0";
const WEIGHT_HEADER: &str = "x-mbx-used-weight-1m";

/// Public (unsigned) Binance spot REST endpoints.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: Url,
    closed_only: bool,
}

impl BinanceClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            closed_only: false,
        })
    }

    /// Drop the still-forming last candle from every fetched series.
    /// One extra row is requested so the series keeps its requested length.
    pub fn closed_candles_only(mut self, enabled: bool) -> Self {
        self.closed_only = enabled;
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, MarketDataError> {
        let url = self.base_url.join(path)?;
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
            return Err(MarketDataError::RateLimited(status.as_u16()));
        }

        if let Some(used_weight) = response.headers().get(WEIGHT_HEADER) {
            match used_weight.to_str().ok().and_then(|w| w.parse::<u32>().ok()) {
                Some(weight) if weight > 1000 => warn!("High API weight usage: {}", weight),
                Some(weight) => debug!("Used weights: {}", weight),
                None => debug!("Unreadable weight header: {:?}", used_weight),
            }
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| MarketDataError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    async fn list_tradable_symbols(&self) -> Result<HashSet<String>, MarketDataError> {
        let info: ExchangeInfoResponse = self.get_json("/api/v3/exchangeInfo", &[]).await?;
        let tradable = info.to_model()?;
        debug!("Exchange lists {} tradable symbols", tradable.len());
        Ok(tradable)
    }

    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Series, MarketDataError> {
        let requested = if self.closed_only {
            (limit + 1).min(MAX_HISTORY_LIMIT)
        } else {
            limit
        };
        let query = [
            ("symbol", symbol.to_string()),
            ("interval", timeframe.as_str().to_string()),
            ("limit", requested.to_string()),
        ];
        let mut rows: Vec<KlineRow> = self.get_json("/api/v3/klines", &query).await?;

        if self.closed_only {
            if drop_open_candle(&mut rows, Utc::now().timestamp_millis()) {
                debug!("Dropped forming candle for {}", symbol);
            }
            let excess = rows.len().saturating_sub(limit);
            rows.drain(..excess);
        }

        if rows.is_empty() {
            return Err(MarketDataError::Empty(symbol.to_string()));
        }

        let candles = rows
            .iter()
            .map(|row| row.to_model())
            .collect::<Result<Vec<_>, _>>()?;

        let series = Series::new(symbol, timeframe, candles);
        series
            .validate()
            .map_err(|source| MarketDataError::DataQuality {
                symbol: symbol.to_string(),
                source,
            })?;

        info!("Fetched {} candles for {}", series.len(), symbol);
        if series.len() < limit {
            warn!("Not enough data for {}: {} candles", symbol, series.len());
        }
        if let Some(age) = stale_age(&series, Utc::now()) {
            warn!(
                "Data for {} ({}) is stale: last candle {:.1} hours old",
                symbol,
                timeframe,
                age.num_seconds() as f64 / 3600.0
            );
        }

        Ok(series)
    }
}

/// Removes the last row when its close time is still ahead of `now_ms`.
/// Rows without a close time are kept.
pub fn drop_open_candle(rows: &mut Vec<KlineRow>, now_ms: i64) -> bool {
    let forming = rows
        .last()
        .and_then(KlineRow::close_time)
        .is_some_and(|close_time| close_time > now_ms);
    if forming {
        rows.pop();
    }
    forming
}

/// Age of the last candle when it is older than two timeframe periods.
pub fn stale_age(series: &Series, now: DateTime<Utc>) -> Option<TimeDelta> {
    let last = DateTime::<Utc>::from_timestamp_millis(series.last()?.timestamp)?;
    let age = now - last;
    let limit = TimeDelta::from_std(series.timeframe.duration() * 2).ok()?;

    (age > limit).then_some(age)
}
