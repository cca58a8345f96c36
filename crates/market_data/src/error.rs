use std::time::Duration;

use common::models::SeriesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("rate limited by exchange (HTTP {0})")]
    RateLimited(u16),
    #[error("exchange returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("no data returned for {0}")]
    Empty(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("data for {symbol} failed validation: {source}")]
    DataQuality {
        symbol: String,
        #[source]
        source: SeriesError,
    },
    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
}
