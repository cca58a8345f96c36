use std::collections::HashSet;

use async_trait::async_trait;
use common::models::{Series, Timeframe};

use crate::error::MarketDataError;

/// Conversion from a raw exchange payload into a domain model.
pub trait RemoteResponse<T> {
    fn to_model(&self) -> Result<T, MarketDataError>;
}

/// Candle history provider. Implementations may fail or stall; callers
/// bound each call with their own timeout.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn list_tradable_symbols(&self) -> Result<HashSet<String>, MarketDataError>;

    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Series, MarketDataError>;
}
