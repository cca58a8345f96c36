use std::collections::HashSet;

use serde::Deserialize;

use crate::{error::MarketDataError, traits::RemoteResponse};

const TRADING_STATUS: &str = "TRADING";

#[derive(Deserialize, Debug)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Deserialize, Debug)]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
}

impl RemoteResponse<HashSet<String>> for ExchangeInfoResponse {
    fn to_model(&self) -> Result<HashSet<String>, MarketDataError> {
        Ok(self
            .symbols
            .iter()
            .filter(|s| s.status == TRADING_STATUS)
            .map(|s| s.symbol.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_trading_symbols_are_kept() {
        let info: ExchangeInfoResponse = serde_json::from_value(json!({
            "timezone": "UTC",
            "symbols": [
                { "symbol": "BTCUSDT", "status": "TRADING", "baseAsset": "BTC" },
                { "symbol": "LUNAUSDT", "status": "BREAK", "baseAsset": "LUNA" },
                { "symbol": "ETHUSDT", "status": "TRADING", "baseAsset": "ETH" }
            ]
        }))
        .unwrap();

        let tradable = info.to_model().unwrap();
        assert_eq!(tradable.len(), 2);
        assert!(tradable.contains("BTCUSDT"));
        assert!(tradable.contains("ETHUSDT"));
        assert!(!tradable.contains("LUNAUSDT"));
    }
}
