//! Telegram message bodies (HTML parse mode).
use std::fmt::Display;

use common::models::{StrategyId, Timeframe};
use strategy::{Detection, OcoPrices};
use teloxide::utils::html::escape;

pub fn signal(
    symbol: &str,
    strategy: StrategyId,
    detection: &Detection,
    oco: &OcoPrices,
    timeframe: Timeframe,
) -> String {
    let mut text = format!(
        "<b>📊 {} {} signal for {}</b>\n\
         <i>Price</i>: <code>{:.4}</code>\n\
         <i>Timeframe</i>: <code>{}</code>\n",
        strategy, detection.signal, symbol, detection.price, timeframe
    );
    if let Some((prev, last)) = detection.rsi {
        text.push_str(&format!("<i>RSI</i>: <code>{:.1} → {:.1}</code>\n", prev, last));
    }
    text.push_str(&format!(
        "\n<b>📈 OCO order levels</b>\n\
         - <i>Take profit (limit)</i>: <code>{:.4}</code>\n\
         - <i>Stop loss (trigger)</i>: <code>{:.4}</code>\n\
         - <i>Stop loss (market)</i>: <code>{:.4}</code>\n",
        oco.take_profit, oco.stop_trigger, oco.stop_market
    ));
    text
}

pub fn started(pairs: usize) -> String {
    format!("✅ <b>Bot started</b>: {} trading pairs verified", pairs)
}

pub fn probe_ok(symbol: &str) -> String {
    format!("✅ <b>Bot started</b>: test request for {} succeeded", symbol)
}

pub fn fatal(context: &str, error: impl Display) -> String {
    format!(
        "❌ <b>Critical error</b>: {}: {}",
        context,
        escape(&error.to_string())
    )
}

pub fn stopped(failed_cycles: u32) -> String {
    format!(
        "❌ <b>Critical error</b>: bot stopped after {} consecutive failed cycles",
        failed_cycles
    )
}

pub fn status(succeeded: usize, total: usize) -> String {
    format!("🔔 <b>Bot status</b>: processed {}/{} pairs", succeeded, total)
}

pub fn ping() -> String {
    "🔔 <b>EMA signals bot</b>: running".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::Signal;

    #[test]
    fn test_crossover_alert_has_oco_levels_and_no_rsi() {
        let detection = Detection {
            signal: Signal::Long,
            price: 100.0,
            rsi: None,
        };
        let oco = OcoPrices {
            take_profit: 102.0,
            stop_trigger: 99.0,
            stop_market: 98.901,
        };
        let text = signal("BTCUSDT", StrategyId::EmaCross7_30, &detection, &oco, Timeframe::H1);

        assert!(text.contains("EMA7/30 LONG signal for BTCUSDT"));
        assert!(text.contains("<code>100.0000</code>"));
        assert!(text.contains("<code>1h</code>"));
        assert!(text.contains("<code>98.9010</code>"));
        assert!(!text.contains("RSI"));
    }

    #[test]
    fn test_momentum_alert_carries_rsi_pair() {
        let detection = Detection {
            signal: Signal::ShortRsi,
            price: 2.5,
            rsi: Some((40.04, 45.36)),
        };
        let oco = OcoPrices {
            take_profit: 2.45,
            stop_trigger: 2.525,
            stop_market: 2.5275,
        };
        let text = signal("XRPUSDT", StrategyId::EmaCross9_20Rsi, &detection, &oco, Timeframe::H4);

        assert!(text.contains("EMA9/20+RSI SHORT (RSI) signal for XRPUSDT"));
        assert!(text.contains("<code>40.0 → 45.4</code>"));
    }

    #[test]
    fn test_fatal_message_escapes_error_text() {
        let text = fatal("could not load trading pairs", "HTTP 502: <html>");
        assert!(text.contains("&lt;html&gt;"));
    }
}
