use std::collections::HashMap;

use common::models::{Signal, StrategyId};

/// Last signal emitted per (symbol, strategy).
///
/// Only transitions are alerted: a signal equal to the stored one is a
/// duplicate. Nothing ever clears an entry, so a bar without a signal does
/// not re-arm the same direction.
#[derive(Debug, Default)]
pub struct SignalStateStore {
    last: HashMap<(String, StrategyId), Signal>,
}

impl SignalStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str, strategy: StrategyId) -> Option<Signal> {
        self.last.get(&(symbol.to_string(), strategy)).copied()
    }

    pub fn set(&mut self, symbol: &str, strategy: StrategyId, signal: Signal) {
        self.last.insert((symbol.to_string(), strategy), signal);
    }

    pub fn is_transition(&self, symbol: &str, strategy: StrategyId, signal: Signal) -> bool {
        self.get(symbol, strategy) != Some(signal)
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mirrors the orchestrator contract: alert on transition, then set.
    fn observe(store: &mut SignalStateStore, signal: Option<Signal>) -> bool {
        match signal {
            Some(s) if store.is_transition("BTCUSDT", StrategyId::EmaCross7_30, s) => {
                store.set("BTCUSDT", StrategyId::EmaCross7_30, s);
                true
            }
            _ => false,
        }
    }

    #[test]
    fn test_empty_store_treats_any_signal_as_transition() {
        let store = SignalStateStore::new();
        assert!(store.is_empty());
        assert!(store.is_transition("ETHUSDT", StrategyId::EmaCross9_20Rsi, Signal::ShortRsi));
        assert_eq!(store.get("ETHUSDT", StrategyId::EmaCross9_20Rsi), None);
    }

    #[test]
    fn test_repeated_signal_alerts_once() {
        let mut store = SignalStateStore::new();
        assert!(observe(&mut store, Some(Signal::Long)));
        assert!(!observe(&mut store, Some(Signal::Long)));
        assert_eq!(store.get("BTCUSDT", StrategyId::EmaCross7_30), Some(Signal::Long));
    }

    #[test]
    fn test_alternating_signals_alert_every_change() {
        let mut store = SignalStateStore::new();
        let alerts = [Signal::Long, Signal::Short, Signal::Long]
            .into_iter()
            .filter(|&s| observe(&mut store, Some(s)))
            .count();
        assert_eq!(alerts, 3);
    }

    #[test]
    fn test_no_signal_does_not_reset_suppression() {
        let mut store = SignalStateStore::new();
        assert!(observe(&mut store, Some(Signal::Long)));
        assert!(!observe(&mut store, None));
        assert!(!observe(&mut store, Some(Signal::Long)));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut store = SignalStateStore::new();
        store.set("BTCUSDT", StrategyId::EmaCross7_30, Signal::Long);

        assert!(store.is_transition("BTCUSDT", StrategyId::EmaCross9_20Rsi, Signal::LongRsi));
        assert!(store.is_transition("ETHUSDT", StrategyId::EmaCross7_30, Signal::Long));
        assert_eq!(store.len(), 1);
    }
}
