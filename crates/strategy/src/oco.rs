use common::models::Direction;

/// Take-profit and stop-loss levels attached to an alert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcoPrices {
    pub take_profit: f64,
    pub stop_trigger: f64,
    pub stop_market: f64,
}

const MARKET_SLIPPAGE: f64 = 0.001;

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Derives the OCO triple from the entry price and percentages.
/// The market leg is computed from the already rounded trigger.
pub fn calc_oco_prices(direction: Direction, price: f64, tp_pct: f64, sl_pct: f64) -> OcoPrices {
    let (take_profit, stop_trigger) = match direction {
        Direction::Long => (price * (1.0 + tp_pct / 100.0), price * (1.0 - sl_pct / 100.0)),
        Direction::Short => (price * (1.0 - tp_pct / 100.0), price * (1.0 + sl_pct / 100.0)),
    };
    let stop_trigger = round4(stop_trigger);
    let stop_market = match direction {
        Direction::Long => stop_trigger * (1.0 - MARKET_SLIPPAGE),
        Direction::Short => stop_trigger * (1.0 + MARKET_SLIPPAGE),
    };

    OcoPrices {
        take_profit: round4(take_profit),
        stop_trigger,
        stop_market: round4(stop_market),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_levels() {
        let oco = calc_oco_prices(Direction::Long, 100.0, 2.0, 1.0);
        assert_eq!(oco.take_profit, 102.0);
        assert_eq!(oco.stop_trigger, 99.0);
        assert_eq!(oco.stop_market, 98.901);
    }

    #[test]
    fn test_short_levels() {
        let oco = calc_oco_prices(Direction::Short, 100.0, 2.0, 1.0);
        assert_eq!(oco.take_profit, 98.0);
        assert_eq!(oco.stop_trigger, 101.0);
        assert_eq!(oco.stop_market, 101.101);
    }

    #[test]
    fn test_levels_are_rounded_to_four_places() {
        let oco = calc_oco_prices(Direction::Long, 0.123456, 1.5, 0.7);
        assert_eq!(oco.take_profit, 0.1253);
        assert_eq!(oco.stop_trigger, 0.1226);
        assert_eq!(oco.stop_market, 0.1225);
    }
}
