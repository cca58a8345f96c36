use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

/// Directional label emitted by a strategy. "No signal" is never a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Long,
    Short,
    LongRsi,
    ShortRsi,
}

impl Signal {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Long => "LONG",
            Self::Short => "SHORT",
            Self::LongRsi => "LONG (RSI)",
            Self::ShortRsi => "SHORT (RSI)",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::Long | Self::LongRsi => Direction::Long,
            Self::Short | Self::ShortRsi => Direction::Short,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyId {
    /// EMA(7) / EMA(30) crossover confirmed by price.
    EmaCross7_30,
    /// EMA(9) / EMA(20) crossover with an RSI(14) band exit.
    EmaCross9_20Rsi,
}

impl StrategyId {
    pub fn label(&self) -> &'static str {
        match self {
            Self::EmaCross7_30 => "EMA7/30",
            Self::EmaCross9_20Rsi => "EMA9/20+RSI",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Signal::Long.to_string(), "LONG");
        assert_eq!(Signal::ShortRsi.to_string(), "SHORT (RSI)");
        assert_eq!(StrategyId::EmaCross9_20Rsi.to_string(), "EMA9/20+RSI");
    }

    #[test]
    fn test_direction_follows_label_family() {
        assert_eq!(Signal::Long.direction(), Direction::Long);
        assert_eq!(Signal::LongRsi.direction(), Direction::Long);
        assert_eq!(Signal::Short.direction(), Direction::Short);
        assert_eq!(Signal::ShortRsi.direction(), Direction::Short);
    }
}
