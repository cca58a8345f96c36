pub mod candle;
pub mod signal;
pub mod timeframe;

pub use candle::{Candle, Series, SeriesError};
pub use signal::{Direction, Signal, StrategyId};
pub use timeframe::{Timeframe, UnknownTimeframe};
