pub mod indicators;
pub mod oco;
pub mod services;
pub mod signal_state;

pub use indicators::IndicatorError;
pub use oco::{OcoPrices, calc_oco_prices};
pub use services::{
    Detection, EmaCrossStrategy, Evaluation, RsiCrossStrategy, SignalStrategy, SkipReason,
};
pub use signal_state::SignalStateStore;
