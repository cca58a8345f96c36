use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("{name} must be a positive number, got {value}")]
    NotPositive { name: &'static str, value: f64 },
}

/// Take-profit / stop-loss percentages shared between the command
/// responder (writer) and alert construction (reader).
///
/// Each value is a single atomic swap of the f64 bit pattern, so readers
/// never see a torn value and no lock is held.
#[derive(Debug)]
pub struct RuntimeParams {
    take_profit_pct: AtomicU64,
    stop_loss_pct: AtomicU64,
}

impl RuntimeParams {
    pub fn new(take_profit_pct: f64, stop_loss_pct: f64) -> Result<Self, ParamError> {
        check_positive("take-profit", take_profit_pct)?;
        check_positive("stop-loss", stop_loss_pct)?;

        Ok(Self {
            take_profit_pct: AtomicU64::new(take_profit_pct.to_bits()),
            stop_loss_pct: AtomicU64::new(stop_loss_pct.to_bits()),
        })
    }

    pub fn take_profit_pct(&self) -> f64 {
        f64::from_bits(self.take_profit_pct.load(Ordering::Relaxed))
    }

    pub fn stop_loss_pct(&self) -> f64 {
        f64::from_bits(self.stop_loss_pct.load(Ordering::Relaxed))
    }

    pub fn set_take_profit_pct(&self, value: f64) -> Result<(), ParamError> {
        check_positive("take-profit", value)?;
        self.take_profit_pct.store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    pub fn set_stop_loss_pct(&self, value: f64) -> Result<(), ParamError> {
        check_positive("stop-loss", value)?;
        self.stop_loss_pct.store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ParamError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParamError::NotPositive { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_non_positive() {
        assert!(RuntimeParams::new(0.0, 1.0).is_err());
        assert!(RuntimeParams::new(2.0, -1.0).is_err());
        assert!(RuntimeParams::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_setters_swap_values() {
        let params = RuntimeParams::new(2.0, 1.0).unwrap();
        params.set_take_profit_pct(3.5).unwrap();
        params.set_stop_loss_pct(0.75).unwrap();

        assert_eq!(params.take_profit_pct(), 3.5);
        assert_eq!(params.stop_loss_pct(), 0.75);
    }

    #[test]
    fn test_rejected_update_leaves_value_untouched() {
        let params = RuntimeParams::new(2.0, 1.0).unwrap();

        assert_eq!(
            params.set_take_profit_pct(-4.0),
            Err(ParamError::NotPositive {
                name: "take-profit",
                value: -4.0
            })
        );
        assert!(params.set_stop_loss_pct(f64::INFINITY).is_err());
        assert_eq!(params.take_profit_pct(), 2.0);
        assert_eq!(params.stop_loss_pct(), 1.0);
    }
}
