//! Bernoulli failure injection

use rand::Rng;
use types::SimulationError;

/// Decides whether a simulated operation fails
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureInjector {
    rate: f64,
}

impl FailureInjector {
    /// Rates outside [0, 1] are clamped
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        Self { rate }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Draw once; true means the operation fails
    pub fn should_fail<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.rate
    }

    /// Draw once against the payment failure message
    pub fn check<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(), SimulationError> {
        if self.should_fail(rng) {
            Err(SimulationError::TransactionFailed)
        } else {
            Ok(())
        }
    }
}
