use crate::config::ArbiterConfig;
use crate::invariants::InvariantCheck;
use crate::math::position_trace;
use crate::state::{BeliefHistory, BeliefState};

/// Hard penalty for a belief claiming high confidence with an implausibly
/// small position covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceHonesty {
    pub conf_high: f64,
    pub sigma_min: f64,
}

impl CovarianceHonesty {
    pub const PENALTY: f64 = 1.0;

    pub fn from_config(cfg: &ArbiterConfig) -> Self {
        Self {
            conf_high: cfg.conf_high,
            sigma_min: cfg.sigma_min,
        }
    }
}

impl InvariantCheck for CovarianceHonesty {
    fn name(&self) -> &'static str {
        "covariance_honesty"
    }

    fn evaluate(&self, current: &BeliefState, _history: &BeliefHistory, _peers: &[&BeliefState]) -> f64 {
        let trace = position_trace(current.covariance(), current.dim());
        if current.internal_confidence() > self.conf_high && trace < self.sigma_min {
            Self::PENALTY
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, DVector};

    fn with_cov(conf: f64, var: f64) -> BeliefState {
        BeliefState::new(
            "gps",
            DVector::zeros(2),
            DVector::zeros(2),
            DMatrix::identity(2, 2) * var,
            conf,
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn overconfident_tiny_covariance_is_penalised() {
        let inv = CovarianceHonesty::from_config(&ArbiterConfig::default());
        let h = BeliefHistory::new(1);
        assert_eq!(inv.evaluate(&with_cov(0.99, 1e-6), &h, &[]), 1.0);
    }

    #[test]
    fn honest_or_modest_beliefs_pass() {
        let inv = CovarianceHonesty::from_config(&ArbiterConfig::default());
        let h = BeliefHistory::new(1);
        assert_eq!(inv.evaluate(&with_cov(0.99, 2.0), &h, &[]), 0.0);
        assert_eq!(inv.evaluate(&with_cov(0.5, 1e-6), &h, &[]), 0.0);
    }
}
