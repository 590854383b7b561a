use crate::config::ArbiterConfig;
use crate::invariants::InvariantCheck;
use crate::math::relative_excess;
use crate::state::{BeliefHistory, BeliefState};

/// Penalises implied acceleration between the current state and the most
/// recent state in the belief's own history.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalSmoothness {
    pub max_accel: f64,
    pub min_history: usize,
    pub ceiling: f64,
}

impl TemporalSmoothness {
    pub fn from_config(cfg: &ArbiterConfig) -> Self {
        Self {
            max_accel: cfg.max_accel,
            min_history: cfg.min_history,
            ceiling: cfg.penalty_ceiling,
        }
    }
}

impl InvariantCheck for TemporalSmoothness {
    fn name(&self) -> &'static str {
        "temporal_smoothness"
    }

    fn evaluate(&self, current: &BeliefState, history: &BeliefHistory, _peers: &[&BeliefState]) -> f64 {
        // Startup: not enough data is compliance, not a fault.
        if history.len() < self.min_history {
            return 0.0;
        }
        let Some(prev) = history.last() else {
            return 0.0;
        };

        let dt = current.timestamp() - prev.timestamp();
        if !dt.is_finite() || dt <= 0.0 {
            return self.ceiling;
        }
        if prev.velocity().len() != current.velocity().len() {
            return self.ceiling;
        }

        let accel = (current.velocity() - prev.velocity()).norm() / dt;
        if !accel.is_finite() {
            return self.ceiling;
        }
        relative_excess(accel, self.max_accel)
    }
}
