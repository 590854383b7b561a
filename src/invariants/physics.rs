use crate::config::ArbiterConfig;
use crate::invariants::InvariantCheck;
use crate::math::relative_excess;
use crate::state::{BeliefHistory, BeliefState};

/// Speed and (when the belief reports one) acceleration limits on the
/// current state alone.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsFeasibility {
    pub max_airspeed: f64,
    pub max_accel: f64,
}

impl PhysicsFeasibility {
    pub fn from_config(cfg: &ArbiterConfig) -> Self {
        Self {
            max_airspeed: cfg.max_airspeed,
            max_accel: cfg.max_accel,
        }
    }
}

impl InvariantCheck for PhysicsFeasibility {
    fn name(&self) -> &'static str {
        "physics_feasibility"
    }

    fn evaluate(&self, current: &BeliefState, _history: &BeliefHistory, _peers: &[&BeliefState]) -> f64 {
        let speed = current.velocity().norm();
        let mut penalty = relative_excess(speed, self.max_airspeed);

        if let Some(accel) = current.metadata_vector("accel") {
            penalty += relative_excess(accel.norm(), self.max_accel);
        }
        penalty
    }
}
