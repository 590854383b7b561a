//! Plausibility invariants.
//!
//! Every invariant is a pure scoring function over the current state, the
//! belief's own history and the other beliefs of the same cycle. It returns a
//! penalty in `[0, +inf)`, zero meaning full compliance. New kinds are added as
//! new [`Invariant`] variants.

use crate::config::ArbiterConfig;
use crate::state::{BeliefHistory, BeliefState};

pub mod coherence;
pub mod covariance;
pub mod earth_field;
pub mod physics;
pub mod temporal;

pub use coherence::CrossBeliefCoherence;
pub use covariance::CovarianceHonesty;
pub use earth_field::EarthFieldConsistency;
pub use physics::PhysicsFeasibility;
pub use temporal::TemporalSmoothness;

/// A plausibility check producing a non-negative penalty.
pub trait InvariantCheck {
    /// Stable name used as the score key.
    fn name(&self) -> &'static str;
    /// Penalty for `current` given its own history and this cycle's peers.
    fn evaluate(&self, current: &BeliefState, history: &BeliefHistory, peers: &[&BeliefState]) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Invariant {
    TemporalSmoothness(TemporalSmoothness),
    PhysicsFeasibility(PhysicsFeasibility),
    CrossBeliefCoherence(CrossBeliefCoherence),
    CovarianceHonesty(CovarianceHonesty),
    EarthField(EarthFieldConsistency),
}

impl Invariant {
    /// The five standard invariants, parameterised from `cfg`.
    pub fn standard_set(cfg: &ArbiterConfig) -> Vec<Invariant> {
        vec![
            Invariant::TemporalSmoothness(TemporalSmoothness::from_config(cfg)),
            Invariant::PhysicsFeasibility(PhysicsFeasibility::from_config(cfg)),
            Invariant::CrossBeliefCoherence(CrossBeliefCoherence::from_config(cfg)),
            Invariant::CovarianceHonesty(CovarianceHonesty::from_config(cfg)),
            Invariant::EarthField(EarthFieldConsistency::from_config(cfg)),
        ]
    }

    fn check(&self) -> &dyn InvariantCheck {
        match self {
            Invariant::TemporalSmoothness(inv) => inv,
            Invariant::PhysicsFeasibility(inv) => inv,
            Invariant::CrossBeliefCoherence(inv) => inv,
            Invariant::CovarianceHonesty(inv) => inv,
            Invariant::EarthField(inv) => inv,
        }
    }
}

impl InvariantCheck for Invariant {
    fn name(&self) -> &'static str {
        self.check().name()
    }

    fn evaluate(&self, current: &BeliefState, history: &BeliefHistory, peers: &[&BeliefState]) -> f64 {
        self.check().evaluate(current, history, peers)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use nalgebra::{DMatrix, DVector};

    use crate::state::BeliefState;

    pub fn state(id: &str, pos: &[f64], vel: &[f64], conf: f64, t: f64) -> BeliefState {
        BeliefState::new(
            id,
            DVector::from_row_slice(pos),
            DVector::from_row_slice(vel),
            DMatrix::identity(pos.len(), pos.len()) * 2.0,
            conf,
            t,
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_set_names_are_unique() {
        let set = Invariant::standard_set(&ArbiterConfig::default());
        let mut names: Vec<_> = set.iter().map(|i| i.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"temporal_smoothness"));
        assert!(names.contains(&"earth_field_structure"));
    }
}
