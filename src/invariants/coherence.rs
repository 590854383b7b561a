use crate::config::ArbiterConfig;
use crate::invariants::InvariantCheck;
use crate::math::position_trace;
use crate::state::{BeliefHistory, BeliefState};

/// Flags a belief whose position disagrees with a peer by more than their
/// combined stated uncertainty allows. The worst peer wins.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossBeliefCoherence {
    pub k: f64,
    pub ceiling: f64,
}

impl CrossBeliefCoherence {
    pub fn from_config(cfg: &ArbiterConfig) -> Self {
        Self {
            k: cfg.coherence_k,
            ceiling: cfg.penalty_ceiling,
        }
    }

    fn pair_penalty(&self, belief: &BeliefState, other: &BeliefState) -> f64 {
        let delta = (belief.position() - other.position()).norm();
        let combined = position_trace(belief.covariance(), belief.dim())
            + position_trace(other.covariance(), other.dim());

        if combined <= 0.0 {
            return if delta > 0.0 { self.ceiling } else { 0.0 };
        }
        if delta > self.k * combined.sqrt() {
            delta / combined
        } else {
            0.0
        }
    }
}

impl InvariantCheck for CrossBeliefCoherence {
    fn name(&self) -> &'static str {
        "cross_belief_coherence"
    }

    fn evaluate(&self, current: &BeliefState, _history: &BeliefHistory, peers: &[&BeliefState]) -> f64 {
        peers
            .iter()
            .filter(|p| p.belief_id() != current.belief_id())
            .filter(|p| p.dim() == current.dim() && p.is_finite())
            .map(|p| self.pair_penalty(current, p))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::fixtures::state;
    use approx::assert_relative_eq;

    fn invariant() -> CrossBeliefCoherence {
        CrossBeliefCoherence::from_config(&ArbiterConfig::default())
    }

    #[test]
    fn no_peers_scores_zero() {
        let cur = state("gps", &[0.0, 0.0], &[0.0, 0.0], 0.9, 0.0);
        assert_eq!(invariant().evaluate(&cur, &BeliefHistory::new(1), &[]), 0.0);
    }

    #[test]
    fn agreeing_peers_score_zero() {
        let cur = state("gps", &[10.0, 20.0], &[0.0, 0.0], 0.9, 0.0);
        let ins = state("ins", &[10.1, 20.1], &[0.0, 0.0], 0.8, 0.0);
        assert_eq!(invariant().evaluate(&cur, &BeliefHistory::new(1), &[&ins]), 0.0);
    }

    #[test]
    fn disagreement_beyond_gate_is_penalised() {
        // combined trace = 4 + 4 = 8, gate = 3 * sqrt(8) ~ 8.49
        let cur = state("gps", &[40.0, 0.0], &[0.0, 0.0], 0.9, 0.0);
        let ins = state("ins", &[0.0, 0.0], &[0.0, 0.0], 0.8, 0.0);
        let mag = state("magnetic", &[38.0, 0.0], &[0.0, 0.0], 0.7, 0.0);
        let penalty = invariant().evaluate(&cur, &BeliefHistory::new(1), &[&ins, &mag]);
        assert_relative_eq!(penalty, 40.0 / 8.0, epsilon = 1e-12);
    }

    #[test]
    fn non_finite_peer_is_ignored() {
        let cur = state("gps", &[0.0, 0.0], &[0.0, 0.0], 0.9, 0.0);
        let broken = state("ins", &[f64::NAN, 0.0], &[0.0, 0.0], 0.8, 0.0);
        assert_eq!(invariant().evaluate(&cur, &BeliefHistory::new(1), &[&broken]), 0.0);
    }
}
