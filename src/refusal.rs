//! Innovation-based refusal and the per-cycle state machine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::arbitration::{ArbitrationDecision, BeliefStatus, ReasonCode};
use crate::error::{MbnaError, Result};

/// True iff `innovation_norm` strictly exceeds `threshold`. A NaN
/// innovation carries no evidence and never refuses.
pub fn should_refuse(innovation_norm: f64, threshold: f64) -> bool {
    innovation_norm > threshold
}

impl ArbitrationDecision {
    /// Apply innovation masking to an accepted selection. The selected belief
    /// is masked and the cycle escalated to NAV_UNSAFE when its innovation
    /// fails [`should_refuse`]. Refused decisions pass through unchanged.
    pub fn with_innovation_gate(mut self, innovations: &BTreeMap<String, f64>, threshold: f64) -> Self {
        if self.nav_unsafe {
            return self;
        }
        let Some(id) = self.selected.clone() else {
            return self;
        };
        let Some(&innovation_norm) = innovations.get(&id) else {
            return self;
        };

        if should_refuse(innovation_norm, threshold) {
            warn!(
                belief = %id,
                innovation_norm,
                threshold,
                "innovation gate refused selected belief"
            );
            self.nav_unsafe = true;
            self.reason = ReasonCode::InnovationExceeded;
            self.statuses
                .insert(id, BeliefStatus::Masked { innovation_norm });
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CyclePhase {
    Collecting,
    Scored,
    Arbitrated,
    Accepted,
    Refused,
}

/// One cycle's progress through
/// `Collecting -> Scored -> Arbitrated -> {Accepted | Refused}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleState {
    phase: CyclePhase,
}

impl Default for CycleState {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleState {
    pub fn new() -> Self {
        Self {
            phase: CyclePhase::Collecting,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, CyclePhase::Accepted | CyclePhase::Refused)
    }

    fn advance(&mut self, to: CyclePhase) -> Result<CyclePhase> {
        use CyclePhase::*;
        let allowed = matches!(
            (self.phase, to),
            (Collecting, Scored) | (Scored, Arbitrated) | (Arbitrated, Accepted) | (Arbitrated, Refused)
        );
        if !allowed {
            return Err(MbnaError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(to)
    }

    pub fn scored(&mut self) -> Result<CyclePhase> {
        self.advance(CyclePhase::Scored)
    }

    pub fn arbitrated(&mut self) -> Result<CyclePhase> {
        self.advance(CyclePhase::Arbitrated)
    }

    /// Final transition, chosen by the decision's `nav_unsafe` flag.
    pub fn resolve(&mut self, decision: &ArbitrationDecision) -> Result<CyclePhase> {
        if decision.nav_unsafe {
            self.advance(CyclePhase::Refused)
        } else {
            self.advance(CyclePhase::Accepted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(selected: &str) -> ArbitrationDecision {
        let mut trust = BTreeMap::new();
        trust.insert(selected.to_string(), 0.9);
        let mut statuses = BTreeMap::new();
        statuses.insert(selected.to_string(), BeliefStatus::Trusted);
        ArbitrationDecision {
            selected: Some(selected.to_string()),
            trust,
            confidence: Some(0.9),
            nav_unsafe: false,
            reason: ReasonCode::ArbitrationSuccessful,
            statuses,
        }
    }

    #[test]
    fn refusal_threshold_is_strict() {
        assert!(!should_refuse(15.0, 20.0));
        assert!(should_refuse(25.0, 20.0));
        assert!(!should_refuse(20.0, 20.0));
        assert!(!should_refuse(0.0, 20.0));
        assert!(!should_refuse(-5.0, 20.0));
        assert!(should_refuse(f64::INFINITY, 20.0));
        assert!(!should_refuse(f64::NAN, 20.0));
    }

    #[test]
    fn gate_masks_selected_belief() {
        let mut innovations = BTreeMap::new();
        innovations.insert("gps".to_string(), 35.0);
        let decision = accepted("gps").with_innovation_gate(&innovations, 20.0);
        assert!(decision.nav_unsafe);
        assert_eq!(decision.reason, ReasonCode::InnovationExceeded);
        assert_eq!(decision.selected.as_deref(), Some("gps"));
        assert_eq!(
            decision.statuses["gps"],
            BeliefStatus::Masked {
                innovation_norm: 35.0
            }
        );
    }

    #[test]
    fn gate_ignores_other_beliefs_and_missing_innovation() {
        let mut innovations = BTreeMap::new();
        innovations.insert("ins".to_string(), 100.0);
        let decision = accepted("gps").with_innovation_gate(&innovations, 20.0);
        assert!(!decision.nav_unsafe);

        let decision = accepted("gps").with_innovation_gate(&BTreeMap::new(), 20.0);
        assert_eq!(decision.reason, ReasonCode::ArbitrationSuccessful);
    }

    #[test]
    fn gate_leaves_refused_decisions_alone() {
        let mut refused = accepted("gps");
        refused.nav_unsafe = true;
        refused.reason = ReasonCode::TrustBelowMinimum;
        let mut innovations = BTreeMap::new();
        innovations.insert("gps".to_string(), 100.0);
        let out = refused.clone().with_innovation_gate(&innovations, 20.0);
        assert_eq!(out, refused);
    }

    #[test]
    fn cycle_follows_happy_path() {
        let mut cycle = CycleState::new();
        assert_eq!(cycle.phase(), CyclePhase::Collecting);
        cycle.scored().unwrap();
        cycle.arbitrated().unwrap();
        assert_eq!(cycle.resolve(&accepted("gps")).unwrap(), CyclePhase::Accepted);
        assert!(cycle.is_terminal());
    }

    #[test]
    fn cycle_rejects_skipped_phase() {
        let mut cycle = CycleState::new();
        let err = cycle.arbitrated().unwrap_err();
        assert!(matches!(
            err,
            MbnaError::InvalidTransition {
                from: CyclePhase::Collecting,
                to: CyclePhase::Arbitrated
            }
        ));
    }

    #[test]
    fn terminal_phase_cannot_advance() {
        let mut cycle = CycleState::new();
        cycle.scored().unwrap();
        cycle.arbitrated().unwrap();
        let mut refused = accepted("gps");
        refused.nav_unsafe = true;
        assert_eq!(cycle.resolve(&refused).unwrap(), CyclePhase::Refused);
        assert!(cycle.scored().is_err());
    }
}
