//! Trust arbitration.
//!
//! Each candidate belief gets `trust = confidence / (1 + lambda * penalty)`.
//! The highest trust wins (ties go to the lexicographically lowest id); a
//! winner below `trust_min` is still reported but flagged NAV_UNSAFE.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ArbiterConfig;
use crate::scoring::{PenaltyCombination, ScoreTable};
use crate::state::BeliefState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonCode {
    #[serde(rename = "no beliefs available")]
    NoBeliefsAvailable,
    #[serde(rename = "trust below minimum")]
    TrustBelowMinimum,
    #[serde(rename = "innovation exceeded")]
    InnovationExceeded,
    #[serde(rename = "arbitration successful")]
    ArbitrationSuccessful,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::NoBeliefsAvailable => "no beliefs available",
            ReasonCode::TrustBelowMinimum => "trust below minimum",
            ReasonCode::InnovationExceeded => "innovation exceeded",
            ReasonCode::ArbitrationSuccessful => "arbitration successful",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a belief took part in a cycle's arbitration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BeliefStatus {
    Trusted,
    /// Competed, but some expected invariant scores were absent and counted
    /// as zero penalty.
    Degraded { missing: Vec<String> },
    /// Non-finite numeric content; not a candidate.
    Excluded,
    /// Selected, then refused by the innovation gate.
    Masked { innovation_norm: f64 },
}

/// The per-cycle output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationDecision {
    /// Winning belief. Reported for audit even when `nav_unsafe` is set.
    pub selected: Option<String>,
    pub trust: BTreeMap<String, f64>,
    /// Trust of the selected belief.
    pub confidence: Option<f64>,
    pub nav_unsafe: bool,
    pub reason: ReasonCode,
    pub statuses: BTreeMap<String, BeliefStatus>,
}

impl ArbitrationDecision {
    /// The selection, only when it is valid for downstream use.
    pub fn usable_selection(&self) -> Option<&str> {
        if self.nav_unsafe {
            None
        } else {
            self.selected.as_deref()
        }
    }
}

/// Trust of a belief with confidence `confidence` and total penalty `penalty`.
pub fn trust(confidence: f64, penalty: f64, lambda: f64) -> f64 {
    confidence / (1.0 + lambda * penalty)
}

#[derive(Debug, Clone)]
pub struct TrustArbiter {
    lambda: f64,
    trust_min: f64,
    ceiling: f64,
    combination: PenaltyCombination,
    expected: Vec<String>,
}

impl TrustArbiter {
    pub fn new(cfg: &ArbiterConfig) -> Self {
        Self {
            lambda: cfg.lambda,
            trust_min: cfg.trust_min,
            ceiling: cfg.penalty_ceiling,
            combination: cfg.penalty_combination.clone(),
            expected: Vec::new(),
        }
    }

    /// Invariants every candidate should have been scored on. Beliefs missing
    /// any of them are marked degraded.
    pub fn with_expected_invariants(mut self, names: Vec<String>) -> Self {
        self.expected = names;
        self
    }

    pub fn arbitrate(&self, beliefs: &[BeliefState], scores: &ScoreTable) -> ArbitrationDecision {
        let mut trust_map = BTreeMap::new();
        let mut statuses = BTreeMap::new();
        let mut seen = BTreeSet::new();

        for belief in beliefs {
            let id = belief.belief_id();
            if !seen.insert(id) {
                warn!(belief = id, "duplicate belief id in cycle, keeping first");
                continue;
            }
            if !belief.is_finite() {
                warn!(belief = id, "excluding belief with non-finite state");
                statuses.insert(id.to_string(), BeliefStatus::Excluded);
                continue;
            }

            let score = scores.get(id);
            let missing: Vec<String> = match score {
                None => self.expected.clone(),
                Some(s) => self.expected.iter().filter(|n| !s.contains(n)).cloned().collect(),
            };
            let penalty = score
                .map(|s| s.sanitized_total(&self.combination, self.ceiling))
                .unwrap_or(0.0);

            let t = trust(belief.internal_confidence(), penalty, self.lambda);
            debug!(belief = id, penalty, trust = t, "computed trust");
            trust_map.insert(id.to_string(), t);

            let status = if score.is_none() || !missing.is_empty() {
                debug!(belief = id, ?missing, "belief scored with missing invariants");
                BeliefStatus::Degraded { missing }
            } else {
                BeliefStatus::Trusted
            };
            statuses.insert(id.to_string(), status);
        }

        // BTreeMap iterates ids in ascending order, so a strict comparison
        // keeps the lowest id on ties.
        let mut best: Option<(&String, f64)> = None;
        for (id, &t) in &trust_map {
            if best.map_or(true, |(_, b)| t > b) {
                best = Some((id, t));
            }
        }

        let Some((best_id, best_trust)) = best.map(|(id, t)| (id.clone(), t)) else {
            warn!("no beliefs available, refusing navigation");
            return ArbitrationDecision {
                selected: None,
                trust: trust_map,
                confidence: None,
                nav_unsafe: true,
                reason: ReasonCode::NoBeliefsAvailable,
                statuses,
            };
        };

        let (nav_unsafe, reason) = if best_trust < self.trust_min {
            warn!(
                belief = %best_id,
                trust = best_trust,
                trust_min = self.trust_min,
                "winning trust below minimum, refusing navigation"
            );
            (true, ReasonCode::TrustBelowMinimum)
        } else {
            info!(belief = %best_id, trust = best_trust, "arbitration selected belief");
            (false, ReasonCode::ArbitrationSuccessful)
        };

        ArbitrationDecision {
            selected: Some(best_id),
            trust: trust_map,
            confidence: Some(best_trust),
            nav_unsafe,
            reason,
            statuses,
        }
    }
}

/// Arbitrate with `cfg` and no expected-invariant list.
pub fn arbitrate(beliefs: &[BeliefState], scores: &ScoreTable, cfg: &ArbiterConfig) -> ArbitrationDecision {
    TrustArbiter::new(cfg).arbitrate(beliefs, scores)
}
