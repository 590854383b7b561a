//! Invariant scoring across all beliefs of a cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ArbiterConfig;
use crate::invariants::{Invariant, InvariantCheck};
use crate::state::{BeliefHistory, BeliefState};

/// How per-invariant penalties fold into one total per belief.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyCombination {
    #[default]
    Sum,
    Max,
    /// Weighted sum; invariants without an entry weigh 1.0.
    Weighted(BTreeMap<String, f64>),
}

impl PenaltyCombination {
    pub fn combine<'a>(&self, penalties: impl Iterator<Item = (&'a str, f64)>) -> f64 {
        match self {
            PenaltyCombination::Sum => penalties.map(|(_, p)| p).sum(),
            PenaltyCombination::Max => penalties.map(|(_, p)| p).fold(0.0, f64::max),
            PenaltyCombination::Weighted(weights) => penalties
                .map(|(name, p)| weights.get(name).copied().unwrap_or(1.0) * p)
                .sum(),
        }
    }
}

/// Penalty per invariant name for one belief in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvariantScore(BTreeMap<String, f64>);

impl InvariantScore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, invariant: impl Into<String>, penalty: f64) {
        self.0.insert(invariant.into(), penalty);
    }

    pub fn get(&self, invariant: &str) -> Option<f64> {
        self.0.get(invariant).copied()
    }

    pub fn contains(&self, invariant: &str) -> bool {
        self.0.contains_key(invariant)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self, combination: &PenaltyCombination) -> f64 {
        combination.combine(self.iter())
    }

    /// Total with every entry clamped by [`sanitize_penalty`] before the
    /// fold, so no single entry can cancel another.
    pub fn sanitized_total(&self, combination: &PenaltyCombination, ceiling: f64) -> f64 {
        let total = combination.combine(self.iter().map(|(name, p)| (name, sanitize_penalty(p, ceiling))));
        sanitize_penalty(total, ceiling)
    }
}

impl FromIterator<(String, f64)> for InvariantScore {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub type ScoreTable = BTreeMap<String, InvariantScore>;

/// Clamp a raw penalty into `[0, ceiling]`. Any non-finite value maps to the
/// ceiling so a broken check can only lower trust.
pub fn sanitize_penalty(raw: f64, ceiling: f64) -> f64 {
    if !raw.is_finite() {
        return ceiling;
    }
    raw.clamp(0.0, ceiling)
}

#[derive(Debug, Clone)]
pub struct InvariantScorer {
    invariants: Vec<Invariant>,
    ceiling: f64,
}

impl InvariantScorer {
    pub fn new(invariants: Vec<Invariant>, ceiling: f64) -> Self {
        Self { invariants, ceiling }
    }

    pub fn standard(cfg: &ArbiterConfig) -> Self {
        Self::new(Invariant::standard_set(cfg), cfg.penalty_ceiling)
    }

    pub fn add_invariant(&mut self, invariant: Invariant) {
        self.invariants.push(invariant);
    }

    pub fn invariant_names(&self) -> Vec<String> {
        self.invariants.iter().map(|i| i.name().to_string()).collect()
    }

    /// Score every finite belief against its own history and its finite
    /// peers. Non-finite beliefs get no entry; arbitration excludes them.
    pub fn evaluate(
        &self,
        beliefs: &[BeliefState],
        histories: &BTreeMap<String, BeliefHistory>,
    ) -> ScoreTable {
        let empty = BeliefHistory::new(1);
        let finite: Vec<&BeliefState> = beliefs.iter().filter(|b| b.is_finite()).collect();
        let mut table = ScoreTable::new();

        for belief in &finite {
            let history = histories.get(belief.belief_id()).unwrap_or(&empty);
            let peers: Vec<&BeliefState> = finite
                .iter()
                .copied()
                .filter(|p| p.belief_id() != belief.belief_id())
                .collect();

            let mut score = InvariantScore::new();
            for invariant in &self.invariants {
                let raw = invariant.evaluate(belief, history, &peers);
                let penalty = sanitize_penalty(raw, self.ceiling);
                if penalty != raw {
                    warn!(
                        belief = belief.belief_id(),
                        invariant = invariant.name(),
                        raw,
                        penalty,
                        "sanitized invariant penalty"
                    );
                }
                score.insert(invariant.name(), penalty);
            }
            debug!(belief = belief.belief_id(), ?score, "scored belief");
            table.insert(belief.belief_id().to_string(), score);
        }
        table
    }
}
