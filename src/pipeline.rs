//! Per-cycle orchestration: engines -> invariant scoring -> trust
//! arbitration -> innovation gate.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::arbitration::{ArbitrationDecision, TrustArbiter};
use crate::beliefs::{Belief, BeliefEngine, SensorFrame};
use crate::config::ArbiterConfig;
use crate::error::{MbnaError, Result};
use crate::invariants::Invariant;
use crate::refusal::{CyclePhase, CycleState};
use crate::scoring::{InvariantScorer, ScoreTable};
use crate::state::{BeliefHistory, BeliefState};

/// Everything one cycle produced, for logging and replay audit.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub timestamp: f64,
    pub decision: ArbitrationDecision,
    pub phase: CyclePhase,
    pub beliefs: Vec<BeliefState>,
    pub scores: ScoreTable,
    pub innovations: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ArbiterConfig,
    engines: Vec<Belief>,
    scorer: InvariantScorer,
    arbiter: TrustArbiter,
    histories: BTreeMap<String, BeliefHistory>,
    cycles: u64,
}

impl Pipeline {
    /// Empty pipeline: no engines, no invariants.
    pub fn new(config: ArbiterConfig) -> Result<Self> {
        config.validate()?;
        let scorer = InvariantScorer::new(Vec::new(), config.penalty_ceiling);
        let arbiter = TrustArbiter::new(&config);
        Ok(Self {
            config,
            engines: Vec::new(),
            scorer,
            arbiter,
            histories: BTreeMap::new(),
            cycles: 0,
        })
    }

    /// The four standard engines and the five standard invariants.
    pub fn standard(config: ArbiterConfig) -> Result<Self> {
        let mut pipeline = Self::new(config)?;
        for invariant in Invariant::standard_set(&pipeline.config) {
            pipeline.add_invariant(invariant);
        }
        for engine in Belief::standard_set() {
            pipeline.add_engine(engine)?;
        }
        Ok(pipeline)
    }

    pub fn with_engine(mut self, engine: Belief) -> Result<Self> {
        self.add_engine(engine)?;
        Ok(self)
    }

    /// Register an engine; its id must be unique in this pipeline.
    pub fn add_engine(&mut self, engine: Belief) -> Result<()> {
        if self.engines.iter().any(|e| e.id() == engine.id()) {
            return Err(MbnaError::DuplicateEngine(engine.id().to_string()));
        }
        debug!(belief = engine.id(), "registered belief engine");
        self.engines.push(engine);
        Ok(())
    }

    pub fn with_invariant(mut self, invariant: Invariant) -> Self {
        self.add_invariant(invariant);
        self
    }

    /// Register an invariant; every belief is then expected to carry its score.
    pub fn add_invariant(&mut self, invariant: Invariant) {
        self.scorer.add_invariant(invariant);
        self.arbiter = TrustArbiter::new(&self.config).with_expected_invariants(self.scorer.invariant_names());
    }

    /// Run-wide configuration.
    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    /// Ids of registered engines, in registration order.
    pub fn engine_ids(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.id()).collect()
    }

    /// Finite past states of `belief_id`, if it has produced any.
    pub fn history(&self, belief_id: &str) -> Option<&BeliefHistory> {
        self.histories.get(belief_id)
    }

    /// Cycles processed since construction or the last reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one arbitration cycle over `frame`.
    pub fn process(&mut self, frame: &SensorFrame) -> Result<CycleReport> {
        self.cycles += 1;
        let mut cycle = CycleState::new();

        let mut beliefs = Vec::with_capacity(self.engines.len());
        let mut innovations = BTreeMap::new();
        for engine in &mut self.engines {
            match engine.update(frame) {
                Some(update) => {
                    if let Some(norm) = update.innovation_norm {
                        innovations.insert(engine.id().to_string(), norm);
                    }
                    beliefs.push(update.state);
                }
                None => debug!(belief = engine.id(), "no estimate this cycle"),
            }
        }

        let scores = self.scorer.evaluate(&beliefs, &self.histories);
        cycle.scored()?;

        let decision = self
            .arbiter
            .arbitrate(&beliefs, &scores)
            .with_innovation_gate(&innovations, self.config.innovation_threshold);
        cycle.arbitrated()?;
        let phase = cycle.resolve(&decision)?;

        let capacity = self.config.history_len;
        for state in beliefs.iter().filter(|s| s.is_finite()) {
            self.histories
                .entry(state.belief_id().to_string())
                .or_insert_with(|| BeliefHistory::new(capacity))
                .push(state.clone());
        }

        info!(
            cycle = self.cycles,
            t = frame.timestamp,
            selected = decision.selected.as_deref().unwrap_or("-"),
            nav_unsafe = decision.nav_unsafe,
            reason = %decision.reason,
            "cycle complete"
        );

        Ok(CycleReport {
            cycle: self.cycles,
            timestamp: frame.timestamp,
            decision,
            phase,
            beliefs,
            scores,
            innovations,
        })
    }

    /// Forget all history and restart every engine.
    pub fn reset(&mut self) {
        self.histories.clear();
        for engine in &mut self.engines {
            engine.reset();
        }
        self.cycles = 0;
    }
}
