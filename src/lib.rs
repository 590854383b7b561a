//! MBNA - Multi-Belief Navigation Arbiter
//!
//! Several independent navigation engines (GPS, inertial, dead reckoning,
//! magnetic map matching) each publish a belief state every cycle. Each
//! belief is scored against physical and statistical plausibility
//! invariants, converted to a trust value, and the most trusted belief is
//! selected. When no belief is trustworthy the cycle is refused and flagged
//! NAV_UNSAFE rather than emitting a guess.

pub mod arbitration;
pub mod beliefs;
pub mod config;
pub mod error;
pub mod invariants;
pub mod math;
pub mod pipeline;
pub mod refusal;
pub mod scoring;
pub mod state;

// Re-export main types
pub use arbitration::{arbitrate, trust, ArbitrationDecision, BeliefStatus, ReasonCode, TrustArbiter};
pub use beliefs::{Belief, BeliefEngine, BeliefUpdate, SensorFrame};
pub use config::ArbiterConfig;
pub use error::{MbnaError, Result};
pub use invariants::{Invariant, InvariantCheck};
pub use pipeline::{CycleReport, Pipeline};
pub use refusal::{should_refuse, CyclePhase, CycleState};
pub use scoring::{InvariantScore, InvariantScorer, PenaltyCombination, ScoreTable};
pub use state::{BeliefHistory, BeliefState, Metadata};
