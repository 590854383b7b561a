//! Belief engines.
//!
//! Each engine turns raw sensor input into its own [`BeliefState`] and never
//! reads another engine's output. An engine with nothing to say this cycle
//! returns `None` and simply sits the cycle out.

use nalgebra::DVector;
use serde::Serialize;
use serde_json::Value;

use crate::state::BeliefState;

pub mod dead_reckoning;
pub mod frame;
pub mod gps;
pub mod ins;
pub mod magnetic;

pub use dead_reckoning::DeadReckoningBelief;
pub use frame::{AirData, GpsFix, ImuSample, MagneticFix, SensorFrame};
pub use gps::GpsBelief;
pub use ins::InsBelief;
pub use magnetic::MagneticBelief;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeliefUpdate {
    pub state: BeliefState,
    /// Residual between the engine's prediction and its new measurement.
    pub innovation_norm: Option<f64>,
}

/// An independent navigation source.
pub trait BeliefEngine {
    /// Unique belief id reported in decisions.
    fn id(&self) -> &str;
    /// Consume one frame; `None` when this engine has nothing to report.
    fn update(&mut self, frame: &SensorFrame) -> Option<BeliefUpdate>;
    /// Drop all internal state so the next frame starts fresh.
    fn reset(&mut self);
}

#[derive(Debug, Clone)]
pub enum Belief {
    Gps(GpsBelief),
    Ins(InsBelief),
    DeadReckoning(DeadReckoningBelief),
    Magnetic(MagneticBelief),
}

impl Belief {
    /// GPS, INS, dead-reckoning and magnetic engines with default tuning.
    pub fn standard_set() -> Vec<Belief> {
        vec![
            Belief::Gps(GpsBelief::default()),
            Belief::Ins(InsBelief::default()),
            Belief::DeadReckoning(DeadReckoningBelief::default()),
            Belief::Magnetic(MagneticBelief::default()),
        ]
    }

    fn engine(&self) -> &dyn BeliefEngine {
        match self {
            Belief::Gps(e) => e,
            Belief::Ins(e) => e,
            Belief::DeadReckoning(e) => e,
            Belief::Magnetic(e) => e,
        }
    }

    fn engine_mut(&mut self) -> &mut dyn BeliefEngine {
        match self {
            Belief::Gps(e) => e,
            Belief::Ins(e) => e,
            Belief::DeadReckoning(e) => e,
            Belief::Magnetic(e) => e,
        }
    }
}

impl BeliefEngine for Belief {
    fn id(&self) -> &str {
        self.engine().id()
    }

    fn update(&mut self, frame: &SensorFrame) -> Option<BeliefUpdate> {
        self.engine_mut().update(frame)
    }

    fn reset(&mut self) {
        self.engine_mut().reset()
    }
}

/// Finite-difference velocity from successive position fixes.
#[derive(Debug, Clone, Default)]
pub(crate) struct FixDifferencer {
    last: Option<(DVector<f64>, DVector<f64>, f64)>,
}

impl FixDifferencer {
    /// Returns the velocity implied by `position` and, when a previous fix
    /// exists, the distance between `position` and the constant-velocity
    /// prediction.
    pub fn observe(&mut self, position: &DVector<f64>, t: f64) -> (DVector<f64>, Option<f64>) {
        let dim = position.len();
        let (velocity, innovation) = match &self.last {
            Some((p, v, t_prev)) if p.len() == dim && t > *t_prev => {
                let dt = t - t_prev;
                let predicted = p + v * dt;
                ((position - p) / dt, Some((position - predicted).norm()))
            }
            Some((p, v, _)) if p.len() == dim => (v.clone(), None),
            _ => (DVector::zeros(dim), None),
        };
        self.last = Some((position.clone(), velocity.clone(), t));
        (velocity, innovation)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

pub(crate) fn vector_value(v: &DVector<f64>) -> Value {
    Value::from(v.iter().copied().collect::<Vec<f64>>())
}
