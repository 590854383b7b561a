use nalgebra::{DMatrix, DVector};
use tracing::warn;

use crate::beliefs::{BeliefEngine, BeliefUpdate, SensorFrame};
use crate::state::BeliefState;

/// Air-data dead reckoning: integrates the velocity estimate from the origin.
#[derive(Debug, Clone)]
pub struct DeadReckoningBelief {
    id: String,
    pub base_confidence: f64,
    /// Position variance growth [m^2/s]
    pub variance_rate: f64,
    position: Option<DVector<f64>>,
    t_init: f64,
    t_last: f64,
}

impl Default for DeadReckoningBelief {
    fn default() -> Self {
        Self::new("dead_reckoning")
    }
}

impl DeadReckoningBelief {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_confidence: 0.5,
            variance_rate: 4.0,
            position: None,
            t_init: 0.0,
            t_last: 0.0,
        }
    }
}

impl BeliefEngine for DeadReckoningBelief {
    fn id(&self) -> &str {
        &self.id
    }

    fn update(&mut self, frame: &SensorFrame) -> Option<BeliefUpdate> {
        let air = frame.air_data.as_ref()?;
        let velocity = DVector::from_vec(air.velocity.clone());
        let dim = velocity.len();

        match self.position.as_mut() {
            Some(p) if p.len() == dim => {
                let dt = frame.timestamp - self.t_last;
                if dt > 0.0 {
                    *p += &velocity * dt;
                }
            }
            Some(p) => {
                warn!(belief = %self.id, expected = p.len(), got = dim, "air data dimension changed");
                return None;
            }
            None => {
                self.position = Some(DVector::zeros(dim));
                self.t_init = frame.timestamp;
                self.t_last = frame.timestamp;
            }
        }
        self.t_last = frame.timestamp.max(self.t_last);

        let elapsed = (frame.timestamp - self.t_init).max(0.0);
        let variance = 1.0 + self.variance_rate * elapsed;

        match BeliefState::new(
            self.id.clone(),
            self.position.clone()?,
            velocity,
            DMatrix::identity(dim, dim) * variance,
            self.base_confidence,
            frame.timestamp,
        ) {
            Ok(state) => Some(BeliefUpdate {
                state,
                innovation_norm: None,
            }),
            Err(err) => {
                warn!(belief = %self.id, %err, "dead-reckoning state rejected");
                None
            }
        }
    }

    fn reset(&mut self) {
        self.position = None;
        self.t_init = 0.0;
        self.t_last = 0.0;
    }
}
