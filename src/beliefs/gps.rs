use nalgebra::{DMatrix, DVector};
use serde_json::Value;
use tracing::warn;

use crate::beliefs::{BeliefEngine, BeliefUpdate, FixDifferencer, SensorFrame};
use crate::state::{BeliefState, Metadata};

/// GPS-only belief: position straight from the fix, velocity by differencing.
#[derive(Debug, Clone)]
pub struct GpsBelief {
    id: String,
    /// 1-sigma position error at HDOP 1 [m]
    pub sigma_per_hdop: f64,
    pub base_confidence: f64,
    differencer: FixDifferencer,
}

impl Default for GpsBelief {
    fn default() -> Self {
        Self::new("gps")
    }
}

impl GpsBelief {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sigma_per_hdop: 2.5,
            base_confidence: 0.95,
            differencer: FixDifferencer::default(),
        }
    }
}

impl BeliefEngine for GpsBelief {
    fn id(&self) -> &str {
        &self.id
    }

    fn update(&mut self, frame: &SensorFrame) -> Option<BeliefUpdate> {
        let fix = frame.gps.as_ref()?;
        let position = DVector::from_vec(fix.position.clone());
        let (velocity, innovation_norm) = self.differencer.observe(&position, frame.timestamp);

        let hdop = if fix.hdop.is_finite() { fix.hdop.max(1.0) } else { f64::INFINITY };
        let sigma = self.sigma_per_hdop * hdop;
        let dim = position.len();
        let covariance = DMatrix::identity(dim, dim) * (sigma * sigma);

        let mut metadata = Metadata::new();
        metadata.insert("hdop".into(), Value::from(fix.hdop));
        if let Some(sats) = fix.satellites {
            metadata.insert("satellites".into(), Value::from(sats));
        }

        let state = BeliefState::new(
            self.id.clone(),
            position,
            velocity,
            covariance,
            self.base_confidence / hdop,
            frame.timestamp,
        );
        match state {
            Ok(state) => Some(BeliefUpdate {
                state: state.with_metadata(metadata),
                innovation_norm,
            }),
            Err(err) => {
                warn!(belief = %self.id, %err, "gps fix rejected");
                None
            }
        }
    }

    fn reset(&mut self) {
        self.differencer.reset();
    }
}
