use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::beliefs::{vector_value, BeliefEngine, BeliefUpdate, SensorFrame};
use crate::state::{BeliefState, Metadata};

/// Inertial belief: integrates navigation-frame acceleration. Seeded from
/// the GPS fix present on its first frame (origin otherwise); confidence
/// decays and covariance grows with time since seeding.
#[derive(Debug, Clone)]
pub struct InsBelief {
    id: String,
    pub base_confidence: f64,
    /// Confidence decay time constant [s]
    pub drift_tau_s: f64,
    /// Random-walk growth of position variance [m^2/s^2]
    pub accel_noise: f64,
    position: Option<DVector<f64>>,
    velocity: Option<DVector<f64>>,
    t_init: f64,
    t_last: f64,
}

impl Default for InsBelief {
    fn default() -> Self {
        Self::new("ins")
    }
}

impl InsBelief {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_confidence: 0.85,
            drift_tau_s: 300.0,
            accel_noise: 0.05,
            position: None,
            velocity: None,
            t_init: 0.0,
            t_last: 0.0,
        }
    }

    fn seed(&mut self, frame: &SensorFrame, dim: usize) {
        let position = frame
            .gps
            .as_ref()
            .filter(|fix| fix.position.len() == dim)
            .map(|fix| DVector::from_vec(fix.position.clone()))
            .unwrap_or_else(|| DVector::zeros(dim));
        debug!(belief = %self.id, ?position, "seeding inertial belief");
        self.position = Some(position);
        self.velocity = Some(DVector::zeros(dim));
        self.t_init = frame.timestamp;
        self.t_last = frame.timestamp;
    }
}

impl BeliefEngine for InsBelief {
    fn id(&self) -> &str {
        &self.id
    }

    fn update(&mut self, frame: &SensorFrame) -> Option<BeliefUpdate> {
        let imu = frame.imu.as_ref()?;
        let accel = DVector::from_vec(imu.accel.clone());
        let dim = accel.len();

        let seeded = match (&self.position, &self.velocity) {
            (Some(p), Some(_)) if p.len() == dim => true,
            (Some(p), _) => {
                warn!(belief = %self.id, expected = p.len(), got = dim, "imu dimension changed");
                return None;
            }
            _ => false,
        };
        if !seeded {
            self.seed(frame, dim);
        }

        let dt = frame.timestamp - self.t_last;
        if let (Some(p), Some(v)) = (self.position.as_mut(), self.velocity.as_mut()) {
            if dt > 0.0 {
                *v += &accel * dt;
                *p += &*v * dt;
            }
        }
        self.t_last = frame.timestamp.max(self.t_last);

        let elapsed = (frame.timestamp - self.t_init).max(0.0);
        let confidence = self.base_confidence * (-elapsed / self.drift_tau_s).exp();
        let variance = 1.0 + self.accel_noise * elapsed * elapsed;

        let mut metadata = Metadata::new();
        metadata.insert("accel".into(), vector_value(&accel));
        metadata.insert("elapsed_s".into(), elapsed.into());

        let state = BeliefState::new(
            self.id.clone(),
            self.position.clone()?,
            self.velocity.clone()?,
            DMatrix::identity(2 * dim, 2 * dim) * variance,
            confidence,
            frame.timestamp,
        );
        match state {
            Ok(state) => Some(BeliefUpdate {
                state: state.with_metadata(metadata),
                innovation_norm: None,
            }),
            Err(err) => {
                warn!(belief = %self.id, %err, "inertial state rejected");
                None
            }
        }
    }

    fn reset(&mut self) {
        self.position = None;
        self.velocity = None;
    }
}
