use nalgebra::{DMatrix, DVector};
use tracing::warn;

use crate::beliefs::{vector_value, BeliefEngine, BeliefUpdate, FixDifferencer, SensorFrame};
use crate::state::{BeliefState, Metadata};

/// Magnetic-anomaly map matching. Carries the measured and map fields as
/// metadata so the Earth-field invariant can check them.
#[derive(Debug, Clone)]
pub struct MagneticBelief {
    id: String,
    pub base_confidence: f64,
    /// Position variance of a map match [m^2]
    pub match_variance: f64,
    differencer: FixDifferencer,
}

impl Default for MagneticBelief {
    fn default() -> Self {
        Self::new("magnetic")
    }
}

impl MagneticBelief {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_confidence: 0.7,
            match_variance: 9.0,
            differencer: FixDifferencer::default(),
        }
    }
}

impl BeliefEngine for MagneticBelief {
    fn id(&self) -> &str {
        &self.id
    }

    fn update(&mut self, frame: &SensorFrame) -> Option<BeliefUpdate> {
        let fix = frame.magnetic.as_ref()?;
        let position = DVector::from_vec(fix.position.clone());
        let (velocity, innovation_norm) = self.differencer.observe(&position, frame.timestamp);
        let dim = position.len();

        let mut metadata = Metadata::new();
        metadata.insert("mag_vector".into(), vector_value(&DVector::from_vec(fix.field.clone())));
        if let Some(expected) = &fix.expected_field {
            metadata.insert(
                "expected_mag_vector".into(),
                vector_value(&DVector::from_vec(expected.clone())),
            );
        }
        metadata.insert("match_quality".into(), fix.match_quality.into());

        let quality = if fix.match_quality.is_finite() {
            fix.match_quality.clamp(0.0, 1.0)
        } else {
            0.0
        };

        match BeliefState::new(
            self.id.clone(),
            position,
            velocity,
            DMatrix::identity(dim, dim) * self.match_variance,
            self.base_confidence * quality,
            frame.timestamp,
        ) {
            Ok(state) => Some(BeliefUpdate {
                state: state.with_metadata(metadata),
                innovation_norm,
            }),
            Err(err) => {
                warn!(belief = %self.id, %err, "magnetic fix rejected");
                None
            }
        }
    }

    fn reset(&mut self) {
        self.differencer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beliefs::MagneticFix;
    use approx::assert_relative_eq;

    fn frame(quality: f64) -> SensorFrame {
        SensorFrame {
            timestamp: 1.0,
            magnetic: Some(MagneticFix {
                position: vec![5.0, 5.0],
                field: vec![20_000.0, 0.0, 45_000.0],
                expected_field: Some(vec![20_100.0, 0.0, 44_900.0]),
                match_quality: quality,
            }),
            ..SensorFrame::default()
        }
    }

    #[test]
    fn exposes_fields_for_earth_field_check() {
        let mut mag = MagneticBelief::default();
        let update = mag.update(&frame(1.0)).unwrap();
        assert_eq!(update.state.metadata_vector("mag_vector").unwrap().len(), 3);
        assert!(update.state.metadata_vector("expected_mag_vector").is_some());
        assert_relative_eq!(update.state.internal_confidence(), 0.7);
    }

    #[test]
    fn match_quality_scales_confidence() {
        let mut mag = MagneticBelief::default();
        assert_relative_eq!(mag.update(&frame(0.5)).unwrap().state.internal_confidence(), 0.35);
        assert_eq!(mag.update(&frame(3.0)).unwrap().state.internal_confidence(), 0.7);
        assert_eq!(mag.update(&frame(f64::NAN)).unwrap().state.internal_confidence(), 0.0);
    }
}
