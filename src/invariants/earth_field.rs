use nalgebra::DVector;

use crate::config::ArbiterConfig;
use crate::invariants::InvariantCheck;
use crate::math::angle_between;
use crate::state::{BeliefHistory, BeliefState};

/// Compares the magnetic field a belief measured (`mag_vector`) against the
/// field expected at its position (`expected_mag_vector`, falling back to the
/// configured reference field).
#[derive(Debug, Clone, PartialEq)]
pub struct EarthFieldConsistency {
    pub max_field_angle: f64,
    pub reference_field: Option<DVector<f64>>,
}

impl EarthFieldConsistency {
    pub fn from_config(cfg: &ArbiterConfig) -> Self {
        Self {
            max_field_angle: cfg.max_field_angle,
            reference_field: cfg.reference_field.clone().map(DVector::from_vec),
        }
    }
}

impl InvariantCheck for EarthFieldConsistency {
    fn name(&self) -> &'static str {
        "earth_field_structure"
    }

    fn evaluate(&self, current: &BeliefState, _history: &BeliefHistory, _peers: &[&BeliefState]) -> f64 {
        let Some(measured) = current.metadata_vector("mag_vector") else {
            return 0.0;
        };
        let Some(expected) = current
            .metadata_vector("expected_mag_vector")
            .or_else(|| self.reference_field.clone())
        else {
            return 0.0;
        };

        match angle_between(&expected, &measured) {
            Some(angle) if angle > self.max_field_angle => angle / self.max_field_angle,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::fixtures::state;
    use crate::state::Metadata;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn with_field(measured: serde_json::Value) -> BeliefState {
        let mut meta = Metadata::new();
        meta.insert("mag_vector".into(), measured);
        state("magnetic", &[0.0, 0.0], &[0.0, 0.0], 0.7, 0.0).with_metadata(meta)
    }

    fn invariant() -> EarthFieldConsistency {
        EarthFieldConsistency::from_config(&ArbiterConfig {
            reference_field: Some(vec![20_000.0, 0.0, 45_000.0]),
            ..ArbiterConfig::default()
        })
    }

    #[test]
    fn missing_measurement_scores_zero() {
        let cur = state("gps", &[0.0, 0.0], &[0.0, 0.0], 0.9, 0.0);
        assert_eq!(invariant().evaluate(&cur, &BeliefHistory::new(1), &[]), 0.0);
    }

    #[test]
    fn aligned_field_scores_zero() {
        let cur = with_field(json!([20_100.0, 50.0, 44_900.0]));
        assert_eq!(invariant().evaluate(&cur, &BeliefHistory::new(1), &[]), 0.0);
    }

    #[test]
    fn rotated_field_is_penalised() {
        let cur = with_field(json!([0.0, 45_000.0, 20_000.0]));
        let inv = invariant();
        let expected = DVector::from_vec(vec![20_000.0, 0.0, 45_000.0]);
        let measured = DVector::from_vec(vec![0.0, 45_000.0, 20_000.0]);
        let angle = angle_between(&expected, &measured).unwrap();
        assert_relative_eq!(
            inv.evaluate(&cur, &BeliefHistory::new(1), &[]),
            angle / inv.max_field_angle,
            epsilon = 1e-12
        );
    }

    #[test]
    fn no_expected_field_scores_zero() {
        let inv = EarthFieldConsistency::from_config(&ArbiterConfig::default());
        let cur = with_field(json!([0.0, 1.0, 0.0]));
        assert_eq!(inv.evaluate(&cur, &BeliefHistory::new(1), &[]), 0.0);
    }
}
