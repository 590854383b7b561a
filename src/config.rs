use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MbnaError, Result};
use crate::scoring::PenaltyCombination;

/// Run-wide tunables for invariant scoring, arbitration and refusal.
///
/// Read once at process start and treated as immutable for the run. Unknown
/// keys are rejected at parse time and out-of-range values by [`validate`].
///
/// [`validate`]: ArbiterConfig::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArbiterConfig {
    /// Maximum plausible acceleration magnitude [m/s^2]
    pub max_accel: f64,
    /// Maximum plausible airspeed [m/s]
    pub max_airspeed: f64,
    /// Penalty sensitivity in `confidence / (1 + lambda * penalty)`
    pub lambda: f64,
    /// Winning trust below this raises NAV_UNSAFE
    pub trust_min: f64,
    /// Innovation norm above this masks the selected belief [m]
    pub innovation_threshold: f64,
    /// Prior states needed before the temporal invariant scores
    pub min_history: usize,
    /// Bounded history capacity per belief
    pub history_len: usize,
    /// Penalty assigned when a check is numerically undefined
    pub penalty_ceiling: f64,
    pub penalty_combination: PenaltyCombination,
    /// Coherence gate in combined standard deviations
    pub coherence_k: f64,
    /// Confidence above which a tiny covariance is suspicious
    pub conf_high: f64,
    /// Smallest honest position-covariance trace [m^2]
    pub sigma_min: f64,
    /// Maximum angle between measured and expected field [rad]
    pub max_field_angle: f64,
    /// Expected Earth field used when a belief carries none of its own
    pub reference_field: Option<Vec<f64>>,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            max_accel: 10.0,
            max_airspeed: 250.0,
            lambda: 1.0,
            trust_min: 0.3,
            innovation_threshold: 20.0,
            min_history: 1,
            history_len: 50,
            penalty_ceiling: 1.0e6,
            penalty_combination: PenaltyCombination::Sum,
            coherence_k: 3.0,
            conf_high: 0.9,
            sigma_min: 1.0e-3,
            max_field_angle: 0.35,
            reference_field: None,
        }
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(MbnaError::InvalidConfig(format!(
            "{name} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

fn unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(MbnaError::InvalidConfig(format!(
            "{name} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

impl ArbiterConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: ArbiterConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        positive("max_accel", self.max_accel)?;
        positive("max_airspeed", self.max_airspeed)?;
        positive("lambda", self.lambda)?;
        positive("innovation_threshold", self.innovation_threshold)?;
        positive("penalty_ceiling", self.penalty_ceiling)?;
        positive("coherence_k", self.coherence_k)?;
        positive("sigma_min", self.sigma_min)?;
        positive("max_field_angle", self.max_field_angle)?;
        unit_interval("trust_min", self.trust_min)?;
        unit_interval("conf_high", self.conf_high)?;

        if self.history_len == 0 {
            return Err(MbnaError::InvalidConfig(
                "history_len must be greater than zero".to_string(),
            ));
        }
        if self.min_history == 0 || self.min_history > self.history_len {
            return Err(MbnaError::InvalidConfig(format!(
                "min_history must be in [1, history_len={}], got {}",
                self.history_len, self.min_history
            )));
        }
        if let PenaltyCombination::Weighted(weights) = &self.penalty_combination {
            if let Some((name, w)) = weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
                return Err(MbnaError::InvalidConfig(format!(
                    "penalty weight for '{name}' must be finite and >= 0, got {w}"
                )));
            }
        }
        if let Some(field) = &self.reference_field {
            if !(2..=3).contains(&field.len()) {
                return Err(MbnaError::DimensionMismatch {
                    context: "reference_field",
                    expected: 3,
                    got: field.len(),
                });
            }
            if field.iter().any(|v| !v.is_finite()) || field.iter().all(|v| *v == 0.0) {
                return Err(MbnaError::InvalidConfig(
                    "reference_field must be finite and non-zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}
