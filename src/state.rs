//! Belief state representation
//!
//! A belief state is one engine's estimate for one cycle:
//! - position / velocity: 2-D or 3-D vectors of equal dimension
//! - covariance: self-reported uncertainty over position or position+velocity
//! - internal_confidence: the engine's own confidence in [0, 1]

use std::collections::{BTreeMap, VecDeque};

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::error::{MbnaError, Result};
use crate::math::{all_finite, matrix_finite};

/// Engine-specific auxiliary data. Only a few well-known keys are read by
/// the invariants (`accel`, `mag_vector`, `expected_mag_vector`).
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Immutable snapshot of one belief's estimate.
///
/// Equality is element-wise IEEE comparison, so a state holding a NaN never
/// compares equal to anything, itself included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeliefState {
    belief_id: String,
    position: DVector<f64>,
    velocity: DVector<f64>,
    covariance: DMatrix<f64>,
    internal_confidence: f64,
    timestamp: f64,
    metadata: Metadata,
}

impl BeliefState {
    /// Create a new belief state.
    ///
    /// Only the shape is checked here. Non-finite values are accepted and
    /// screened out at arbitration, so an engine can still report a broken
    /// estimate for the audit trail.
    pub fn new(
        belief_id: impl Into<String>,
        position: DVector<f64>,
        velocity: DVector<f64>,
        covariance: DMatrix<f64>,
        internal_confidence: f64,
        timestamp: f64,
    ) -> Result<Self> {
        let dim = position.len();
        if !(2..=3).contains(&dim) {
            return Err(MbnaError::DimensionMismatch {
                context: "position",
                expected: 3,
                got: dim,
            });
        }
        if velocity.len() != dim {
            return Err(MbnaError::DimensionMismatch {
                context: "velocity",
                expected: dim,
                got: velocity.len(),
            });
        }
        if !covariance.is_square() {
            return Err(MbnaError::DimensionMismatch {
                context: "covariance columns",
                expected: covariance.nrows(),
                got: covariance.ncols(),
            });
        }
        let side = covariance.nrows();
        if side != dim && side != 2 * dim {
            return Err(MbnaError::DimensionMismatch {
                context: "covariance",
                expected: 2 * dim,
                got: side,
            });
        }
        if internal_confidence.is_finite() && !(0.0..=1.0).contains(&internal_confidence) {
            return Err(MbnaError::InvalidConfidence(internal_confidence));
        }

        Ok(Self {
            belief_id: belief_id.into(),
            position,
            velocity,
            covariance,
            internal_confidence,
            timestamp,
            metadata: Metadata::new(),
        })
    }

    /// Attach engine-specific metadata, replacing any already present.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Identifier of the engine that produced this state.
    pub fn belief_id(&self) -> &str {
        &self.belief_id
    }

    /// Estimated position [m].
    pub fn position(&self) -> &DVector<f64> {
        &self.position
    }

    /// Estimated velocity [m/s].
    pub fn velocity(&self) -> &DVector<f64> {
        &self.velocity
    }

    /// Self-reported covariance, position block first.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// The engine's own confidence in [0, 1].
    pub fn internal_confidence(&self) -> f64 {
        self.internal_confidence
    }

    /// Estimate time [s].
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Auxiliary engine data.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Spatial dimension (2 or 3).
    pub fn dim(&self) -> usize {
        self.position.len()
    }

    /// True when every numeric field is finite, i.e. the state may compete
    /// in arbitration.
    pub fn is_finite(&self) -> bool {
        all_finite(&self.position)
            && all_finite(&self.velocity)
            && matrix_finite(&self.covariance)
            && self.internal_confidence.is_finite()
            && self.timestamp.is_finite()
    }

    /// Numeric vector stored under `key`, if present and well-formed.
    pub fn metadata_vector(&self, key: &str) -> Option<DVector<f64>> {
        let values = self.metadata.get(key)?.as_array()?;
        let parsed: Option<Vec<f64>> = values.iter().map(|v| v.as_f64()).collect();
        parsed.filter(|v| !v.is_empty()).map(DVector::from_vec)
    }
}

/// Bounded past states of a single belief, oldest first.
#[derive(Debug, Clone)]
pub struct BeliefHistory {
    states: VecDeque<BeliefState>,
    capacity: usize,
}

impl BeliefHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            states: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a state, evicting the oldest entries on overflow.
    pub fn push(&mut self, state: BeliefState) {
        while self.states.len() >= self.capacity {
            self.states.pop_front();
        }
        self.states.push_back(state);
    }

    /// Most recent state.
    pub fn last(&self) -> Option<&BeliefState> {
        self.states.back()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Maximum number of retained states.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &BeliefState> {
        self.states.iter()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}
