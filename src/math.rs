//! Small numeric helpers shared by the invariants.

use nalgebra::{DMatrix, DVector};

pub fn all_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

pub fn matrix_finite(m: &DMatrix<f64>) -> bool {
    m.iter().all(|x| x.is_finite())
}

/// Trace of the leading `dim x dim` block, i.e. the position part of a
/// position or position+velocity covariance.
pub fn position_trace(cov: &DMatrix<f64>, dim: usize) -> f64 {
    let dim = dim.min(cov.nrows()).min(cov.ncols());
    (0..dim).map(|i| cov[(i, i)]).sum()
}

/// Angle in radians between two vectors, `None` when either is degenerate.
pub fn angle_between(a: &DVector<f64>, b: &DVector<f64>) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let na = a.norm();
    let nb = b.norm();
    if !(na.is_finite() && nb.is_finite()) || na < f64::EPSILON || nb < f64::EPSILON {
        return None;
    }
    let cos = (a.dot(b) / (na * nb)).clamp(-1.0, 1.0);
    Some(cos.acos())
}

/// Relative excess of `value` over `limit`, zero when within it.
pub fn relative_excess(value: f64, limit: f64) -> f64 {
    if value > limit {
        (value - limit) / limit
    } else {
        0.0
    }
}
