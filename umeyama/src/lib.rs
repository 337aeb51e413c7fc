//! Estimates the [`SimilarityTransform`] that best maps one set of 3d points onto another.
//!
//! Given pairs `(a_i, b_i)` this finds the scale `s`, rotation `R` and translation `t` that
//! minimize `Σ |b_i - (s·R·a_i + t)|²`, following
//! [Umeyama (1991)](https://doi.org/10.1109/34.88573) (the Kabsch solution extended with scale):
//!
//! 1. Center both sets on their centroids.
//! 2. Build the cross-covariance `H = Σ a_i·b_iᵀ` of the centered points.
//! 3. Decompose `H = U·S·Vᵀ` and take `R = V·Uᵀ`.
//! 4. If `R` is a reflection, negate the row of `Vᵀ` belonging to the smallest singular value
//!    and recompute `R`.
//! 5. `s = ΣS / Σ|a_i|²` and `t = b̄ - s·R·ā`.
//!
//! At least three pairs are needed, and the source points must not all lie on one line:
//! otherwise the rotation about that line is unconstrained.

use float_ord::FloatOrd;
use georef_core::{
    nalgebra::{Matrix3, Point3, Rotation3, Vector3},
    SimilarityTransform,
};
use log::*;
use thiserror::Error;

/// The fewest correspondences from which a similarity can be estimated.
pub const MIN_CORRESPONDENCES: usize = 3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("not enough points: {found} correspondences, at least {required} are needed")]
    TooFewCorrespondences { found: usize, required: usize },
    #[error("{source_len} source points but {target_len} target points")]
    LengthMismatch {
        source_len: usize,
        target_len: usize,
    },
    #[error("correspondence {index} is not finite")]
    NonFinite { index: usize },
    #[error("degenerate correspondences: {reason}")]
    Degenerate { reason: &'static str },
    #[error("singular value decomposition did not converge")]
    NoConvergence,
}

/// Performs the Umeyama similarity estimation.
#[derive(Copy, Clone, Debug)]
pub struct Umeyama {
    /// Convergence threshold of the singular value decomposition.
    pub epsilon: f64,
    /// Iteration limit of the singular value decomposition.
    pub iterations: usize,
    /// The correspondences are rejected as collinear when the second largest singular value of
    /// the cross-covariance is at most this fraction of the largest.
    pub degeneracy_ratio: f64,
}

impl Umeyama {
    pub fn new() -> Self {
        Default::default()
    }

    /// Estimates the transform taking each `source[i]` to `target[i]`.
    pub fn estimate(
        &self,
        source: &[Point3<f64>],
        target: &[Point3<f64>],
    ) -> Result<SimilarityTransform, EstimationError> {
        if source.len() != target.len() {
            return Err(EstimationError::LengthMismatch {
                source_len: source.len(),
                target_len: target.len(),
            });
        }
        if source.len() < MIN_CORRESPONDENCES {
            return Err(EstimationError::TooFewCorrespondences {
                found: source.len(),
                required: MIN_CORRESPONDENCES,
            });
        }
        if let Some(index) = source
            .iter()
            .zip(target)
            .position(|(a, b)| a.iter().chain(b.iter()).any(|n| !n.is_finite()))
        {
            return Err(EstimationError::NonFinite { index });
        }

        let source_centroid = centroid(source);
        let target_centroid = centroid(target);

        let mut covariance = Matrix3::<f64>::zeros();
        let mut source_variance = 0.0;
        for (a, b) in source.iter().zip(target) {
            let a = a.coords - source_centroid;
            let b = b.coords - target_centroid;
            covariance += a * b.transpose();
            source_variance += a.norm_squared();
        }
        if source_variance == 0.0 {
            return Err(EstimationError::Degenerate {
                reason: "all source points coincide",
            });
        }

        let svd = covariance
            .try_svd_unordered(true, true, self.epsilon, self.iterations)
            .ok_or(EstimationError::NoConvergence)?;
        let (u, mut v_t) = match (svd.u, svd.v_t) {
            (Some(u), Some(v_t)) => (u, v_t),
            _ => return Err(EstimationError::NoConvergence),
        };
        let singular_values = svd.singular_values;
        debug!("cross-covariance singular values {:?}", singular_values.as_slice());

        let mut sorted = [singular_values[0], singular_values[1], singular_values[2]];
        sorted.sort_unstable_by_key(|&n| core::cmp::Reverse(FloatOrd(n)));
        if sorted[0] <= 0.0 || sorted[1] <= self.degeneracy_ratio * sorted[0] {
            return Err(EstimationError::Degenerate {
                reason: "the points are collinear",
            });
        }

        let mut rotation = v_t.transpose() * u.transpose();
        if rotation.determinant() < 0.0 {
            let smallest = singular_values
                .iter()
                .enumerate()
                .min_by_key(|&(_, &n)| FloatOrd(n))
                .map(|(ix, _)| ix)
                .unwrap_or(2);
            debug!("correcting reflection by flipping singular vector {}", smallest);
            let mut row = v_t.row_mut(smallest);
            row *= -1.0;
            rotation = v_t.transpose() * u.transpose();
        }

        let scale = singular_values.sum() / source_variance;
        let translation = target_centroid - scale * (rotation * source_centroid);
        Ok(SimilarityTransform::new(
            scale,
            Rotation3::from_matrix_unchecked(rotation),
            translation,
        ))
    }
}

impl Default for Umeyama {
    fn default() -> Self {
        Self {
            epsilon: 1e-12,
            iterations: 1000,
            degeneracy_ratio: 1e-9,
        }
    }
}

fn centroid(points: &[Point3<f64>]) -> Vector3<f64> {
    points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / points.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_few() {
        let points = [Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        assert_eq!(
            Umeyama::new().estimate(&points, &points),
            Err(EstimationError::TooFewCorrespondences {
                found: 2,
                required: 3
            })
        );
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let a = [Point3::origin(); 4];
        let b = [Point3::origin(); 3];
        assert!(matches!(
            Umeyama::new().estimate(&a, &b),
            Err(EstimationError::LengthMismatch {
                source_len: 4,
                target_len: 3
            })
        ));
    }

    #[test]
    fn rejects_coincident_and_collinear() {
        let coincident = [Point3::new(1.0, 2.0, 3.0); 5];
        let target = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        assert!(matches!(
            Umeyama::new().estimate(&coincident, &target),
            Err(EstimationError::Degenerate { .. })
        ));

        let collinear: Vec<_> = (0..5)
            .map(|i| Point3::new(i as f64, 2.0 * i as f64, -(i as f64)))
            .collect();
        assert!(matches!(
            Umeyama::new().estimate(&collinear, &target),
            Err(EstimationError::Degenerate { .. })
        ));
    }

    #[test]
    fn rejects_nan() {
        let mut points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let target = points.clone();
        points[1].y = f64::NAN;
        assert_eq!(
            Umeyama::new().estimate(&points, &target),
            Err(EstimationError::NonFinite { index: 1 })
        );
    }
}
