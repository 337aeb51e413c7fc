use crate::CameraPoseEntry;
use core::ops::Mul;
use nalgebra::{Matrix4, Point3, Rotation3, UnitQuaternion, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A uniform scale, a rotation and a translation.
///
/// Applying it maps `x` to `scale * rotation * x + translation`. The rotation is always proper
/// (determinant `+1`), so a similarity transform never mirrors the reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct SimilarityTransform {
    pub scale: f64,
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
}

impl SimilarityTransform {
    pub fn new(scale: f64, rotation: Rotation3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            scale,
            rotation,
            translation,
        }
    }

    /// The transform that leaves every point where it is.
    pub fn identity() -> Self {
        Self::new(1.0, Rotation3::identity(), Vector3::zeros())
    }

    pub fn from_quaternion(
        scale: f64,
        rotation: UnitQuaternion<f64>,
        translation: Vector3<f64>,
    ) -> Self {
        Self::new(scale, rotation.to_rotation_matrix(), translation)
    }

    /// The rotation as a canonical unit quaternion.
    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        canonicalize(UnitQuaternion::from_rotation_matrix(&self.rotation))
    }

    /// Maps one point. Every other application in this workspace goes through this.
    #[inline(always)]
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.scale * (self.rotation * point.coords) + self.translation)
    }

    /// Maps a sequence of points into a new vector, leaving the input untouched.
    pub fn apply_to_points(&self, points: &[Point3<f64>]) -> Vec<Point3<f64>> {
        points.iter().map(|p| self.transform_point(p)).collect()
    }

    /// Maps a camera pose. See [`CameraPoseEntry::transformed`].
    pub fn apply_to_pose(&self, pose: &CameraPoseEntry) -> CameraPoseEntry {
        pose.transformed(self)
    }

    /// Applies the transform in place to anything implementing [`ApplySimilarity`].
    pub fn apply_to<T: ApplySimilarity + ?Sized>(&self, target: &mut T) {
        target.apply_similarity(self);
    }

    /// The transform that undoes this one.
    ///
    /// The scale must be non-zero.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        let scale = self.scale.recip();
        Self::new(scale, rotation, -(scale * (rotation * self.translation)))
    }

    /// Retrieve the homogeneous matrix `[s·R | t; 0 | 1]`.
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let mut matrix = Matrix4::identity();
        matrix
            .fixed_slice_mut::<3, 3>(0, 0)
            .copy_from(&(self.rotation.matrix() * self.scale));
        matrix
            .fixed_slice_mut::<3, 1>(0, 3)
            .copy_from(&self.translation);
        matrix
    }
}

impl Default for SimilarityTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// `a * b` is the transform that applies `b` first and then `a`.
impl Mul for SimilarityTransform {
    type Output = SimilarityTransform;

    fn mul(self, rhs: SimilarityTransform) -> SimilarityTransform {
        SimilarityTransform::new(
            self.scale * rhs.scale,
            self.rotation * rhs.rotation,
            self.scale * (self.rotation * rhs.translation) + self.translation,
        )
    }
}

/// Something that can be moved by a [`SimilarityTransform`] in place.
///
/// Implementations must transform all of their geometry or none of it, and must only
/// move geometry through [`SimilarityTransform::transform_point`] (poses additionally
/// recompose their orientation).
pub trait ApplySimilarity {
    fn apply_similarity(&mut self, transform: &SimilarityTransform);
}

impl ApplySimilarity for Point3<f64> {
    fn apply_similarity(&mut self, transform: &SimilarityTransform) {
        *self = transform.transform_point(self);
    }
}

impl ApplySimilarity for [Point3<f64>] {
    fn apply_similarity(&mut self, transform: &SimilarityTransform) {
        for point in self {
            point.apply_similarity(transform);
        }
    }
}

impl ApplySimilarity for Vec<Point3<f64>> {
    fn apply_similarity(&mut self, transform: &SimilarityTransform) {
        self.as_mut_slice().apply_similarity(transform);
    }
}

/// Picks one of the two quaternions `q` and `-q` that describe the same rotation.
///
/// The representative has a positive scalar part. When the scalar part is exactly zero, the
/// first non-zero vector component (in `x`, `y`, `z` order) is made positive instead. Extracting
/// a quaternion from a matrix built from a canonical quaternion therefore returns the same
/// quaternion up to rounding, no matter how many times this is repeated.
pub fn canonicalize(quaternion: UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    let q = quaternion.into_inner();
    let leading = [q.w, q.i, q.j, q.k]
        .into_iter()
        .find(|&c| c != 0.0)
        .unwrap_or(1.0);
    if leading < 0.0 {
        UnitQuaternion::new_unchecked(-q)
    } else {
        quaternion
    }
}
