use crate::{canonicalize, ApplySimilarity, SimilarityTransform};
use nalgebra::{Point3, Quaternion, UnitQuaternion};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// One camera of a pose log.
///
/// Only the orientation and the position take part in a transform. The focal length and the
/// distortion fields are kept as the exact text they were read from so that rewriting a pose
/// log never perturbs them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraPoseEntry {
    /// The image name as written in the pose log. This may contain directories.
    pub filename: String,
    pub focal_length: String,
    /// Camera orientation, stored as a unit quaternion.
    pub orientation: UnitQuaternion<f64>,
    pub position: Point3<f64>,
    /// Trailing fields after the position, kept verbatim.
    pub distortion: Vec<String>,
}

impl CameraPoseEntry {
    /// Builds an entry from a scalar-first quaternion `[w, x, y, z]`.
    ///
    /// The quaternion is normalized.
    pub fn new(
        filename: impl Into<String>,
        focal_length: impl Into<String>,
        [w, x, y, z]: [f64; 4],
        position: Point3<f64>,
        distortion: Vec<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            focal_length: focal_length.into(),
            orientation: UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)),
            position,
            distortion,
        }
    }

    /// The final path segment of the image filename.
    pub fn basename(&self) -> &str {
        basename(&self.filename)
    }

    /// The orientation in scalar-first order `[w, x, y, z]`.
    pub fn orientation_wxyz(&self) -> [f64; 4] {
        let q = self.orientation.quaternion();
        [q.w, q.i, q.j, q.k]
    }

    /// Returns the pose in the frame the transform maps into.
    ///
    /// The position moves like any other point. The orientation matrix is right-multiplied by
    /// the rotation of the transform and re-extracted as a canonical quaternion (see
    /// [`canonicalize`]).
    #[must_use]
    pub fn transformed(&self, transform: &SimilarityTransform) -> Self {
        let rotation = self.orientation.to_rotation_matrix() * transform.rotation;
        Self {
            orientation: canonicalize(UnitQuaternion::from_rotation_matrix(&rotation)),
            position: transform.transform_point(&self.position),
            ..self.clone()
        }
    }
}

impl ApplySimilarity for CameraPoseEntry {
    fn apply_similarity(&mut self, transform: &SimilarityTransform) {
        *self = self.transformed(transform);
    }
}

impl ApplySimilarity for [CameraPoseEntry] {
    fn apply_similarity(&mut self, transform: &SimilarityTransform) {
        for pose in self {
            pose.apply_similarity(transform);
        }
    }
}

/// The final path segment of a filename.
///
/// Both `/` and `\` are treated as separators since pose logs are frequently produced on a
/// different platform than the one that reads them.
pub fn basename(path: &str) -> &str {
    path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_strips_directories() {
        assert_eq!(basename("x/a.jpg"), "a.jpg");
        assert_eq!(basename("C:\\images\\b.JPG"), "b.JPG");
        assert_eq!(basename("c.png"), "c.png");
        assert_eq!(basename("dir/"), "");
    }

    #[test]
    fn new_normalizes_quaternion() {
        let pose = CameraPoseEntry::new(
            "a.jpg",
            "1000",
            [2.0, 0.0, 0.0, 0.0],
            Point3::origin(),
            vec![],
        );
        assert_eq!(pose.orientation_wxyz(), [1.0, 0.0, 0.0, 0.0]);
    }
}
