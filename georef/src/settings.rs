#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};
use umeyama::{Umeyama, MIN_CORRESPONDENCES};

/// The settings for geo-registration and transform application.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRegisterSettings {
    /// The number of matched images required before a transform is estimated.
    ///
    /// Values below 3 are treated as 3.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_minimum_correspondences")
    )]
    pub minimum_correspondences: usize,
    /// File extensions (compared case-insensitively) of the images scanned for GPS tags.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_image_extensions")
    )]
    pub image_extensions: Vec<String>,
    /// Decimal places for written mesh vertices, or the shortest exact form when `None`.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub vertex_precision: Option<usize>,
    /// How far the norm of a transform file quaternion may be from one before it is reported.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_quaternion_tolerance")
    )]
    pub quaternion_tolerance: f64,
    /// The correspondences are degenerate when the second singular value of their
    /// cross-covariance is at most this fraction of the first.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_degeneracy_ratio")
    )]
    pub degeneracy_ratio: f64,
}

impl GeoRegisterSettings {
    pub fn minimum_correspondences(&self) -> usize {
        self.minimum_correspondences.max(MIN_CORRESPONDENCES)
    }

    pub fn is_image(&self, extension: &str) -> bool {
        self.image_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    pub fn estimator(&self) -> Umeyama {
        Umeyama {
            degeneracy_ratio: self.degeneracy_ratio,
            ..Umeyama::default()
        }
    }
}

impl Default for GeoRegisterSettings {
    fn default() -> Self {
        Self {
            minimum_correspondences: default_minimum_correspondences(),
            image_extensions: default_image_extensions(),
            vertex_precision: None,
            quaternion_tolerance: default_quaternion_tolerance(),
            degeneracy_ratio: default_degeneracy_ratio(),
        }
    }
}

fn default_minimum_correspondences() -> usize {
    MIN_CORRESPONDENCES
}

fn default_image_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg"].map(String::from).to_vec()
}

fn default_quaternion_tolerance() -> f64 {
    1e-5
}

fn default_degeneracy_ratio() -> f64 {
    1e-9
}
