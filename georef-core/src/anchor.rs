use crate::basename;
use nalgebra::Point3;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The real-world position of the camera that took one image.
///
/// Coordinates are planar (UTM easting and northing in meters) plus the altitude reported
/// by the GPS receiver. The zone is not stored; all anchors of one reconstruction are assumed
/// to share it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct GeoAnchor {
    /// The image this anchor was read from.
    pub filename: String,
    pub easting: f64,
    pub northing: f64,
    pub altitude: f64,
}

impl GeoAnchor {
    pub fn new(filename: impl Into<String>, easting: f64, northing: f64, altitude: f64) -> Self {
        Self {
            filename: filename.into(),
            easting,
            northing,
            altitude,
        }
    }

    /// The anchor as a point in the target frame of the registration.
    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.easting, self.northing, self.altitude)
    }

    /// The final path segment of the image filename.
    pub fn basename(&self) -> &str {
        basename(&self.filename)
    }
}
