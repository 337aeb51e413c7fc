use georef_core::nalgebra::Point3;
use georef_core::{CameraPoseEntry, GeoAnchor};
use log::*;

/// Paired positions of the same cameras in both frames, ready for estimation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correspondences {
    /// The anchor filename of each pair.
    pub names: Vec<String>,
    /// Camera centers in the reconstruction frame.
    pub source: Vec<Point3<f64>>,
    /// Anchor positions `(easting, northing, altitude)`.
    pub target: Vec<Point3<f64>>,
}

impl Correspondences {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Pairs every anchor with the first pose whose file has the same basename.
///
/// Pairs come out in anchor order. Anchors without a pose are left out.
pub fn match_correspondences(anchors: &[GeoAnchor], poses: &[CameraPoseEntry]) -> Correspondences {
    let mut correspondences = Correspondences::default();
    for anchor in anchors {
        match poses.iter().find(|pose| pose.basename() == anchor.basename()) {
            Some(pose) => {
                correspondences.names.push(anchor.filename.clone());
                correspondences.source.push(pose.position);
                correspondences.target.push(anchor.position());
            }
            None => debug!("no camera pose for {}", anchor.filename),
        }
    }
    info!(
        "matched {} of {} images to camera poses",
        correspondences.len(),
        anchors.len()
    );
    correspondences
}
