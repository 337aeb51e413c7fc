//! # Georef
//!
//! Moves a structure-from-motion reconstruction into a real-world frame using the GPS tags of
//! the photographs it was built from.
//!
//! The [`register`] pipeline:
//!
//! 1. reads a [`GeoAnchor`](georef_core::GeoAnchor) per image through an [`AnchorSource`]
//!    (by default [`ExifAnchorSource`], which projects EXIF GPS positions to UTM)
//! 2. pairs anchors with the poses of a [`PoseLog`](georef_io::PoseLog) by file name
//!    ([`match_correspondences`])
//! 3. estimates one [`SimilarityTransform`](georef_core::SimilarityTransform) with
//!    [`Umeyama`](umeyama::Umeyama)
//! 4. applies it to the pose log, the point cloud and the mesh, then writes them all back
//!
//! [`transform_model`] replays a stored transform on a textured mesh.

mod anchors;
mod error;
mod matcher;
mod pipeline;
mod settings;
pub mod utm;

pub use anchors::*;
pub use error::*;
pub use matcher::*;
pub use pipeline::*;
pub use settings::*;

pub use georef_core;
pub use georef_io;
pub use georef_mesh;
pub use umeyama;
