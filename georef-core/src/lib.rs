//! # Georef Core
//!
//! Common types shared by every crate that takes a reconstruction out of its arbitrary
//! structure-from-motion frame and into a geodetic one.
//!
//! A reconstruction produced by structure-from-motion lives in a frame whose origin,
//! orientation and unit of distance were all chosen arbitrarily. When the source photographs
//! carry GPS tags, each camera has a second, real-world position. Pairing those positions with
//! the estimated camera centers yields correspondences from which a single
//! [`SimilarityTransform`] (uniform scale, rotation and translation) can be solved. That one
//! transform must then be applied to every artifact of the reconstruction:
//!
//! * the textured mesh (only its vertices move)
//! * the point cloud
//! * the camera poses, as [`CameraPoseEntry`] values
//!
//! Every destination goes through [`SimilarityTransform::transform_point`], so the mesh,
//! the points and the camera centers can never disagree about where a point lands.
//!
//! ```text
//!   source frame                       geodetic frame
//!
//!        o  camera                          o
//!       /                                  /
//!      x----x  mesh      s·R·p + t        x--------x
//!       \  /          ------------->       \      /
//!        x                                  \    /
//!                                             x
//! ```

mod anchor;
mod pose;
mod similarity;

pub use anchor::*;
pub use nalgebra;
pub use pose::*;
pub use similarity::*;
