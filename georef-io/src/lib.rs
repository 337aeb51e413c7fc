//! File formats around a reconstruction that are not meshes.
//!
//! * [`PoseLog`]: the NVM-like camera pose log, rewritten in place
//! * [`read_transform`] and [`write_transform`]: the 8-number transform parameter file
//! * [`PointCloud`]: a PLY point cloud whose `vertex` positions can be transformed
//! * [`MeshFile`]: an OBJ mesh together with the MTL library it references
//!
//! Every file this crate writes goes through [`write_atomic`], so an interrupted run never
//! leaves a truncated output behind.

mod atomic;
mod error;
mod mesh_file;
mod nvm;
mod params;
mod pointcloud;

pub use atomic::*;
pub use error::*;
pub use mesh_file::*;
pub use nvm::*;
pub use params::*;
pub use pointcloud::*;
