//! In-memory textured meshes and the line-oriented text formats they are stored in.
//!
//! A [`Mesh`] is an indexed polygon mesh: vertices, texture coordinates, faces made of vertex
//! indices, an optional parallel list of texture-coordinate indices per face, and the material
//! that was active when each face was declared. Materials are only referenced by name. The
//! names resolve through a separate [`MaterialLibrary`], which maps each material to its diffuse
//! texture.
//!
//! Both text formats are read with [`parse_obj`] and [`parse_mtl`] and the mesh is written back
//! with an [`ObjWriter`]. Indices are 1-based on disk and 0-based in memory.

mod error;
mod material;
mod mesh;
mod obj;

pub use error::*;
pub use material::*;
pub use mesh::*;
pub use obj::*;
