use crate::{ObjWriter, ReferentialError};
use georef_core::nalgebra::{Point2, Point3};
use georef_core::{ApplySimilarity, SimilarityTransform};
use std::io;

/// An indexed polygon mesh with per-face materials.
///
/// The fields are private so that the following always holds:
///
/// * there is one material entry per face
/// * either no face has texture indices or every face has exactly one per vertex
/// * every vertex and texture index is in bounds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    texcoords: Vec<Point2<f64>>,
    faces: Vec<Vec<usize>>,
    texture_faces: Vec<Vec<usize>>,
    /// Distinct material names in order of first use.
    materials: Vec<String>,
    /// Index into `materials` for every face.
    face_materials: Vec<Option<usize>>,
    material_library: Option<String>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a vertex and returns its 0-based index.
    pub fn add_vertex(&mut self, vertex: Point3<f64>) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    /// Appends a texture coordinate and returns its 0-based index.
    pub fn add_texcoord(&mut self, texcoord: Point2<f64>) -> usize {
        self.texcoords.push(texcoord);
        self.texcoords.len() - 1
    }

    /// Appends a face made of 0-based vertex indices.
    ///
    /// Texture indices must be given for every face or for none of them. The face is rejected
    /// and the mesh left unchanged if any index is out of bounds or the texture indices do not
    /// line up with the vertex indices.
    pub fn add_face(
        &mut self,
        vertices: Vec<usize>,
        texcoords: Option<Vec<usize>>,
        material: Option<&str>,
    ) -> Result<usize, ReferentialError> {
        let face = self.faces.len();
        if vertices.len() < 3 {
            return Err(ReferentialError::DegenerateFace {
                face,
                arity: vertices.len(),
            });
        }
        if let Some(&index) = vertices.iter().find(|&&ix| ix >= self.vertices.len()) {
            return Err(ReferentialError::VertexOutOfBounds {
                face,
                index,
                count: self.vertices.len(),
            });
        }
        match &texcoords {
            Some(texcoords) => {
                if texcoords.len() != vertices.len() {
                    return Err(ReferentialError::ArityMismatch {
                        face,
                        vertices: vertices.len(),
                        texcoords: texcoords.len(),
                    });
                }
                if self.texture_faces.len() != self.faces.len() {
                    return Err(ReferentialError::UnexpectedTexcoords { face });
                }
                if let Some(&index) = texcoords.iter().find(|&&ix| ix >= self.texcoords.len()) {
                    return Err(ReferentialError::TexcoordOutOfBounds {
                        face,
                        index,
                        count: self.texcoords.len(),
                    });
                }
            }
            None if !self.texture_faces.is_empty() => {
                return Err(ReferentialError::MissingTexcoords { face });
            }
            None => {}
        }

        let material = material.map(|name| self.intern_material(name));
        self.faces.push(vertices);
        if let Some(texcoords) = texcoords {
            self.texture_faces.push(texcoords);
        }
        self.face_materials.push(material);
        Ok(face)
    }

    fn intern_material(&mut self, name: &str) -> usize {
        match self.materials.iter().position(|m| m == name) {
            Some(ix) => ix,
            None => {
                self.materials.push(name.to_owned());
                self.materials.len() - 1
            }
        }
    }

    pub fn set_material_library(&mut self, name: Option<String>) {
        self.material_library = name;
    }

    /// The name of the external material library, as referenced by the mesh.
    pub fn material_library(&self) -> Option<&str> {
        self.material_library.as_deref()
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn texcoords(&self) -> &[Point2<f64>] {
        &self.texcoords
    }

    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    /// Texture indices per face, either empty or parallel to [`Mesh::faces`].
    pub fn texture_faces(&self) -> &[Vec<usize>] {
        &self.texture_faces
    }

    pub fn is_textured(&self) -> bool {
        !self.texture_faces.is_empty()
    }

    /// The material that was active when face `face` was declared.
    pub fn face_material(&self, face: usize) -> Option<&str> {
        self.face_materials
            .get(face)
            .copied()
            .flatten()
            .map(|ix| self.materials[ix].as_str())
    }

    /// The active material for every face, in face order.
    pub fn face_materials(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.face_materials
            .iter()
            .map(move |m| m.map(|ix| self.materials[ix].as_str()))
    }

    /// Distinct material names used by faces, in order of first use.
    pub fn used_materials(&self) -> &[String] {
        &self.materials
    }

    /// Moves every vertex. Faces, texture coordinates and materials are left alone.
    pub fn apply_transform(&mut self, transform: &SimilarityTransform) {
        self.vertices.apply_similarity(transform);
    }

    /// Writes the mesh as OBJ text with the default [`ObjWriter`].
    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        ObjWriter::new().write(self, &mut out)?;
        Ok(out)
    }
}

impl ApplySimilarity for Mesh {
    fn apply_similarity(&mut self, transform: &SimilarityTransform) {
        self.apply_transform(transform);
    }
}
