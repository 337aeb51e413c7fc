use thiserror::Error;

/// A face that does not fit the rest of the mesh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferentialError {
    #[error("face {face} has {arity} vertices but at least 3 are required")]
    DegenerateFace { face: usize, arity: usize },
    #[error("face {face} references vertex {index} but the mesh has {count} vertices")]
    VertexOutOfBounds {
        face: usize,
        index: usize,
        count: usize,
    },
    #[error("face {face} references texture coordinate {index} but the mesh has {count}")]
    TexcoordOutOfBounds {
        face: usize,
        index: usize,
        count: usize,
    },
    #[error("face {face} has {vertices} vertex indices but {texcoords} texture indices")]
    ArityMismatch {
        face: usize,
        vertices: usize,
        texcoords: usize,
    },
    #[error("face {face} has no texture indices while earlier faces do")]
    MissingTexcoords { face: usize },
    #[error("face {face} has texture indices while earlier faces do not")]
    UnexpectedTexcoords { face: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("line {line}: {reason}")]
    Format { line: usize, reason: String },
    #[error("line {line}: {source}")]
    Face {
        line: usize,
        #[source]
        source: ReferentialError,
    },
    #[error(transparent)]
    Referential(#[from] ReferentialError),
}

impl Error {
    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
