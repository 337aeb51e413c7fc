use crate::{write_atomic, Error, Result};
use georef_core::{ApplySimilarity, SimilarityTransform};
use georef_mesh::{parse_mtl, parse_obj, MaterialLibrary, Mesh, ObjWriter};
use log::*;
use std::fs;
use std::path::{Path, PathBuf};

/// An OBJ mesh loaded from disk together with the material library it references.
#[derive(Debug, Clone)]
pub struct MeshFile {
    pub mesh: Mesh,
    /// The parsed library named by `mtllib`, if the mesh names one.
    pub materials: Option<MaterialLibrary>,
    /// The directory the mesh was read from. `mtllib` and texture paths are relative to it.
    pub directory: PathBuf,
}

impl MeshFile {
    /// Reads an OBJ file and, if it names one, its material library.
    ///
    /// A material library that is named but cannot be read is an error. Faces that use a
    /// material the library does not declare are only reported.
    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(Error::io(path))?;
        let mesh = parse_obj(&text).map_err(|source| Error::Mesh {
            path: path.to_owned(),
            source,
        })?;
        let directory = path.parent().map(Path::to_owned).unwrap_or_default();

        let materials = match mesh.material_library() {
            Some(name) => {
                let mtl_path = directory.join(name);
                let text = fs::read_to_string(&mtl_path).map_err(Error::io(&mtl_path))?;
                let library = parse_mtl(&text).map_err(|source| Error::Mesh {
                    path: mtl_path.clone(),
                    source,
                })?;
                for material in mesh.used_materials() {
                    if !library.contains(material) {
                        warn!(
                            "{}: material {} is not declared in {}",
                            path.display(),
                            material,
                            mtl_path.display()
                        );
                    }
                }
                Some(library)
            }
            None => None,
        };
        info!(
            "read {} vertices and {} faces from {}",
            mesh.vertices().len(),
            mesh.faces().len(),
            path.display()
        );
        Ok(Self {
            mesh,
            materials,
            directory,
        })
    }

    /// Writes the mesh to `path` with the given vertex precision.
    ///
    /// When `path` is in another directory than the one the mesh was read from, the material
    /// library and every relative texture it references are copied alongside, so the written
    /// mesh can be loaded on its own. Textures that are missing are reported and skipped.
    pub fn save(&self, path: &Path, precision: Option<usize>) -> Result<()> {
        let mut out = Vec::new();
        ObjWriter::with_precision(precision)
            .write(&self.mesh, &mut out)
            .map_err(Error::io(path))?;
        write_atomic(path, &out)?;

        let target = path.parent().map(Path::to_owned).unwrap_or_default();
        if same_directory(&self.directory, &target) {
            return Ok(());
        }
        if let (Some(name), Some(library)) = (self.mesh.material_library(), &self.materials) {
            copy_file(&self.directory.join(name), &target.join(name))?;
            for texture in library.textures() {
                if Path::new(texture).is_absolute() {
                    continue;
                }
                let source = self.directory.join(texture);
                if !source.is_file() {
                    warn!("texture {} does not exist, not copied", source.display());
                    continue;
                }
                copy_file(&source, &target.join(texture))?;
            }
        }
        Ok(())
    }
}

impl ApplySimilarity for MeshFile {
    fn apply_similarity(&mut self, transform: &SimilarityTransform) {
        self.mesh.apply_transform(transform);
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    let canonical = |p: &Path| {
        let p = if p.as_os_str().is_empty() {
            Path::new(".")
        } else {
            p
        };
        p.canonicalize().unwrap_or_else(|_| p.to_owned())
    };
    canonical(a) == canonical(b)
}

fn copy_file(source: &Path, target: &Path) -> Result<()> {
    let bytes = fs::read(source).map_err(Error::io(source))?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(Error::io(parent))?;
    }
    debug!("copying {} to {}", source.display(), target.display());
    write_atomic(target, &bytes)
}
