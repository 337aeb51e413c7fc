use crate::{Error, Result};
use log::*;

/// A named material and the diffuse texture bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    pub name: String,
    /// Path of the diffuse texture, relative to the material library unless absolute.
    pub diffuse_map: Option<String>,
}

/// The materials declared by an MTL file, in declaration order.
///
/// Names are unique. Only `newmtl` and `map_Kd` are interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a material, or returns the existing one with the same name.
    pub fn declare(&mut self, name: &str) -> &mut Material {
        let ix = match self.materials.iter().position(|m| m.name == name) {
            Some(ix) => ix,
            None => {
                self.materials.push(Material {
                    name: name.to_owned(),
                    diffuse_map: None,
                });
                self.materials.len() - 1
            }
        };
        &mut self.materials[ix]
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> + '_ {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Every distinct diffuse texture path, in declaration order.
    pub fn textures(&self) -> Vec<&str> {
        let mut textures: Vec<&str> = vec![];
        for texture in self.materials.iter().filter_map(|m| m.diffuse_map.as_deref()) {
            if !textures.contains(&texture) {
                textures.push(texture);
            }
        }
        textures
    }
}

/// Parses an MTL material library.
///
/// A `map_Kd` binds to the most recent `newmtl`; one that appears before any material is
/// ignored. When a `map_Kd` carries options, the path is its last token.
pub fn parse_mtl(text: &str) -> Result<MaterialLibrary> {
    let mut library = MaterialLibrary::new();
    let mut current: Option<String> = None;
    for (ix, line) in text.lines().enumerate() {
        let line_number = ix + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("newmtl") => {
                let name = tokens
                    .next()
                    .ok_or_else(|| Error::format(line_number, "newmtl without a name"))?;
                if library.contains(name) {
                    warn!(
                        "line {}: material {} is declared more than once",
                        line_number, name
                    );
                }
                library.declare(name);
                current = Some(name.to_owned());
            }
            Some("map_Kd") => {
                let path = tokens
                    .last()
                    .ok_or_else(|| Error::format(line_number, "map_Kd without a path"))?;
                match &current {
                    Some(name) => library.declare(name).diffuse_map = Some(path.to_owned()),
                    None => debug!("line {}: map_Kd before any newmtl", line_number),
                }
            }
            _ => {}
        }
    }
    Ok(library)
}
