use crate::{Error, Mesh, Result};
use georef_core::nalgebra::{Point2, Point3};
use log::*;
use std::io::{self, Write};

/// One line of an OBJ file.
#[derive(Debug, Clone, PartialEq)]
enum Record<'a> {
    MaterialLibrary(&'a str),
    UseMaterial(&'a str),
    Vertex(Point3<f64>),
    TexCoord(Point2<f64>),
    Face(Vec<FaceVertex>),
    Ignored,
}

/// A face corner as written on disk: 1-based or negative relative indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FaceVertex {
    vertex: i64,
    texcoord: Option<i64>,
}

/// The accumulator threaded through the lines of a file.
struct ParseState<'a> {
    mesh: Mesh,
    current_material: Option<&'a str>,
}

/// Parses an OBJ mesh.
///
/// `usemtl` applies to every following face until the next `usemtl`. Comments, blank lines,
/// normals and any other unknown record are skipped.
pub fn parse_obj(text: &str) -> Result<Mesh> {
    let state = text.lines().enumerate().try_fold(
        ParseState {
            mesh: Mesh::new(),
            current_material: None,
        },
        |state, (ix, line)| {
            let line_number = ix + 1;
            let record = parse_record(line).map_err(|reason| Error::format(line_number, reason))?;
            apply_record(state, record, line_number)
        },
    )?;
    Ok(state.mesh)
}

fn apply_record<'a>(
    mut state: ParseState<'a>,
    record: Record<'a>,
    line: usize,
) -> Result<ParseState<'a>> {
    match record {
        Record::MaterialLibrary(name) => {
            if let Some(previous) = state.mesh.material_library() {
                warn!(
                    "line {}: material library {} replaces {}",
                    line, name, previous
                );
            }
            state.mesh.set_material_library(Some(name.to_owned()));
        }
        Record::UseMaterial(name) => state.current_material = Some(name),
        Record::Vertex(v) => {
            state.mesh.add_vertex(v);
        }
        Record::TexCoord(t) => {
            state.mesh.add_texcoord(t);
        }
        Record::Face(corners) => {
            let (vertices, texcoords) = resolve_face(&state.mesh, &corners, line)?;
            state
                .mesh
                .add_face(vertices, texcoords, state.current_material)
                .map_err(|source| Error::Face { line, source })?;
        }
        Record::Ignored => {}
    }
    Ok(state)
}

fn parse_record(line: &str) -> Result<Record<'_>, String> {
    let mut tokens = line.split_whitespace();
    let keyword = match tokens.next() {
        Some(keyword) if !keyword.starts_with('#') => keyword,
        _ => return Ok(Record::Ignored),
    };
    let record = match keyword {
        "mtllib" => Record::MaterialLibrary(name_argument(keyword, tokens.next())?),
        "usemtl" => Record::UseMaterial(name_argument(keyword, tokens.next())?),
        "v" => {
            let [x, y, z]: [f64; 3] = floats(keyword, &mut tokens)?;
            Record::Vertex(Point3::new(x, y, z))
        }
        "vt" => {
            let u = float(keyword, tokens.next())?;
            let v = tokens.next().map(|t| float(keyword, Some(t))).transpose()?;
            Record::TexCoord(Point2::new(u, v.unwrap_or(0.0)))
        }
        "f" => Record::Face(tokens.map(parse_face_vertex).collect::<Result<_, _>>()?),
        _ => Record::Ignored,
    };
    Ok(record)
}

fn name_argument<'a>(keyword: &str, token: Option<&'a str>) -> Result<&'a str, String> {
    token.ok_or_else(|| format!("{} without a name", keyword))
}

fn float(keyword: &str, token: Option<&str>) -> Result<f64, String> {
    let token = token.ok_or_else(|| format!("{} record has too few components", keyword))?;
    token
        .parse()
        .map_err(|_| format!("{} record has invalid number {:?}", keyword, token))
}

fn floats<'a, const N: usize>(
    keyword: &str,
    tokens: &mut impl Iterator<Item = &'a str>,
) -> Result<[f64; N], String> {
    let mut out = [0.0; N];
    for n in &mut out {
        *n = float(keyword, tokens.next())?;
    }
    Ok(out)
}

fn parse_face_vertex(token: &str) -> Result<FaceVertex, String> {
    let mut parts = token.split('/');
    let index = |part: &str| -> Result<i64, String> {
        match part.parse::<i64>() {
            Ok(0) => Err(format!("face corner {:?} uses index 0", token)),
            Ok(n) => Ok(n),
            Err(_) => Err(format!("face corner {:?} has an invalid index", token)),
        }
    };
    let vertex = index(parts.next().unwrap_or(""))?;
    let texcoord = match parts.next() {
        Some("") | None => None,
        Some(part) => Some(index(part)?),
    };
    Ok(FaceVertex { vertex, texcoord })
}

/// Turns on-disk indices into 0-based ones.
///
/// Corners that omit their texture index while other corners of the same face carry one are
/// kept short, so the mesh reports the arity mismatch.
fn resolve_face(
    mesh: &Mesh,
    corners: &[FaceVertex],
    line: usize,
) -> Result<(Vec<usize>, Option<Vec<usize>>)> {
    let resolve = |index: i64, count: usize, what: &str| -> Result<usize> {
        if index > 0 {
            Ok(index as usize - 1)
        } else {
            count.checked_sub(index.unsigned_abs() as usize).ok_or_else(|| {
                Error::format(
                    line,
                    format!("relative {} index {} reaches before the first one", what, index),
                )
            })
        }
    };
    let vertices = corners
        .iter()
        .map(|c| resolve(c.vertex, mesh.vertices().len(), "vertex"))
        .collect::<Result<Vec<_>>>()?;
    let texcoords = corners
        .iter()
        .filter_map(|c| c.texcoord)
        .map(|t| resolve(t, mesh.texcoords().len(), "texture"))
        .collect::<Result<Vec<_>>>()?;
    Ok((vertices, (!texcoords.is_empty()).then(|| texcoords)))
}

/// Writes a [`Mesh`] as OBJ text.
///
/// The output holds, in order: the `mtllib` record (if any), all vertices, all texture
/// coordinates, then the faces in their original order. A `usemtl` record is emitted before
/// every face whose material differs from the last one emitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjWriter {
    /// Fixed number of decimals for coordinates.
    ///
    /// When `None`, the shortest text that parses back to the same `f64` is used.
    pub precision: Option<usize>,
}

impl ObjWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision(precision: Option<usize>) -> Self {
        Self { precision }
    }

    fn number(&self, n: f64) -> String {
        match self.precision {
            Some(precision) => format!("{:.*}", precision, n),
            None => format!("{}", n),
        }
    }

    pub fn write(&self, mesh: &Mesh, out: impl Write) -> io::Result<()> {
        let mut out = io::BufWriter::new(out);
        if let Some(library) = mesh.material_library() {
            writeln!(out, "mtllib {}", library)?;
        }
        for v in mesh.vertices() {
            writeln!(
                out,
                "v {} {} {}",
                self.number(v.x),
                self.number(v.y),
                self.number(v.z)
            )?;
        }
        for t in mesh.texcoords() {
            writeln!(out, "vt {} {}", self.number(t.x), self.number(t.y))?;
        }

        let mut current_material = None;
        for (ix, (face, material)) in mesh.faces().iter().zip(mesh.face_materials()).enumerate() {
            if material != current_material {
                current_material = material;
                // A face without material after one with a material cannot be expressed.
                if let Some(material) = material {
                    writeln!(out, "usemtl {}", material)?;
                }
            }
            out.write_all(b"f")?;
            match mesh.texture_faces().get(ix) {
                Some(texcoords) => {
                    for (v, t) in face.iter().zip(texcoords) {
                        write!(out, " {}/{}", v + 1, t + 1)?;
                    }
                }
                None => {
                    for v in face {
                        write!(out, " {}", v + 1)?;
                    }
                }
            }
            out.write_all(b"\n")?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReferentialError;

    const QUAD: &str = "\
# exported by a photogrammetry tool
mtllib model.mtl

v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0 0.5 0.5 0.5
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl tex_0
f 1/1/1 2/2/1 3/3/1
g unknown_group
usemtl tex_1
f -4/-4 -2/-2 -1/-1
";

    #[test]
    fn parses_records() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.material_library(), Some("model.mtl"));
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.texcoords().len(), 4);
        assert_eq!(mesh.faces(), [vec![0, 1, 2], vec![0, 2, 3]]);
        assert_eq!(mesh.texture_faces(), [vec![0, 1, 2], vec![0, 2, 3]]);
        assert_eq!(
            mesh.face_materials().collect::<Vec<_>>(),
            [Some("tex_0"), Some("tex_1")]
        );
    }

    #[test]
    fn faces_before_usemtl_have_no_material() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\nusemtl a\nf 3 2 1\n").unwrap();
        assert_eq!(
            mesh.face_materials().collect::<Vec<_>>(),
            [None, Some("a")]
        );
        assert!(!mesh.is_textured());
    }

    #[test]
    fn single_component_texcoord() {
        let mesh = parse_obj("vt 0.25\n").unwrap();
        assert_eq!(mesh.texcoords(), [Point2::new(0.25, 0.0)]);
    }

    #[test]
    fn reports_line_of_bad_number() {
        match parse_obj("v 0 0 0\nv 1 zero 0\n") {
            Err(Error::Format { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result {:?}", other),
        }
        match parse_obj("v 0 0\n") {
            Err(Error::Format { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn missing_texcoords_are_surfaced() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2/1 3/1\nf 1 2 3\n";
        match parse_obj(text) {
            Err(Error::Face { line, source }) => {
                assert_eq!(line, 6);
                assert_eq!(source, ReferentialError::MissingTexcoords { face: 1 });
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn partial_texcoords_in_one_face_are_surfaced() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2 3/1\n";
        assert!(matches!(
            parse_obj(text),
            Err(Error::Face {
                line: 5,
                source: ReferentialError::ArityMismatch { .. }
            })
        ));
    }

    #[test]
    fn out_of_bounds_and_zero_indices() {
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n"),
            Err(Error::Face {
                line: 4,
                source: ReferentialError::VertexOutOfBounds { index: 3, .. }
            })
        ));
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n"),
            Err(Error::Format { line: 4, .. })
        ));
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -4 1 2\n"),
            Err(Error::Format { line: 4, .. })
        ));
    }

    #[test]
    fn writes_usemtl_only_on_change() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl a\nf 1 2 3\nf 3 2 1\nusemtl b\nf 1 3 2\nusemtl a\nf 2 1 3\n";
        let mesh = parse_obj(text).unwrap();
        let written = String::from_utf8(mesh.serialize().unwrap()).unwrap();
        assert_eq!(
            written,
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl a\nf 1 2 3\nf 3 2 1\nusemtl b\nf 1 3 2\nusemtl a\nf 2 1 3\n"
        );
    }

    #[test]
    fn fixed_precision() {
        let mesh = parse_obj("v 0.1234567 -2 3\nvt 0.5 1\n").unwrap();
        let mut out = Vec::new();
        ObjWriter::with_precision(Some(6))
            .write(&mesh, &mut out)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "v 0.123457 -2.000000 3.000000\nvt 0.500000 1.000000\n"
        );
    }
}
