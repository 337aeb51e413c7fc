use crate::{write_atomic, Error, Result};
use georef_core::nalgebra::Point3;
use georef_core::{ApplySimilarity, SimilarityTransform};
use log::*;
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const VERTEX: &str = "vertex";
const COORDINATES: [&str; 3] = ["x", "y", "z"];

/// A PLY point cloud.
///
/// Only the `x`, `y` and `z` properties of the `vertex` element are interpreted. Every other
/// element and property, the comments and the encoding are written back as they were read.
/// Positions may be read as `float` or `double`. Transformed positions are always stored as
/// `double`, since `float` cannot hold UTM coordinates to better than half a meter.
#[derive(Debug)]
pub struct PointCloud {
    ply: Ply<DefaultElement>,
}

impl PointCloud {
    /// Builds an ASCII cloud with `double` coordinates.
    pub fn from_points(points: &[Point3<f64>]) -> Self {
        let mut ply = Ply::<DefaultElement>::new();
        ply.header.encoding = Encoding::Ascii;

        let mut vertex_element = ElementDef::new(VERTEX.to_string());
        for name in COORDINATES {
            let p = PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::Double));
            vertex_element.properties.add(p);
        }
        ply.header.elements.add(vertex_element);

        let vertices = points
            .iter()
            .map(|p| {
                let mut vertex = DefaultElement::new();
                for (name, &value) in COORDINATES.iter().zip(p.iter()) {
                    vertex.insert(name.to_string(), Property::Double(value));
                }
                vertex
            })
            .collect();
        ply.payload.insert(VERTEX.to_string(), vertices);
        Self { ply }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(Error::io(path))?;
        let mut reader = BufReader::new(file);
        let ply = Parser::<DefaultElement>::new()
            .read_ply(&mut reader)
            .map_err(|e| Error::PointCloud {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
        let cloud = Self::from_ply(ply).map_err(|reason| Error::PointCloud {
            path: path.to_owned(),
            reason,
        })?;
        info!("read {} points from {}", cloud.len(), path.display());
        Ok(cloud)
    }

    /// Checks that `ply` holds a `vertex` element with floating point coordinates.
    pub fn from_ply(ply: Ply<DefaultElement>) -> Result<Self, String> {
        let element = ply
            .header
            .elements
            .get(VERTEX)
            .ok_or_else(|| "no vertex element".to_string())?;
        for name in COORDINATES {
            match element.properties.get(name).map(|p| &p.data_type) {
                Some(PropertyType::Scalar(ScalarType::Float))
                | Some(PropertyType::Scalar(ScalarType::Double)) => {}
                Some(other) => {
                    return Err(format!(
                        "vertex property {} has type {:?}, expected float or double",
                        name, other
                    ))
                }
                None => return Err(format!("vertex element has no {} property", name)),
            }
        }
        if let Some(vertices) = ply.payload.get(VERTEX) {
            for (ix, vertex) in vertices.iter().enumerate() {
                if COORDINATES.iter().any(|name| coordinate(vertex, name).is_none()) {
                    return Err(format!("vertex {} has no floating point position", ix));
                }
            }
        }
        Ok(Self { ply })
    }

    pub fn len(&self) -> usize {
        self.ply.payload.get(VERTEX).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> Vec<Point3<f64>> {
        self.ply
            .payload
            .get(VERTEX)
            .map(|vertices| vertices.iter().map(position).collect())
            .unwrap_or_default()
    }

    pub fn ply(&self) -> &Ply<DefaultElement> {
        &self.ply
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        let mut out = Vec::new();
        Writer::<DefaultElement>::new()
            .write_ply(&mut out, &mut self.ply)
            .map_err(Error::io(path))?;
        write_atomic(path, &out)
    }
}

impl ApplySimilarity for PointCloud {
    fn apply_similarity(&mut self, transform: &SimilarityTransform) {
        if let Some(element) = self.ply.header.elements.get_mut(VERTEX) {
            for name in COORDINATES {
                if let Some(property) = element.properties.get_mut(name) {
                    property.data_type = PropertyType::Scalar(ScalarType::Double);
                }
            }
        }
        let vertices = match self.ply.payload.get_mut(VERTEX) {
            Some(vertices) => vertices,
            None => return,
        };
        for vertex in vertices {
            let moved = transform.transform_point(&position(vertex));
            for (name, &value) in COORDINATES.iter().zip(moved.iter()) {
                vertex.insert(name.to_string(), Property::Double(value));
            }
        }
    }
}

fn coordinate(vertex: &DefaultElement, name: &str) -> Option<f64> {
    match vertex.get(name) {
        Some(Property::Float(v)) => Some(f64::from(*v)),
        Some(Property::Double(v)) => Some(*v),
        _ => None,
    }
}

/// Positions were checked when the cloud was built.
fn position(vertex: &DefaultElement) -> Point3<f64> {
    let [x, y, z] = COORDINATES.map(|name| coordinate(vertex, name).unwrap_or(f64::NAN));
    Point3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use georef_core::nalgebra::{Rotation3, Vector3};

    const FLOAT_CLOUD: &str = "ply
format ascii 1.0
comment written by a scanner
element vertex 2
property float x
property float y
property float z
property uchar red
property uchar green
property uchar blue
end_header
1 2 3 255 0 0
-1 0 0.5 0 255 0
";

    fn parse(text: &str) -> Result<PointCloud, String> {
        let ply = Parser::<DefaultElement>::new()
            .read_ply(&mut text.as_bytes())
            .map_err(|e| e.to_string())?;
        PointCloud::from_ply(ply)
    }

    #[test]
    fn keeps_extra_properties() {
        let mut cloud = parse(FLOAT_CLOUD).unwrap();
        assert_eq!(cloud.points()[1], Point3::new(-1.0, 0.0, 0.5));

        cloud.apply_similarity(&SimilarityTransform::new(
            2.0,
            Rotation3::identity(),
            Vector3::new(0.5, 0.0, 0.0),
        ));
        assert_eq!(cloud.points()[0], Point3::new(2.5, 4.0, 6.0));

        let vertex = &cloud.ply().payload[VERTEX][0];
        assert_eq!(vertex.get("x"), Some(&Property::Double(2.5)));
        assert_eq!(vertex.get("red"), Some(&Property::UChar(255)));
        assert_eq!(cloud.ply().header.comments, ["written by a scanner"]);
        assert_eq!(cloud.ply().header.encoding, Encoding::Ascii);
    }

    #[test]
    fn float_positions_are_widened_to_double() {
        let mut cloud = parse(FLOAT_CLOUD).unwrap();
        let transform = SimilarityTransform::new(
            37.5,
            Rotation3::from_euler_angles(0.05, -0.02, 1.3),
            Vector3::new(431_250.0, 4_581_900.0, 215.0),
        );
        let expected: Vec<_> = cloud
            .points()
            .iter()
            .map(|p| transform.transform_point(p))
            .collect();
        cloud.apply_similarity(&transform);

        let mut out = Vec::new();
        Writer::<DefaultElement>::new()
            .write_ply(&mut out, &mut cloud.ply)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("property double x\nproperty double y\nproperty double z\n"));
        assert!(text.contains("property uchar red\n"));

        let reread = parse(&text).unwrap();
        for (a, b) in reread.points().iter().zip(&expected) {
            assert!((a - b).norm() < 1e-6, "{} != {}", a, b);
        }
        let vertex = &reread.ply().payload[VERTEX][1];
        assert_eq!(vertex.get("green"), Some(&Property::UChar(255)));
    }

    #[test]
    fn rejects_integer_positions() {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty int x\nproperty int y\nproperty int z\nend_header\n1 2 3\n";
        assert!(parse(text).is_err());
        let text = "ply\nformat ascii 1.0\nelement face 0\nproperty list uchar int vertex_index\nend_header\n";
        assert!(parse(text).is_err());
    }

    #[test]
    fn from_points_holds_positions() {
        let points = [Point3::new(0.1, 0.2, 0.3), Point3::new(511_000.5, 4e6, -3.0)];
        let cloud = PointCloud::from_points(&points);
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.points(), points);
    }
}
