use crate::{write_atomic, Error, RecordError, Result};
use georef_core::nalgebra::Point3;
use georef_core::{ApplySimilarity, CameraPoseEntry, SimilarityTransform};
use log::*;
use std::fs;
use std::path::Path;

/// The number of whitespace separated fields on a camera line.
const CAMERA_FIELDS: usize = 11;

/// A camera pose log as written by structure-from-motion tools (the camera section of NVM).
///
/// The layout is two opaque header lines, a line holding the camera count `N`, then `N` camera
/// lines of the form
///
/// ```text
/// <filename> <focal> <qw> <qx> <qy> <qz> <x> <y> <z> <c1> <c2>
/// ```
///
/// Lines inside the camera section that do not have exactly 11 fields are not cameras and are
/// skipped. Everything outside the camera section (the point section of a full NVM file, for
/// instance) is carried along untouched.
///
/// The log remembers every line, including its line ending. Applying a transform rewrites only
/// the camera lines, and on those only the quaternion and position fields change.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseLog {
    lines: Vec<String>,
    /// Index into `lines` and the camera parsed from it.
    cameras: Vec<(usize, CameraPoseEntry)>,
}

impl PoseLog {
    pub fn parse(text: &str) -> Result<Self, RecordError> {
        let lines: Vec<String> = text.split_inclusive('\n').map(str::to_owned).collect();
        if lines.len() < 3 {
            return Err(RecordError::new(
                lines.len() + 1,
                "expected two header lines followed by the camera count",
            ));
        }
        let count: usize = lines[2]
            .trim()
            .parse()
            .map_err(|_| RecordError::new(3, format!("invalid camera count {:?}", lines[2].trim())))?;
        if lines.len() < 3 + count {
            return Err(RecordError::new(
                lines.len() + 1,
                format!(
                    "the log declares {} cameras but only {} lines follow the count",
                    count,
                    lines.len() - 3
                ),
            ));
        }

        let mut cameras = Vec::with_capacity(count);
        for ix in 3..3 + count {
            let fields: Vec<&str> = lines[ix].split_whitespace().collect();
            if fields.len() != CAMERA_FIELDS {
                debug!(
                    "line {}: {} fields, not a camera record",
                    ix + 1,
                    fields.len()
                );
                continue;
            }
            cameras.push((ix, parse_camera(ix + 1, &fields)?));
        }
        info!("read {} camera poses", cameras.len());
        Ok(Self { lines, cameras })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(Error::io(path))?;
        Self::parse(&text).map_err(Error::format(path))
    }

    /// The cameras in the order they appear in the log.
    pub fn entries(&self) -> impl Iterator<Item = &CameraPoseEntry> + '_ {
        self.cameras.iter().map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    pub fn serialize(&self) -> String {
        self.lines.concat()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.serialize().as_bytes())
    }
}

impl ApplySimilarity for PoseLog {
    fn apply_similarity(&mut self, transform: &SimilarityTransform) {
        for (ix, entry) in &mut self.cameras {
            entry.apply_similarity(transform);
            let ending = line_ending(&self.lines[*ix]);
            self.lines[*ix] = format!("{}{}", format_camera(entry), ending);
        }
    }
}

fn parse_camera(line: usize, fields: &[&str]) -> Result<CameraPoseEntry, RecordError> {
    let mut numbers = [0.0; 7];
    for (n, field) in numbers.iter_mut().zip(&fields[2..9]) {
        *n = field
            .parse()
            .ok()
            .filter(|n: &f64| n.is_finite())
            .ok_or_else(|| RecordError::new(line, format!("invalid number {:?}", field)))?;
    }
    let [w, x, y, z, px, py, pz] = numbers;
    if w == 0.0 && x == 0.0 && y == 0.0 && z == 0.0 {
        return Err(RecordError::new(line, "zero quaternion"));
    }
    Ok(CameraPoseEntry::new(
        fields[0],
        fields[1],
        [w, x, y, z],
        Point3::new(px, py, pz),
        fields[9..].iter().map(|&s| s.to_owned()).collect(),
    ))
}

fn format_camera(entry: &CameraPoseEntry) -> String {
    let [w, x, y, z] = entry.orientation_wxyz();
    let p = entry.position;
    let mut line = format!(
        "{} {} {} {} {} {} {} {} {}",
        entry.filename, entry.focal_length, w, x, y, z, p.x, p.y, p.z
    );
    for field in &entry.distortion {
        line.push(' ');
        line.push_str(field);
    }
    line
}

fn line_ending(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}
