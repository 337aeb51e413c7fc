use crate::{write_atomic, Error, RecordError, Result};
use georef_core::nalgebra::{Quaternion, UnitQuaternion, Vector3};
use georef_core::SimilarityTransform;
use log::*;
use std::fs;
use std::path::Path;

/// The contents of a transform parameter file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformParameters {
    pub transform: SimilarityTransform,
    /// Set when the stored quaternion was not of unit norm and had to be renormalized.
    pub renormalized: bool,
}

/// Parses a transform parameter file: one line of exactly eight numbers,
/// `scale qw qx qy qz tx ty tz`. Anything after the first line is ignored.
///
/// A quaternion whose norm differs from one by more than `tolerance` is renormalized with a
/// warning. The scale must be positive and every number finite.
pub fn parse_parameters(text: &str, tolerance: f64) -> Result<TransformParameters, RecordError> {
    let line = text.lines().next().unwrap_or_default();
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 8 {
        return Err(RecordError::new(
            1,
            format!("expected 8 numbers but found {} fields", fields.len()),
        ));
    }
    let mut numbers = [0.0; 8];
    for (n, field) in numbers.iter_mut().zip(&fields) {
        *n = field
            .parse()
            .ok()
            .filter(|n: &f64| n.is_finite())
            .ok_or_else(|| RecordError::new(1, format!("invalid number {:?}", field)))?;
    }
    let [scale, w, x, y, z, tx, ty, tz] = numbers;
    if scale <= 0.0 {
        return Err(RecordError::new(1, format!("scale {} is not positive", scale)));
    }

    let quaternion = Quaternion::new(w, x, y, z);
    let norm = quaternion.norm();
    if norm == 0.0 {
        return Err(RecordError::new(1, "zero quaternion"));
    }
    let renormalized = (norm - 1.0).abs() > tolerance;
    if renormalized {
        warn!(
            "quaternion ({} {} {} {}) has norm {}, renormalizing",
            w, x, y, z, norm
        );
    }
    Ok(TransformParameters {
        transform: SimilarityTransform::from_quaternion(
            scale,
            UnitQuaternion::new_normalize(quaternion),
            Vector3::new(tx, ty, tz),
        ),
        renormalized,
    })
}

/// Like [`parse_parameters`], keeping only the transform.
pub fn parse_transform(text: &str, tolerance: f64) -> Result<SimilarityTransform, RecordError> {
    parse_parameters(text, tolerance).map(|p| p.transform)
}

/// Formats a transform as one line of eight numbers, with the quaternion in canonical sign.
pub fn format_transform(transform: &SimilarityTransform) -> String {
    let q = transform.quaternion();
    let t = transform.translation;
    format!(
        "{} {} {} {} {} {} {} {}\n",
        transform.scale, q.w, q.i, q.j, q.k, t.x, t.y, t.z
    )
}

pub fn read_parameters(path: &Path, tolerance: f64) -> Result<TransformParameters> {
    let text = fs::read_to_string(path).map_err(Error::io(path))?;
    parse_parameters(&text, tolerance).map_err(Error::format(path))
}

pub fn read_transform(path: &Path, tolerance: f64) -> Result<SimilarityTransform> {
    read_parameters(path, tolerance).map(|p| p.transform)
}

pub fn write_transform(path: &Path, transform: &SimilarityTransform) -> Result<()> {
    write_atomic(path, format_transform(transform).as_bytes())
}
