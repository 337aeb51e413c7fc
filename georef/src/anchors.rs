use crate::utm;
use crate::{Error, GeoRegisterSettings, Result};
use exif::{Exif, In, Rational, Reader, Tag, Value};
use georef_core::GeoAnchor;
use log::*;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Produces the real-world camera positions of the images in a directory.
pub trait AnchorSource {
    fn extract_anchors(&self, directory: &Path) -> Result<Vec<GeoAnchor>>;
}

/// A WGS84 position read from the GPS tags of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsPosition {
    /// Degrees, negative in the southern hemisphere.
    pub latitude: f64,
    /// Degrees, negative west of Greenwich.
    pub longitude: f64,
    /// Meters, negative below sea level.
    pub altitude: f64,
}

/// Reads EXIF GPS tags and projects them to UTM.
///
/// Only the top level of the directory is scanned, in file name order. Images without a
/// complete GPS position are reported and skipped. All anchors are expected to lie in one UTM
/// zone; a warning is logged when they do not.
#[derive(Debug, Clone)]
pub struct ExifAnchorSource {
    settings: GeoRegisterSettings,
}

impl ExifAnchorSource {
    pub fn new(settings: GeoRegisterSettings) -> Self {
        Self { settings }
    }

    fn images(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(directory).map_err(Error::io(directory))?;
        let mut images = vec![];
        for entry in entries {
            let path = entry.map_err(Error::io(directory))?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |e| self.settings.is_image(e));
            if is_image && path.is_file() {
                images.push(path);
            }
        }
        images.sort();
        Ok(images)
    }
}

impl AnchorSource for ExifAnchorSource {
    fn extract_anchors(&self, directory: &Path) -> Result<Vec<GeoAnchor>> {
        let images = self.images(directory)?;
        info!("found {} images in {}", images.len(), directory.display());

        let mut anchors = vec![];
        let mut zone = None;
        for path in images {
            let filename = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_owned(),
                None => {
                    warn!("{}: file name is not valid UTF-8, skipped", path.display());
                    continue;
                }
            };
            let gps = match read_gps(&path)? {
                Some(gps) => gps,
                None => continue,
            };
            let projected = match utm::from_latlon(gps.latitude, gps.longitude) {
                Ok(projected) => projected,
                Err(e) => {
                    warn!("{}: {}, skipped", path.display(), e);
                    continue;
                }
            };
            match zone {
                None => zone = Some(projected.zone_number),
                Some(z) if z != projected.zone_number => warn!(
                    "{} is in UTM zone {} while earlier images are in zone {}",
                    filename, projected.zone_number, z
                ),
                Some(_) => {}
            }
            debug!(
                "{}: lat {} lon {} alt {} -> E {} N {}",
                filename,
                gps.latitude,
                gps.longitude,
                gps.altitude,
                projected.easting,
                projected.northing
            );
            anchors.push(GeoAnchor::new(
                filename,
                projected.easting,
                projected.northing,
                gps.altitude,
            ));
        }
        info!("read GPS positions from {} images", anchors.len());
        Ok(anchors)
    }
}

/// Reads the GPS position of one image.
///
/// An image that cannot be opened is an error. An image without EXIF data or without a
/// complete set of GPS tags yields `None` and a warning.
pub fn read_gps(path: &Path) -> Result<Option<GpsPosition>> {
    let file = File::open(path).map_err(Error::io(path))?;
    let exif = match Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => exif,
        Err(e) => {
            warn!("{}: no EXIF data ({}), skipped", path.display(), e);
            return Ok(None);
        }
    };
    let gps = gps_position(&exif);
    if gps.is_none() {
        warn!("{}: no complete GPS position, skipped", path.display());
    }
    Ok(gps)
}

fn gps_position(exif: &Exif) -> Option<GpsPosition> {
    let latitude = signed_degrees(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let longitude = signed_degrees(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;
    let altitude = *rationals(exif, Tag::GPSAltitude)?.first()?;
    let below_sea_level = match exif.get_field(Tag::GPSAltitudeRef, In::PRIMARY) {
        Some(field) => matches!(&field.value, Value::Byte(b) if b.first() == Some(&1)),
        None => false,
    };
    Some(GpsPosition {
        latitude,
        longitude,
        altitude: if below_sea_level { -altitude } else { altitude },
    })
}

/// Degrees, minutes and seconds folded into degrees, negated for the `negative` hemisphere.
fn signed_degrees(exif: &Exif, value: Tag, reference: Tag, negative: u8) -> Option<f64> {
    let dms = rationals(exif, value)?;
    if dms.is_empty() {
        return None;
    }
    let degrees: f64 = dms
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(v, divisor)| v / divisor)
        .sum();
    let hemisphere = match &exif.get_field(reference, In::PRIMARY)?.value {
        Value::Ascii(strings) => strings.first()?.first()?.to_ascii_uppercase(),
        _ => return None,
    };
    Some(if hemisphere == negative {
        -degrees
    } else {
        degrees
    })
}

fn rationals(exif: &Exif, tag: Tag) -> Option<Vec<f64>> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(values) => Some(values.iter().map(Rational::to_f64).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_images_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.JPG", "a.png", "notes.txt", "b.jpeg", "d"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let source = ExifAnchorSource::new(GeoRegisterSettings::default());
        let names: Vec<_> = source
            .images(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, ["a.png", "b.jpeg", "c.JPG"]);
    }

    #[test]
    fn images_without_exif_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"not really a jpeg").unwrap();
        let source = ExifAnchorSource::new(GeoRegisterSettings::default());
        assert!(source.extract_anchors(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = ExifAnchorSource::new(GeoRegisterSettings::default());
        assert!(source.extract_anchors(&dir.path().join("missing")).is_err());
    }
}
