//! WGS84 latitude and longitude to Universal Transverse Mercator.
//!
//! The projection itself is done by the [`utm`](::utm) crate. This module adds the range checks
//! and the zone handling the anchor source relies on.

use thiserror::Error;

const SOUTHERN_FALSE_NORTHING: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum UtmError {
    #[error("latitude {0} is outside the UTM range [-80, 84]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmCoordinate {
    pub easting: f64,
    pub northing: f64,
    pub zone_number: u8,
    pub zone_letter: char,
}

/// Projects a WGS84 position given in degrees.
///
/// Northings in the southern hemisphere carry the 10 000 km false northing.
pub fn from_latlon(latitude: f64, longitude: f64) -> Result<UtmCoordinate, UtmError> {
    if !(-80.0..=84.0).contains(&latitude) {
        return Err(UtmError::LatitudeOutOfRange(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(UtmError::LongitudeOutOfRange(longitude));
    }
    let zone_letter =
        ::utm::lat_to_zone_letter(latitude).ok_or(UtmError::LatitudeOutOfRange(latitude))?;
    let zone_number = zone_number(latitude, longitude);
    let (mut northing, easting, _convergence) =
        ::utm::to_utm_wgs84(latitude, wrap_longitude(longitude), zone_number);
    if northing < 0.0 {
        northing += SOUTHERN_FALSE_NORTHING;
    }
    Ok(UtmCoordinate {
        easting,
        northing,
        zone_number,
        zone_letter,
    })
}

/// The zone a position falls in, including the exceptions around Norway and Svalbard.
pub fn zone_number(latitude: f64, longitude: f64) -> u8 {
    ::utm::lat_lon_to_zone_number(latitude, wrap_longitude(longitude))
}

/// 180 belongs to zone 1 like -180.
fn wrap_longitude(longitude: f64) -> f64 {
    if longitude >= 180.0 {
        longitude - 360.0
    } else {
        longitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn northern_hemisphere() {
        let utm = from_latlon(51.2, 7.5).unwrap();
        assert_relative_eq!(utm.easting, 395_201.31, epsilon = 0.01);
        assert_relative_eq!(utm.northing, 5_673_135.24, epsilon = 0.01);
        assert_eq!((utm.zone_number, utm.zone_letter), (32, 'U'));
    }

    #[test]
    fn southern_hemisphere_gets_false_northing() {
        let utm = from_latlon(-33.8688, 151.2093).unwrap();
        assert_eq!((utm.zone_number, utm.zone_letter), (56, 'H'));
        assert_relative_eq!(utm.easting, 334_369.0, epsilon = 1.0);
        assert_relative_eq!(utm.northing, 6_250_948.0, epsilon = 1.0);
    }

    #[test]
    fn central_meridian_is_at_false_easting() {
        let utm = from_latlon(10.0, 9.0).unwrap();
        assert_eq!(utm.zone_number, 32);
        assert_relative_eq!(utm.easting, 500_000.0, epsilon = 1e-6);
    }

    #[test]
    fn zone_exceptions() {
        assert_eq!(zone_number(60.0, 5.0), 32);
        assert_eq!(zone_number(60.0, 2.0), 31);
        assert_eq!(zone_number(78.0, 10.0), 33);
        assert_eq!(zone_number(78.0, 35.0), 37);
        assert_eq!(zone_number(0.0, -180.0), 1);
        assert_eq!(zone_number(0.0, 180.0), 1);
        assert_eq!(zone_number(0.0, 179.9), 60);
    }

    #[test]
    fn rejects_polar_latitudes() {
        assert_eq!(
            from_latlon(85.0, 0.0),
            Err(UtmError::LatitudeOutOfRange(85.0))
        );
        assert!(from_latlon(0.0, 181.0).is_err());
    }
}
