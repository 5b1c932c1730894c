//! Latitude/longitude on the unit globe.
//!
//! The globe is a sphere of radius 1 centered at the origin with +Y through the
//! north pole. Longitude 0 sits on +X and longitude 90°E on -Z.

use serde::{Deserialize, Serialize};

use super::Vec3;

/// A validated geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Copy, Clone, Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GeoPointError {
    NotFinite,
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl std::fmt::Display for GeoPointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoPointError::NotFinite => write!(f, "coordinate is not a finite number"),
            GeoPointError::LatitudeOutOfRange(v) => {
                write!(f, "latitude {v} outside [-90, 90]")
            }
            GeoPointError::LongitudeOutOfRange(v) => {
                write!(f, "longitude {v} outside [-180, 180]")
            }
        }
    }
}

impl std::error::Error for GeoPointError {}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoPointError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoPointError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeoPointError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoPointError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoPointError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn to_vector(&self, radius: f64) -> Vec3 {
        to_vector(self.latitude, self.longitude, radius)
    }
}

/// Spherical to Cartesian.
pub fn to_vector(latitude: f64, longitude: f64, radius: f64) -> Vec3 {
    let phi = (90.0 - latitude).to_radians();
    let theta = (longitude + 180.0).to_radians();
    Vec3::new(
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Cartesian (unit length) to `(latitude, longitude)` in degrees.
///
/// Inverse of [`to_vector`]. No bounds checking: a non-unit input yields a
/// meaningless latitude. The `acos` argument is clamped only so rounding on
/// the poles cannot produce NaN.
pub fn to_lat_long(point: Vec3) -> (f64, f64) {
    let latitude = 90.0 - point.y.clamp(-1.0, 1.0).acos().to_degrees();
    let longitude = (90.0 + point.x.atan2(point.z).to_degrees()).rem_euclid(360.0) - 180.0;
    (latitude, longitude)
}

#[cfg(test)]
mod tests {
    use super::{GeoPoint, GeoPointError, to_lat_long, to_vector};
    use crate::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn equator_prime_meridian_is_positive_x() {
        let p = to_vector(0.0, 0.0, 1.0);
        assert_close(p.x, 1.0, 1e-12);
        assert_close(p.y, 0.0, 1e-12);
        assert_close(p.z, 0.0, 1e-12);
    }

    #[test]
    fn north_pole_is_positive_y() {
        let p = to_vector(90.0, 42.0, 2.0);
        assert_close(p.y, 2.0, 1e-12);
        assert_close(p.x, 0.0, 1e-12);
        assert_close(p.z, 0.0, 1e-12);
    }

    #[test]
    fn radius_scales_linearly() {
        let a = to_vector(12.0, -45.0, 1.0);
        let b = to_vector(12.0, -45.0, 1.01);
        assert_close(b.length(), 1.01, 1e-12);
        assert_close(b.x / a.x, 1.01, 1e-12);
    }

    #[test]
    fn round_trip_over_the_grid() {
        let mut lat = -89.9;
        while lat <= 89.9 {
            let mut long = -179.9;
            while long <= 179.9 {
                let (lat_rt, long_rt) = to_lat_long(to_vector(lat, long, 1.0));
                assert_close(lat_rt, lat, 1e-6);
                assert_close(long_rt, long, 1e-6);
                long += 7.3;
            }
            lat += 4.1;
        }
    }

    #[test]
    fn round_trip_near_the_antimeridian() {
        for long in [-179.9, 179.9, -0.0001, 0.0001] {
            let (_, long_rt) = to_lat_long(to_vector(10.0, long, 1.0));
            assert_close(long_rt, long, 1e-6);
        }
    }

    #[test]
    fn rounding_above_one_does_not_produce_nan() {
        let (lat, _) = to_lat_long(Vec3::new(0.0, 1.0 + 1e-15, 0.0));
        assert_close(lat, 90.0, 1e-9);
    }

    #[test]
    fn checked_constructor_rejects_out_of_range() {
        assert_eq!(
            GeoPoint::new(91.0, 0.0),
            Err(GeoPointError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            GeoPoint::new(0.0, -180.5),
            Err(GeoPointError::LongitudeOutOfRange(-180.5))
        );
        assert_eq!(GeoPoint::new(f64::NAN, 0.0), Err(GeoPointError::NotFinite));
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn deserialize_validates_range() {
        let ok: GeoPoint = serde_json::from_str(r#"{"latitude":12.34,"longitude":56.78}"#)
            .expect("valid point");
        assert_eq!(ok.latitude(), 12.34);
        assert_eq!(ok.longitude(), 56.78);

        let bad = serde_json::from_str::<GeoPoint>(r#"{"latitude":120.0,"longitude":0.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn serializes_with_field_names() {
        let p = GeoPoint::new(51.5, -0.12).expect("valid");
        let json = serde_json::to_string(&p).expect("json");
        assert_eq!(json, r#"{"latitude":51.5,"longitude":-0.12}"#);
    }
}
