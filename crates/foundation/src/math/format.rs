use super::GeoPoint;

/// `"12.3400°N"`: absolute value to four decimals plus a direction letter.
/// Anything that rounds to zero takes the positive direction.
pub fn format_coordinate(value: f64, positive: char, negative: char) -> String {
    let rounded = (value * 1e4).round() / 1e4;
    let direction = if rounded >= 0.0 { positive } else { negative };
    format!("{:.4}°{}", value.abs(), direction)
}

pub fn format_lat_long(latitude: f64, longitude: f64) -> String {
    format!(
        "{}, {}",
        format_coordinate(latitude, 'N', 'S'),
        format_coordinate(longitude, 'E', 'W')
    )
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_lat_long(self.latitude(), self.longitude()))
    }
}

#[cfg(test)]
mod tests {
    use super::{format_coordinate, format_lat_long};
    use crate::math::GeoPoint;

    #[test]
    fn zero_uses_positive_directions() {
        assert_eq!(format_lat_long(0.0, 0.0), "0.0000°N, 0.0000°E");
    }

    #[test]
    fn negatives_use_negative_directions() {
        assert_eq!(format_lat_long(-33.8688, -70.5), "33.8688°S, 70.5000°W");
    }

    #[test]
    fn tiny_negatives_read_as_zero() {
        assert_eq!(format_lat_long(-1e-12, -0.00004), "0.0000°N, 0.0000°E");
    }

    #[test]
    fn rounds_to_four_decimals() {
        assert_eq!(format_coordinate(12.345678, 'N', 'S'), "12.3457°N");
    }

    #[test]
    fn geopoint_display_matches_label() {
        let p = GeoPoint::new(12.34, 56.78).expect("valid");
        assert_eq!(p.to_string(), "12.3400°N, 56.7800°E");
    }
}
