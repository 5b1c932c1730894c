//! Node locations in feed messages.
//!
//! A feed message is a flat JSON array of `action, payload` pairs. Two
//! payload layouts carry a location:
//! - "added node": a long array whose element 6 is `[lat, long, city?]`
//! - "located node" (after action code 5): `[node_id, lat, long, city?]`
//!
//! Every array element of the message is checked against the first layout;
//! the second is only considered right after action 5. Anything else is
//! ignored.

use foundation::math::GeoPoint;
use serde_json::Value;
use tracing::debug;

/// Action code preceding a "located node" payload.
pub const LOCATED_NODE_ACTION: u64 = 5;
const ADDED_NODE_LOCATION_INDEX: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub point: GeoPoint,
    pub name: Option<String>,
}

pub fn extract_locations(message: &Value) -> Vec<Location> {
    let Some(items) = message.as_array() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let Some(payload) = item.as_array() else {
            continue;
        };

        if let Some(location) = payload.get(ADDED_NODE_LOCATION_INDEX).and_then(Value::as_array)
            && let Some(found) = location_from(location, 0)
        {
            out.extend(found);
            continue;
        }

        let after_located_action = index
            .checked_sub(1)
            .and_then(|prev| items[prev].as_u64())
            == Some(LOCATED_NODE_ACTION);
        if after_located_action && let Some(found) = location_from(payload, 1) {
            out.extend(found);
        }
    }
    out
}

/// Reads `[lat, long, name?]` starting at `offset`.
///
/// `None` when the shape does not match; `Some(None)` when it matches but the
/// coordinates are out of range.
fn location_from(values: &[Value], offset: usize) -> Option<Option<Location>> {
    let lat = values.get(offset)?.as_f64()?;
    let long = values.get(offset + 1)?.as_f64()?;
    let name = values
        .get(offset + 2)
        .and_then(Value::as_str)
        .map(str::to_string);

    match GeoPoint::new(lat, long) {
        Ok(point) => Some(Some(Location { point, name })),
        Err(err) => {
            debug!("dropping feed location ({lat}, {long}): {err}");
            Some(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Location, extract_locations};
    use foundation::math::GeoPoint;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn location(lat: f64, long: f64, name: Option<&str>) -> Location {
        Location {
            point: GeoPoint::new(lat, long).expect("valid"),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn payload_at_index_five_with_location_at_six() {
        let message = json!([0, 1, 2, 3, 4, [0, 1, 2, 3, 4, 5, [51.5, -0.12]]]);
        assert_eq!(
            extract_locations(&message),
            vec![location(51.5, -0.12, None)]
        );
    }

    #[test]
    fn added_node_payload_with_city() {
        let message = json!([
            0, 32,
            3, [42, ["node-a", "impl", "1.0", null, null], [1, 2], [[], []], [[], [], []], [100, "0xab", 6000, 1, null], [48.85, 2.35, "Paris"], 1700000000000u64]
        ]);
        assert_eq!(
            extract_locations(&message),
            vec![location(48.85, 2.35, Some("Paris"))]
        );
    }

    #[test]
    fn located_node_after_action_five() {
        let message = json!([5, [42, -33.87, 151.21, "Sydney"], 5, [43, 35.68, 139.69, "Tokyo"]]);
        assert_eq!(
            extract_locations(&message),
            vec![
                location(-33.87, 151.21, Some("Sydney")),
                location(35.68, 139.69, Some("Tokyo"))
            ]
        );
    }

    #[test]
    fn located_layout_needs_the_action_code() {
        let message = json!([4, [42, -33.87, 151.21, "Sydney"]]);
        assert!(extract_locations(&message).is_empty());
    }

    #[test]
    fn null_location_is_ignored() {
        let message = json!([3, [1, [], [], [], [], [], null, 0]]);
        assert!(extract_locations(&message).is_empty());
    }

    #[test]
    fn out_of_range_coordinates_are_dropped() {
        let message = json!([5, [1, 123.0, 10.0, "Nowhere"], 5, [2, 10.0, 10.0, "Somewhere"]]);
        assert_eq!(
            extract_locations(&message),
            vec![location(10.0, 10.0, Some("Somewhere"))]
        );
    }

    #[test]
    fn top_level_triples_are_not_locations() {
        let message = json!([[51.5, -0.12, "London"]]);
        assert!(extract_locations(&message).is_empty());
    }

    #[test]
    fn non_array_messages_yield_nothing() {
        assert!(extract_locations(&json!({"lat": 1, "lon": 2})).is_empty());
        assert!(extract_locations(&json!("hello")).is_empty());
    }
}
