use foundation::math::{GeoPoint, Vec3, format_lat_long, to_lat_long};
use foundation::time::{Easing, Time, Tween};

use crate::prefabs::IcoSphere;

/// Feed and stored markers float just above the dots.
pub const MARKER_ALTITUDE: f64 = 1.01;
pub const MARKER_SIZE: f64 = 0.02;
pub const POINTER_SIZE: f64 = 0.04;
/// The pointer drops in from this multiple of its resting position.
pub const POINTER_LIFT_FROM: f64 = 1.3;
pub const POINTER_LIFT_S: f64 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub point: GeoPoint,
    pub position: Vec3,
    pub label: Option<String>,
}

/// The marker placed by the last confirmed click (or feed retarget).
#[derive(Debug, Clone, PartialEq)]
pub struct Pointer {
    /// Resting position; a unit vector.
    pub position: Vec3,
    pub label: String,
    placed_at: Time,
    lifted: bool,
}

impl Pointer {
    /// Position at `now`, including the drop-in animation after a click.
    pub fn animated_position(&self, now: Time) -> Vec3 {
        if !self.lifted {
            return self.position;
        }
        let scale = Tween::new(POINTER_LIFT_FROM, 1.0, 0.0, POINTER_LIFT_S)
            .with_easing(Easing::Power3Out)
            .value_at(now.since(self.placed_at));
        self.position * scale
    }
}

/// Everything drawn on and around the globe.
#[derive(Debug, Clone)]
pub struct GlobeScene {
    pick_mesh: IcoSphere,
    markers: Vec<Marker>,
    pointer: Option<Pointer>,
}

impl Default for GlobeScene {
    fn default() -> Self {
        Self::new(IcoSphere::globe())
    }
}

impl GlobeScene {
    pub fn new(pick_mesh: IcoSphere) -> Self {
        Self {
            pick_mesh,
            markers: Vec::new(),
            pointer: None,
        }
    }

    pub fn pick_mesh(&self) -> &IcoSphere {
        &self.pick_mesh
    }

    /// Adds a marker sphere above `point`. Duplicates are kept.
    pub fn add_marker(&mut self, point: GeoPoint, label: Option<String>) -> &Marker {
        self.markers.push(Marker {
            point,
            position: point.to_vector(MARKER_ALTITUDE),
            label,
        });
        &self.markers[self.markers.len() - 1]
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn pointer(&self) -> Option<&Pointer> {
        self.pointer.as_ref()
    }

    /// Moves the pointer to `normal` (a face normal from a pick) and labels it
    /// with its coordinates. Returns the label.
    pub fn place_pointer(&mut self, normal: Vec3, now: Time, lifted: bool) -> &str {
        let (lat, lon) = to_lat_long(normal);
        let pointer = self.pointer.insert(Pointer {
            position: normal,
            label: format_lat_long(lat, lon),
            placed_at: now,
            lifted,
        });
        &pointer.label
    }
}
