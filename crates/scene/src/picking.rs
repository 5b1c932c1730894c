use foundation::math::{Ray, Vec3};

use crate::prefabs::{IcoSphere, face_normal};

/// Pick rays stop this far from the eye plane, which leaves only the near
/// hemisphere of the unit globe reachable from a camera at distance 1.1.
pub const PICK_MAX_DISTANCE: f64 = 1.15;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub triangle: usize,
    pub distance: f64,
    pub point: Vec3,
    /// Outward normal of the hit triangle; a unit vector, so it doubles as
    /// the marker position snapped to facet resolution.
    pub face_normal: Vec3,
}

/// Closest front-facing triangle hit along `ray`, within `ray.max_distance`.
///
/// Triangles facing away from the ray are skipped, so a ray entering the
/// sphere never reports the far side.
pub fn pick_mesh(mesh: &IcoSphere, ray: Ray) -> Option<PickHit> {
    let dir = ray.direction.normalized()?;
    if !hits_bounding_sphere(mesh.radius, ray.origin, dir, ray.max_distance) {
        return None;
    }

    let mut best: Option<PickHit> = None;
    for (index, tri) in mesh.triangles.iter().enumerate() {
        let [a, b, c] = tri.map(|i| mesh.vertices[i as usize]);
        let Some(normal) = face_normal(a, b, c) else {
            continue;
        };
        if normal.dot(dir) >= 0.0 {
            continue;
        }
        let Some(t) = ray_triangle_t(ray.origin, dir, a, b, c) else {
            continue;
        };
        if t > ray.max_distance {
            continue;
        }
        if best.is_some_and(|hit| hit.distance <= t) {
            continue;
        }
        best = Some(PickHit {
            triangle: index,
            distance: t,
            point: ray.origin + dir * t,
            face_normal: normal,
        });
    }
    best
}

fn hits_bounding_sphere(radius: f64, origin: Vec3, dir: Vec3, max_distance: f64) -> bool {
    // Slightly inflated so flat facets near the silhouette are not rejected.
    let r = radius * 1.0001;
    let b = origin.dot(dir);
    let c = origin.dot(origin) - r * r;
    let disc = b * b - c;
    if disc < 0.0 {
        return false;
    }
    let t_near = -b - disc.sqrt();
    let t_far = -b + disc.sqrt();
    t_far >= 0.0 && t_near <= max_distance
}

/// Möller–Trumbore; returns the distance along a unit `dir`.
fn ray_triangle_t(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f64> {
    const EPS: f64 = 1e-12;
    let e1 = b - a;
    let e2 = c - a;
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPS {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = dir.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv;
    (t >= 0.0).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::{PICK_MAX_DISTANCE, pick_mesh};
    use crate::prefabs::IcoSphere;
    use foundation::math::{OrthoCamera, Ray, Vec2, Vec3};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn center_ray_hits_the_near_side() {
        let mesh = IcoSphere::new(1.0, 6);
        let cam = OrthoCamera::default();
        let ray = cam.ray_from_ndc(Vec2::new(0.0, 0.0), PICK_MAX_DISTANCE);
        let hit = pick_mesh(&mesh, ray).expect("hit");
        assert!(hit.point.z > 0.9);
        assert!(hit.distance > 0.09 && hit.distance < 0.2);
        assert!(hit.face_normal.z > 0.95);
        assert_close(hit.face_normal.length(), 1.0, 1e-9);
    }

    #[test]
    fn ray_outside_the_disc_misses() {
        let mesh = IcoSphere::new(1.0, 4);
        let cam = OrthoCamera::default();
        let ray = cam.ray_from_ndc(Vec2::new(0.95, 0.95), PICK_MAX_DISTANCE);
        assert!(pick_mesh(&mesh, ray).is_none());
    }

    #[test]
    fn max_distance_limits_the_hit() {
        let mesh = IcoSphere::new(1.0, 4);
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
            max_distance: PICK_MAX_DISTANCE,
        };
        assert!(pick_mesh(&mesh, ray).is_none());
    }

    #[test]
    fn ray_from_inside_sees_no_front_face() {
        let mesh = IcoSphere::new(1.0, 2);
        let ray = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::new(0.0, 0.0, 1.0),
            max_distance: 10.0,
        };
        assert!(pick_mesh(&mesh, ray).is_none());
    }

    #[test]
    fn hit_normal_matches_off_axis_direction() {
        let mesh = IcoSphere::new(1.0, 22);
        let cam = OrthoCamera::default();
        let ray = cam.ray_from_ndc(Vec2::new(0.3, -0.2), PICK_MAX_DISTANCE);
        let hit = pick_mesh(&mesh, ray).expect("hit");
        let exact = hit.point.normalized().expect("non-zero");
        // Facet resolution at detail 22 is a few degrees at most.
        assert!(hit.face_normal.dot(exact) > 0.995);
    }
}
