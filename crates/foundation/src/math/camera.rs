//! Orthographic camera math: view transform, projection to NDC, pick rays.

use super::{Vec2, Vec3};

/// A ray with a unit direction, limited to `max_distance`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: f64,
}

impl Ray {
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Screen rectangle of the element receiving pointer events, in CSS pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Symmetric orthographic camera looking at `target` from `eye`.
///
/// The frustum spans `[-half_extent, half_extent]` on both axes regardless of
/// the surface aspect ratio; the globe surface is always square.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrthoCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub half_extent: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for OrthoCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 1.1),
            target: Vec3::ZERO,
            up: Vec3::Y,
            half_extent: 1.1,
            near: 0.0,
            far: 3.0,
        }
    }
}

/// Right-handed camera frame; `back` points from the target toward the eye.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraBasis {
    pub right: Vec3,
    pub up: Vec3,
    pub back: Vec3,
}

impl OrthoCamera {
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        Self {
            eye,
            target,
            ..Self::default()
        }
    }

    pub fn basis(&self) -> CameraBasis {
        let back = (self.eye - self.target).normalized().unwrap_or(Vec3::new(0.0, 0.0, 1.0));
        let right = self
            .up
            .cross(back)
            .normalized()
            .unwrap_or(Vec3::new(1.0, 0.0, 0.0));
        let up = back.cross(right);
        CameraBasis { right, up, back }
    }

    /// World point to camera space (camera looks down -Z).
    pub fn to_view(&self, point: Vec3) -> Vec3 {
        let b = self.basis();
        let rel = point - self.eye;
        Vec3::new(rel.dot(b.right), rel.dot(b.up), rel.dot(b.back))
    }

    /// Distance in front of the camera along the view axis.
    pub fn view_depth(&self, point: Vec3) -> f64 {
        -self.to_view(point).z
    }

    /// World point to normalized device coordinates.
    pub fn project(&self, point: Vec3) -> Vec2 {
        let v = self.to_view(point);
        Vec2::new(v.x / self.half_extent, v.y / self.half_extent)
    }

    /// Orthographic pick ray through an NDC position, starting on the eye plane.
    pub fn ray_from_ndc(&self, ndc: Vec2, max_distance: f64) -> Ray {
        let b = self.basis();
        let origin = self.eye
            + b.right * (ndc.x * self.half_extent)
            + b.up * (ndc.y * self.half_extent);
        Ray {
            origin,
            direction: -b.back,
            max_distance,
        }
    }

    /// Column-major view-projection matrix with a `[0, 1]` depth range.
    pub fn view_proj_matrix(&self) -> [[f32; 4]; 4] {
        mat4_mul(self.projection_matrix(), self.view_matrix())
    }

    fn view_matrix(&self) -> [[f32; 4]; 4] {
        let CameraBasis { right, up, back } = self.basis();
        let ex = -right.dot(self.eye);
        let ey = -up.dot(self.eye);
        let ez = -back.dot(self.eye);
        [
            [right.x as f32, up.x as f32, back.x as f32, 0.0],
            [right.y as f32, up.y as f32, back.y as f32, 0.0],
            [right.z as f32, up.z as f32, back.z as f32, 0.0],
            [ex as f32, ey as f32, ez as f32, 1.0],
        ]
    }

    fn projection_matrix(&self) -> [[f32; 4]; 4] {
        let s = (1.0 / self.half_extent) as f32;
        let depth = self.far - self.near;
        let m22 = (-1.0 / depth) as f32;
        let m32 = (-self.near / depth) as f32;
        [
            [s, 0.0, 0.0, 0.0],
            [0.0, s, 0.0, 0.0],
            [0.0, 0.0, m22, 0.0],
            [0.0, 0.0, m32, 1.0],
        ]
    }
}

/// NDC to pixel coordinates; screen Y grows downward.
pub fn ndc_to_pixels(ndc: Vec2, width: f64, height: f64) -> Vec2 {
    Vec2::new(
        (ndc.x * 0.5 + 0.5) * width,
        (ndc.y * -0.5 + 0.5) * height,
    )
}

/// Client pointer position to NDC relative to `rect`.
pub fn pointer_to_ndc(client_x: f64, client_y: f64, rect: ViewportRect) -> Option<Vec2> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    let x = (client_x - rect.left) / rect.width * 2.0 - 1.0;
    let y = -((client_y - rect.top) / rect.height) * 2.0 + 1.0;
    Some(Vec2::new(x, y))
}

fn mat4_mul(a: [[f32; 4]; 4], b: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut c = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            c[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    c
}
