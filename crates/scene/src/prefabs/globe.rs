//! Subdivided icosahedron used both as the dot globe and as the pick mesh.

use std::collections::HashMap;

use foundation::math::{GeoPoint, Vec3, to_lat_long};

/// Subdivision level of the globe mesh.
pub const GLOBE_DETAIL: u32 = 22;

/// Indexed triangle mesh with every vertex on a sphere of `radius`.
#[derive(Debug, Clone)]
pub struct IcoSphere {
    pub radius: f64,
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

fn icosahedron_corners() -> [Vec3; 12] {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
}

fn lerp(a: Vec3, b: Vec3, t: f64) -> Vec3 {
    a + (b - a) * t
}

impl IcoSphere {
    /// Each icosahedron face is split into `(detail + 1)^2` triangles and every
    /// vertex is pushed out to the sphere. Vertices shared between faces are
    /// merged.
    pub fn new(radius: f64, detail: u32) -> Self {
        let corners = icosahedron_corners();
        let cols = detail as usize + 1;

        let mut vertices = Vec::new();
        let mut triangles = Vec::with_capacity(20 * cols * cols);
        let mut seen: HashMap<[i64; 3], u32> = HashMap::new();

        let mut intern = |p: Vec3, vertices: &mut Vec<Vec3>| -> u32 {
            let unit = p.normalized().unwrap_or(Vec3::Y);
            let key = [
                (unit.x * 1e9).round() as i64,
                (unit.y * 1e9).round() as i64,
                (unit.z * 1e9).round() as i64,
            ];
            *seen.entry(key).or_insert_with(|| {
                vertices.push(unit * radius);
                (vertices.len() - 1) as u32
            })
        };

        for face in ICOSAHEDRON_FACES {
            let [a, b, c] = face.map(|i| corners[i]);

            // grid[i][j]: row i runs from edge a-c to edge b-c, shrinking by one.
            let mut grid: Vec<Vec<u32>> = Vec::with_capacity(cols + 1);
            for i in 0..=cols {
                let s = i as f64 / cols as f64;
                let row_start = lerp(a, c, s);
                let row_end = lerp(b, c, s);
                let rows = cols - i;
                let mut row = Vec::with_capacity(rows + 1);
                for j in 0..=rows {
                    let p = if rows == 0 {
                        row_start
                    } else {
                        lerp(row_start, row_end, j as f64 / rows as f64)
                    };
                    row.push(intern(p, &mut vertices));
                }
                grid.push(row);
            }

            for i in 0..cols {
                for j in 0..2 * (cols - i) - 1 {
                    let k = j / 2;
                    let tri = if j % 2 == 0 {
                        [grid[i][k + 1], grid[i + 1][k], grid[i][k]]
                    } else {
                        [grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]
                    };
                    triangles.push(tri);
                }
            }
        }

        Self {
            radius,
            vertices,
            triangles,
        }
    }

    /// The globe mesh: unit radius, [`GLOBE_DETAIL`] subdivisions.
    pub fn globe() -> Self {
        Self::new(1.0, GLOBE_DETAIL)
    }

    pub fn triangle(&self, index: usize) -> Option<[Vec3; 3]> {
        let tri = self.triangles.get(index)?;
        Some(tri.map(|i| self.vertices[i as usize]))
    }

    /// Vertices whose geographic position passes `keep`, e.g. land in the
    /// globe texture.
    pub fn filtered_vertices<F>(&self, mut keep: F) -> Vec<Vec3>
    where
        F: FnMut(GeoPoint) -> bool,
    {
        self.vertices
            .iter()
            .copied()
            .filter(|v| {
                let Some(unit) = v.normalized() else {
                    return false;
                };
                let (lat, lon) = to_lat_long(unit);
                match GeoPoint::new(lat.clamp(-90.0, 90.0), lon.clamp(-180.0, 180.0)) {
                    Ok(point) => keep(point),
                    Err(_) => false,
                }
            })
            .collect()
    }
}

/// Outward unit normal of the triangle `a, b, c`.
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let n = (b - a).cross(c - a).normalized()?;
    let centroid = a + b + c;
    Some(if n.dot(centroid) < 0.0 { -n } else { n })
}
