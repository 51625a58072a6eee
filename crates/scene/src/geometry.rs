use earthview_common::Color;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Indexed triangle mesh with per-vertex normals and texture coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates with `v = 1` at the top of the image.
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// UV sphere parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereGeometry {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for SphereGeometry {
    fn default() -> Self {
        Self::new(1.0, 32, 16)
    }
}

impl SphereGeometry {
    /// Segment counts are clamped to the smallest closed sphere (3 around, 2 down).
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            radius,
            width_segments: width_segments.max(3),
            height_segments: height_segments.max(2),
        }
    }

    /// Build vertex and index data.
    ///
    /// Rows run from the north pole (`+Y`) to the south pole. Pole rows get a
    /// half-segment `u` offset so the pole triangles sample the middle of their
    /// texel column. Degenerate pole triangles are skipped.
    pub fn build(&self) -> MeshData {
        let w = self.width_segments;
        let h = self.height_segments;
        let mut mesh = MeshData::default();
        let mut grid: Vec<Vec<u32>> = Vec::with_capacity(h as usize + 1);
        let mut index = 0u32;

        for iy in 0..=h {
            let v = iy as f32 / h as f32;
            let u_offset = if iy == 0 {
                0.5 / w as f32
            } else if iy == h {
                -0.5 / w as f32
            } else {
                0.0
            };

            let mut row = Vec::with_capacity(w as usize + 1);
            for ix in 0..=w {
                let u = ix as f32 / w as f32;
                let (sin_phi, cos_phi) = (u * TAU).sin_cos();
                let (sin_theta, cos_theta) = (v * PI).sin_cos();

                let p = Vec3::new(
                    -self.radius * cos_phi * sin_theta,
                    self.radius * cos_theta,
                    self.radius * sin_phi * sin_theta,
                );
                let n = p.normalize_or_zero();

                mesh.positions.push(p.to_array());
                mesh.normals.push(n.to_array());
                mesh.uvs.push([u + u_offset, 1.0 - v]);
                row.push(index);
                index += 1;
            }
            grid.push(row);
        }

        for iy in 0..h as usize {
            for ix in 0..w as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];

                if iy != 0 {
                    mesh.indices.extend_from_slice(&[a, b, d]);
                }
                if iy != h as usize - 1 {
                    mesh.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        mesh
    }
}

/// Colored line-list vertex used by axes and grid helpers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

fn line(from: [f32; 3], to: [f32; 3], from_color: [f32; 4], to_color: [f32; 4]) -> [LineVertex; 2] {
    [
        LineVertex {
            position: from,
            color: from_color,
        },
        LineVertex {
            position: to,
            color: to_color,
        },
    ]
}

/// Three axis lines from the origin: X red, Y green, Z blue, each fading
/// towards a lighter tint at the far end.
pub fn axes_lines(size: f32) -> Vec<LineVertex> {
    let mut verts = Vec::with_capacity(6);
    verts.extend(line(
        [0.0, 0.0, 0.0],
        [size, 0.0, 0.0],
        [1.0, 0.0, 0.0, 1.0],
        [1.0, 0.6, 0.0, 1.0],
    ));
    verts.extend(line(
        [0.0, 0.0, 0.0],
        [0.0, size, 0.0],
        [0.0, 1.0, 0.0, 1.0],
        [0.6, 1.0, 0.0, 1.0],
    ));
    verts.extend(line(
        [0.0, 0.0, 0.0],
        [0.0, 0.0, size],
        [0.0, 0.0, 1.0, 1.0],
        [0.0, 0.6, 1.0, 1.0],
    ));
    verts
}

/// Square grid on the XZ plane centered at the origin.
///
/// `divisions + 1` lines run along each axis; the pair through the center
/// uses `center_color`, every other line uses `line_color`.
pub fn grid_lines(size: f32, divisions: u32, center_color: Color, line_color: Color) -> Vec<LineVertex> {
    let divisions = divisions.max(1);
    let center = divisions / 2;
    let step = size / divisions as f32;
    let half = size / 2.0;
    let mut verts = Vec::with_capacity((divisions as usize + 1) * 4);

    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if i == center {
            center_color.to_rgba()
        } else {
            line_color.to_rgba()
        };
        verts.extend(line([-half, 0.0, k], [half, 0.0, k], color, color));
        verts.extend(line([k, 0.0, -half], [k, 0.0, half], color, color));
    }
    verts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_vertex_and_triangle_counts() {
        let mesh = SphereGeometry::new(5.0, 32, 32).build();
        assert_eq!(mesh.vertex_count(), 33 * 33);
        // Pole rows contribute one triangle per segment, the rest two.
        assert_eq!(mesh.triangle_count(), 32 * (2 * 32 - 2));
        assert_eq!(mesh.normals.len(), mesh.vertex_count());
        assert_eq!(mesh.uvs.len(), mesh.vertex_count());
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = SphereGeometry::new(5.0, 32, 32).build();
        for p in &mesh.positions {
            let len = Vec3::from_array(*p).length();
            assert!((len - 5.0).abs() < 1e-4, "vertex at distance {len}");
        }
    }

    #[test]
    fn sphere_indices_in_range() {
        let mesh = SphereGeometry::new(2.0, 8, 6).build();
        let n = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn sphere_poles_and_uvs() {
        let mesh = SphereGeometry::new(5.0, 32, 32).build();
        assert!((mesh.positions[0][1] - 5.0).abs() < 1e-5);
        assert!((mesh.positions.last().unwrap()[1] + 5.0).abs() < 1e-5);
        assert_eq!(mesh.uvs[0][1], 1.0);
        assert_eq!(mesh.uvs.last().unwrap()[1], 0.0);
    }

    #[test]
    fn segments_are_clamped() {
        let s = SphereGeometry::new(1.0, 0, 0);
        assert_eq!((s.width_segments, s.height_segments), (3, 2));
    }

    #[test]
    fn axes_have_three_lines_of_given_size() {
        let verts = axes_lines(50.0);
        assert_eq!(verts.len(), 6);
        assert_eq!(verts[1].position, [50.0, 0.0, 0.0]);
        assert_eq!(verts[3].position, [0.0, 50.0, 0.0]);
        assert_eq!(verts[5].position, [0.0, 0.0, 50.0]);
        assert_eq!(verts[0].color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn grid_line_count_and_extent() {
        let c = Color::from_hex(0x004444);
        let verts = grid_lines(300.0, 300, c, c);
        assert_eq!(verts.len(), 301 * 4);
        assert_eq!(verts[0].position, [-150.0, 0.0, -150.0]);
        assert_eq!(verts[1].position, [150.0, 0.0, -150.0]);
        assert!(verts.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn grid_center_line_uses_center_color() {
        let verts = grid_lines(4.0, 4, Color::from_hex(0xff0000), Color::from_hex(0x0000ff));
        // line index 2 of 0..=4 passes through the origin
        let center = &verts[2 * 4];
        assert_eq!(center.position[2], 0.0);
        assert_eq!(center.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(verts[0].color, [0.0, 0.0, 1.0, 1.0]);
    }
}
