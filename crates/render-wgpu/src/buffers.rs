use bytemuck::{Pod, Zeroable};
use earthview_common::{Color, Transform};
use earthview_scene::{LineVertex, MeshData, ObjectKind, PerspectiveCamera, axes_lines, grid_lines};

/// Per-draw camera data, group 0.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
}

impl FrameUniforms {
    pub fn from_camera(camera: &PerspectiveCamera) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
        }
    }
}

/// Per-object model matrix and tint, group 1.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub tint: [f32; 4],
}

impl ObjectUniforms {
    pub fn new(transform: &Transform, tint: Color) -> Self {
        Self {
            model: transform.matrix().to_cols_array_2d(),
            tint: tint.to_rgba(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct MeshVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct GpuLineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl From<LineVertex> for GpuLineVertex {
    fn from(v: LineVertex) -> Self {
        Self {
            position: v.position,
            color: v.color,
        }
    }
}

pub(crate) fn mesh_vertices(mesh: &MeshData) -> Vec<MeshVertex> {
    mesh.positions
        .iter()
        .zip(&mesh.uvs)
        .map(|(&position, &uv)| MeshVertex { position, uv })
        .collect()
}

/// Line list for helper objects; `None` for anything drawn another way.
pub(crate) fn line_vertices(kind: &ObjectKind) -> Option<Vec<GpuLineVertex>> {
    let lines = match kind {
        ObjectKind::Axes { size } => axes_lines(*size),
        ObjectKind::Grid {
            size,
            divisions,
            center_color,
            line_color,
        } => grid_lines(*size, *divisions, *center_color, *line_color),
        ObjectKind::AmbientLight { .. } | ObjectKind::Mesh { .. } => return None,
    };
    Some(lines.into_iter().map(GpuLineVertex::from).collect())
}
