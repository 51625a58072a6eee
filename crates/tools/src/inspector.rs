use earthview_common::ObjectId;
use earthview_scene::{ObjectKind, SceneGraph};
use serde::Serialize;

/// Read-only queries against the scene for overlays and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene.
    pub fn summary(scene: &SceneGraph) -> SceneSummary {
        let mut summary = SceneSummary {
            object_count: scene.len(),
            revision: scene.revision(),
            ..SceneSummary::default()
        };
        for obj in scene.objects() {
            match &obj.kind {
                ObjectKind::AmbientLight { .. } => summary.lights += 1,
                ObjectKind::Axes { .. } => summary.axes += 1,
                ObjectKind::Grid { .. } => summary.grids += 1,
                ObjectKind::Mesh { .. } => {
                    summary.meshes += 1;
                    if summary.first_mesh_rotation_y.is_none() {
                        summary.first_mesh_rotation_y = Some(obj.transform.rotation.y);
                    }
                }
            }
        }
        summary
    }

    /// Describe one object, if present.
    pub fn inspect_object(scene: &SceneGraph, id: ObjectId) -> Option<ObjectInfo> {
        scene.get(id).map(|obj| ObjectInfo {
            id: obj.id.short(),
            name: obj.name.clone(),
            kind: obj.kind.label(),
            position: obj.transform.position.to_array(),
            rotation: obj.transform.rotation.to_array(),
            scale: obj.transform.scale.to_array(),
        })
    }
}

/// Object counts by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneSummary {
    pub object_count: usize,
    pub revision: u64,
    pub lights: usize,
    pub axes: usize,
    pub grids: usize,
    pub meshes: usize,
    pub first_mesh_rotation_y: Option<f32>,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: objects={} lights={} axes={} grids={} meshes={}",
            self.object_count, self.lights, self.axes, self.grids, self.meshes
        )?;
        if let Some(rot) = self.first_mesh_rotation_y {
            write!(f, " mesh_rot_y={rot:.3}")?;
        }
        Ok(())
    }
}

/// Detailed info about a single object.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectInfo {
    pub id: String,
    pub name: String,
    pub kind: &'static str,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}
