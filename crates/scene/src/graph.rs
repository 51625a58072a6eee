use crate::geometry::SphereGeometry;
use earthview_assets::TextureImage;
use earthview_common::{Color, ObjectId, Transform};
use std::sync::Arc;

/// Unlit material: base color, optionally multiplied by a texture map.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicMaterial {
    pub color: Color,
    pub map: Option<Arc<TextureImage>>,
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            map: None,
        }
    }
}

impl BasicMaterial {
    pub fn textured(map: Arc<TextureImage>) -> Self {
        Self {
            map: Some(map),
            ..Self::default()
        }
    }
}

/// What a scene object is.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    AmbientLight {
        color: Color,
        intensity: f32,
    },
    /// RGB axis lines from the origin.
    Axes {
        size: f32,
    },
    /// Square line grid on the XZ plane.
    Grid {
        size: f32,
        divisions: u32,
        center_color: Color,
        line_color: Color,
    },
    Mesh {
        geometry: SphereGeometry,
        material: BasicMaterial,
    },
}

impl ObjectKind {
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::AmbientLight { .. } => "ambient_light",
            ObjectKind::Axes { .. } => "axes",
            ObjectKind::Grid { .. } => "grid",
            ObjectKind::Mesh { .. } => "mesh",
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self, ObjectKind::Mesh { .. })
    }
}

/// One entry in the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub kind: ObjectKind,
    pub transform: Transform,
}

/// Ordered, append-only collection of scene objects.
///
/// `revision` increases with every insertion so backends can tell when
/// GPU resources need to be created for new objects.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    objects: Vec<SceneObject>,
    revision: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an object at the identity transform. Returns its id.
    pub fn add(&mut self, name: impl Into<String>, kind: ObjectKind) -> ObjectId {
        self.add_with_transform(name, kind, Transform::default())
    }

    pub fn add_with_transform(
        &mut self,
        name: impl Into<String>,
        kind: ObjectKind,
        transform: Transform,
    ) -> ObjectId {
        let id = ObjectId::new();
        let name = name.into();
        tracing::debug!(id = %id.short(), %name, kind = kind.label(), "object added");
        self.objects.push(SceneObject {
            id,
            name,
            kind,
            transform,
        });
        self.revision += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Objects in insertion order.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Mutable access to an object's transform. Kind and name are fixed once added.
    pub fn transform_mut(&mut self, id: ObjectId) -> Option<&mut Transform> {
        self.objects
            .iter_mut()
            .find(|o| o.id == id)
            .map(|o| &mut o.transform)
    }

    pub fn count_by_label(&self, label: &str) -> usize {
        self.objects.iter().filter(|o| o.kind.label() == label).count()
    }

    pub fn meshes(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.kind.is_mesh())
    }

    /// Sum of ambient light contributions, per channel.
    pub fn ambient(&self) -> [f32; 3] {
        self.objects
            .iter()
            .filter_map(|o| match &o.kind {
                ObjectKind::AmbientLight { color, intensity } => Some([
                    color.r() * intensity,
                    color.g() * intensity,
                    color.b() * intensity,
                ]),
                _ => None,
            })
            .fold([0.0; 3], |acc, c| [acc[0] + c[0], acc[1] + c[1], acc[2] + c[2]])
    }
}
