use earthview_common::ObjectId;
use earthview_render::{RenderError, Renderer};
use earthview_scene::{PerspectiveCamera, SceneGraph, SphereGeometry, Viewport};

/// Where the Earth texture load stands.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Pending,
    Loaded,
    /// The load failed; the message is the logged error.
    Failed(String),
}

/// Everything the lifecycle components share: scene, camera, viewport and
/// the handle of the Earth once it exists.
///
/// Owned by the application and passed by `&mut` to bootstrap, helpers and
/// the frame loop. All access happens on one thread.
#[derive(Debug)]
pub struct SceneContext {
    pub scene: SceneGraph,
    pub camera: PerspectiveCamera,
    pub viewport: Viewport,
    pub(crate) earth_geometry: SphereGeometry,
    pub(crate) earth: Option<ObjectId>,
    pub(crate) load_status: LoadStatus,
}

impl SceneContext {
    pub fn new(
        camera: PerspectiveCamera,
        viewport: Viewport,
        earth_geometry: SphereGeometry,
    ) -> Self {
        Self {
            scene: SceneGraph::new(),
            camera,
            viewport,
            earth_geometry,
            earth: None,
            load_status: LoadStatus::Pending,
        }
    }

    /// The Earth mesh, once its texture has loaded.
    pub fn earth(&self) -> Option<ObjectId> {
        self.earth
    }

    pub fn earth_geometry(&self) -> SphereGeometry {
        self.earth_geometry
    }

    /// Current Y rotation of the Earth, if it exists.
    pub fn earth_rotation(&self) -> Option<f32> {
        let id = self.earth?;
        self.scene.get(id).map(|obj| obj.transform.rotation.y)
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    /// Draw the scene once.
    pub fn render(&self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        renderer.render(&self.scene, &self.camera, &self.viewport)
    }

    /// Track a new output size. Camera aspect follows the viewport.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !self.viewport.resize(width, height) {
            return false;
        }
        self.camera.set_aspect(self.viewport.width, self.viewport.height);
        tracing::debug!(
            width = self.viewport.width,
            height = self.viewport.height,
            "viewport resized"
        );
        true
    }
}
