use earthview_scene::{ObjectKind, PerspectiveCamera, SceneGraph, Viewport};
use std::fmt::Write;

/// Errors a render call can report.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render surface lost")]
    SurfaceLost,
    #[error("render surface outdated")]
    SurfaceOutdated,
    #[error("timed out acquiring a frame")]
    Timeout,
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("render backend error: {0}")]
    Backend(String),
}

impl RenderError {
    /// Lost/outdated surfaces and timeouts go away after a reconfigure or a
    /// later frame; the others do not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RenderError::SurfaceLost | RenderError::SurfaceOutdated | RenderError::Timeout
        )
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// One call draws the whole scene from the camera into the viewport's
/// output, clearing to the viewport's clear color first.
pub trait Renderer {
    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        viewport: &Viewport,
    ) -> Result<(), RenderError>;
}

/// Debug text renderer.
///
/// Produces a human-readable description of each frame and counts render
/// calls. Used by the headless CLI and as the renderer in lifecycle tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    render_count: u64,
    last_frame: String,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of render calls so far.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Text of the most recent frame.
    pub fn last_frame(&self) -> &str {
        &self.last_frame
    }
}

impl Renderer for DebugTextRenderer {
    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        viewport: &Viewport,
    ) -> Result<(), RenderError> {
        self.render_count += 1;

        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}, clear {}) ===",
            self.render_count, viewport.width, viewport.height, viewport.clear_color
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.fov.to_degrees()
        );
        let _ = writeln!(out, "Objects: {}", scene.len());
        for obj in scene.objects() {
            let detail = match &obj.kind {
                ObjectKind::AmbientLight { color, intensity } => {
                    format!("color={color} intensity={intensity:.2}")
                }
                ObjectKind::Axes { size } => format!("size={size:.0}"),
                ObjectKind::Grid {
                    size, divisions, ..
                } => format!("size={size:.0} divisions={divisions}"),
                ObjectKind::Mesh { geometry, material } => format!(
                    "sphere r={:.1} {}x{} textured={} rot_y={:.3}",
                    geometry.radius,
                    geometry.width_segments,
                    geometry.height_segments,
                    material.map.is_some(),
                    obj.transform.rotation.y
                ),
            };
            let _ = writeln!(
                out,
                "  [{}] {} {} {}",
                obj.id.short(),
                obj.kind.label(),
                obj.name,
                detail
            );
        }

        tracing::trace!(frame = self.render_count, objects = scene.len(), "debug render");
        self.last_frame = out;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use earthview_scene::{BasicMaterial, SphereGeometry};

    #[test]
    fn debug_renderer_empty_scene() {
        let mut renderer = DebugTextRenderer::new();
        renderer
            .render(
                &SceneGraph::new(),
                &PerspectiveCamera::default(),
                &Viewport::default(),
            )
            .unwrap();

        assert_eq!(renderer.render_count(), 1);
        assert!(renderer.last_frame().contains("Objects: 0"));
        assert!(renderer.last_frame().contains("clear #ffffff"));
        assert!(renderer.last_frame().contains("fov=75"));
    }

    #[test]
    fn debug_renderer_lists_objects() {
        let mut scene = SceneGraph::new();
        scene.add("axes", ObjectKind::Axes { size: 50.0 });
        scene.add(
            "earth",
            ObjectKind::Mesh {
                geometry: SphereGeometry::new(5.0, 32, 32),
                material: BasicMaterial::default(),
            },
        );

        let mut renderer = DebugTextRenderer::new();
        let camera = PerspectiveCamera::default();
        let viewport = Viewport::default();
        renderer.render(&scene, &camera, &viewport).unwrap();
        renderer.render(&scene, &camera, &viewport).unwrap();

        assert_eq!(renderer.render_count(), 2);
        assert!(renderer.last_frame().contains("Objects: 2"));
        assert!(renderer.last_frame().contains("sphere r=5.0 32x32"));
    }

    #[test]
    fn recoverable_errors() {
        assert!(RenderError::SurfaceLost.is_recoverable());
        assert!(RenderError::Timeout.is_recoverable());
        assert!(!RenderError::OutOfMemory.is_recoverable());
        assert!(!RenderError::Backend("x".into()).is_recoverable());
    }
}
