use crate::config::HelperConfig;
use crate::context::SceneContext;
use crate::controls::OrbitControls;
use earthview_common::{Color, ObjectId};
use earthview_input::ControlInput;
use earthview_render::{RenderError, Renderer};
use earthview_scene::ObjectKind;

/// Debug visuals plus the orbit controls attached to the camera.
#[derive(Debug)]
pub struct InteractionHelpers {
    pub controls: OrbitControls,
    axes: ObjectId,
    grid: ObjectId,
    rerender_on_change: bool,
    change_renders: u64,
}

/// Add the axes and grid helpers and bind orbit controls to the camera.
///
/// Always adds exactly one axes object and one grid object, whatever the
/// scene already contains.
pub fn attach_helpers(context: &mut SceneContext, config: &HelperConfig) -> InteractionHelpers {
    let axes = context.scene.add(
        "axes_helper",
        ObjectKind::Axes {
            size: config.axes_size,
        },
    );
    let grid = context.scene.add(
        "grid_helper",
        ObjectKind::Grid {
            size: config.grid_size,
            divisions: config.grid_divisions,
            center_color: Color::from_hex(config.grid_center_color),
            line_color: Color::from_hex(config.grid_color),
        },
    );
    tracing::info!(
        axes_size = config.axes_size,
        grid_size = config.grid_size,
        divisions = config.grid_divisions,
        "helpers attached"
    );

    InteractionHelpers {
        controls: OrbitControls::from_config(config),
        axes,
        grid,
        rerender_on_change: config.rerender_on_change,
        change_renders: 0,
    }
}

impl InteractionHelpers {
    pub fn axes(&self) -> ObjectId {
        self.axes
    }

    pub fn grid(&self) -> ObjectId {
        self.grid
    }

    pub fn rerender_on_change(&self) -> bool {
        self.rerender_on_change
    }

    pub fn set_rerender_on_change(&mut self, enabled: bool) {
        self.rerender_on_change = enabled;
    }

    /// Renders issued because the view changed.
    pub fn change_renders(&self) -> u64 {
        self.change_renders
    }

    /// Feed one control input to the orbit controls.
    ///
    /// Only the camera moves. When the view changed and re-rendering on
    /// change is enabled, the scene is rendered once immediately, on top of
    /// whatever the frame loop renders. Returns whether the view changed.
    pub fn handle_input(
        &mut self,
        context: &mut SceneContext,
        input: ControlInput,
        renderer: &mut dyn Renderer,
    ) -> Result<bool, RenderError> {
        let height = context.viewport.height;
        let changed = self.controls.apply(&mut context.camera, input, height);
        if !changed {
            return Ok(false);
        }

        tracing::trace!(?input, position = ?context.camera.position, "view changed");
        if self.rerender_on_change {
            self.change_renders += 1;
            context.render(renderer)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use earthview_render::DebugTextRenderer;
    use earthview_scene::{PerspectiveCamera, SphereGeometry, Viewport};

    fn context() -> SceneContext {
        SceneContext::new(
            PerspectiveCamera::default(),
            Viewport::new(1280, 720),
            SphereGeometry::new(5.0, 32, 32),
        )
    }

    #[test]
    fn attach_adds_one_axes_and_one_grid() {
        let mut ctx = context();
        let helpers = attach_helpers(&mut ctx, &HelperConfig::default());

        assert_eq!(ctx.scene.len(), 2);
        match &ctx.scene.get(helpers.axes()).unwrap().kind {
            ObjectKind::Axes { size } => assert_eq!(*size, 50.0),
            other => panic!("expected axes, got {other:?}"),
        }
        match &ctx.scene.get(helpers.grid()).unwrap().kind {
            ObjectKind::Grid {
                size,
                divisions,
                center_color,
                line_color,
            } => {
                assert_eq!(*size, 300.0);
                assert_eq!(*divisions, 300);
                assert_eq!(*center_color, Color::from_hex(0x004444));
                assert_eq!(*line_color, Color::from_hex(0x004444));
            }
            other => panic!("expected grid, got {other:?}"),
        }
    }

    #[test]
    fn attach_ignores_prior_contents() {
        let mut ctx = context();
        ctx.scene.add("axes_helper", ObjectKind::Axes { size: 10.0 });
        ctx.scene.add(
            "light",
            ObjectKind::AmbientLight {
                color: Color::WHITE,
                intensity: 1.0,
            },
        );
        let before_axes = ctx.scene.count_by_label("axes");
        let before_grids = ctx.scene.count_by_label("grid");

        attach_helpers(&mut ctx, &HelperConfig::default());

        assert_eq!(ctx.scene.count_by_label("axes"), before_axes + 1);
        assert_eq!(ctx.scene.count_by_label("grid"), before_grids + 1);
    }

    #[test]
    fn view_change_renders_once_without_touching_objects() {
        let mut ctx = context();
        let mut helpers = attach_helpers(&mut ctx, &HelperConfig::default());
        let objects_before = ctx.scene.objects().to_vec();
        let mut renderer = DebugTextRenderer::new();

        let changed = helpers
            .handle_input(&mut ctx, ControlInput::Rotate { dx: 25.0, dy: 0.0 }, &mut renderer)
            .unwrap();

        assert!(changed);
        assert_eq!(renderer.render_count(), 1);
        assert_eq!(helpers.change_renders(), 1);
        assert_eq!(ctx.scene.objects(), objects_before.as_slice());
    }

    #[test]
    fn no_change_no_render() {
        let mut ctx = context();
        let mut helpers = attach_helpers(&mut ctx, &HelperConfig::default());
        let mut renderer = DebugTextRenderer::new();

        let changed = helpers
            .handle_input(&mut ctx, ControlInput::Pan { dx: 0.0, dy: 0.0 }, &mut renderer)
            .unwrap();

        assert!(!changed);
        assert_eq!(renderer.render_count(), 0);
    }

    #[test]
    fn rerender_can_be_switched_off() {
        let mut ctx = context();
        let config = HelperConfig {
            rerender_on_change: false,
            ..HelperConfig::default()
        };
        let mut helpers = attach_helpers(&mut ctx, &config);
        let mut renderer = DebugTextRenderer::new();

        assert!(
            helpers
                .handle_input(&mut ctx, ControlInput::Zoom { delta: 1.0 }, &mut renderer)
                .unwrap()
        );
        assert_eq!(renderer.render_count(), 0);
    }
}
