use crate::bootstrap::{Bootstrap, initialize};
use crate::config::ViewerConfig;
use crate::context::SceneContext;
use crate::frame_loop::{CancellationToken, FrameLoop, TickOutcome};
use crate::helpers::{InteractionHelpers, attach_helpers};
use earthview_assets::TextureLoader;
use earthview_input::ControlInput;
use earthview_render::{RenderError, Renderer};

/// The assembled viewer: bootstrap, helpers and both frame loops wired to
/// one shared context.
#[derive(Debug)]
pub struct Viewer {
    pub context: SceneContext,
    pub helpers: InteractionHelpers,
    pub frame_loop: FrameLoop,
}

impl Viewer {
    /// Initialize the scene, attach helpers and schedule both loops.
    ///
    /// The texture load runs in the background; the sphere appears on the
    /// first tick after it settles.
    pub fn start(config: &ViewerConfig, loader: &TextureLoader) -> Self {
        Self::start_with_token(config, loader, CancellationToken::new())
    }

    pub fn start_with_token(
        config: &ViewerConfig,
        loader: &TextureLoader,
        token: CancellationToken,
    ) -> Self {
        let Bootstrap {
            mut context,
            pending,
        } = initialize(config, loader);
        let helpers = attach_helpers(&mut context, &config.helpers);

        let mut frame_loop = FrameLoop::with_token(config.scene.rotation_step, Some(pending), token);
        frame_loop.start_rotation();
        frame_loop.start_stats();

        tracing::info!(objects = context.scene.len(), "viewer started");
        Self {
            context,
            helpers,
            frame_loop,
        }
    }

    pub fn tick(&mut self, renderer: &mut dyn Renderer) -> Result<TickOutcome, RenderError> {
        self.frame_loop.tick(&mut self.context, renderer)
    }

    pub fn handle_input(
        &mut self,
        input: ControlInput,
        renderer: &mut dyn Renderer,
    ) -> Result<bool, RenderError> {
        self.helpers.handle_input(&mut self.context, input, renderer)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.context.resize(width, height)
    }

    pub fn token(&self) -> CancellationToken {
        self.frame_loop.token()
    }
}
