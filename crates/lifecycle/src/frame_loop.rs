use crate::bootstrap::complete_texture_load;
use crate::context::SceneContext;
use earthview_assets::{LoadPoll, PendingTexture};
use earthview_render::{RenderError, Renderer};
use earthview_scene::{PerspectiveCamera, SceneGraph, Viewport};
use earthview_tools::PerfStats;
use std::f32::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag that stops a [`FrameLoop`]. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lifecycle of one per-frame loop.
///
/// `Idle -> Scheduled` on start, then every tick `-> Running -> Rescheduled`.
/// Cancellation returns a loop to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Scheduled,
    Running,
    Rescheduled,
}

impl LoopState {
    fn is_scheduled(self) -> bool {
        matches!(self, LoopState::Scheduled | LoopState::Rescheduled)
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Loops ran; `renders` counts every render call made during the tick.
    Ran { renders: u32 },
    /// The token was cancelled; nothing ran.
    Cancelled,
}

/// Counts calls passing through to the wrapped renderer.
struct CountingRenderer<'a> {
    inner: &'a mut dyn Renderer,
    calls: u32,
}

impl Renderer for CountingRenderer<'_> {
    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        viewport: &Viewport,
    ) -> Result<(), RenderError> {
        self.calls += 1;
        self.inner.render(scene, camera, viewport)
    }
}

/// The two per-frame loops: Earth rotation and the performance counter.
///
/// The host calls [`FrameLoop::tick`] once per display refresh. Each tick
/// first delivers a finished texture load (if any), then runs the rotation
/// loop, then the stats loop. Both loops render unconditionally, so a tick
/// with both started renders twice.
#[derive(Debug)]
pub struct FrameLoop {
    rotation_step: f32,
    rotation: LoopState,
    stats_loop: LoopState,
    stats: PerfStats,
    pending: Option<PendingTexture>,
    token: CancellationToken,
    ticks: u64,
}

impl FrameLoop {
    /// `pending` is the texture load to deliver into the scene when it settles.
    pub fn new(rotation_step: f32, pending: Option<PendingTexture>) -> Self {
        Self::with_token(rotation_step, pending, CancellationToken::new())
    }

    pub fn with_token(
        rotation_step: f32,
        pending: Option<PendingTexture>,
        token: CancellationToken,
    ) -> Self {
        Self {
            rotation_step,
            rotation: LoopState::Idle,
            stats_loop: LoopState::Idle,
            stats: PerfStats::default(),
            pending,
            token,
            ticks: 0,
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn start_rotation(&mut self) {
        if self.rotation == LoopState::Idle {
            self.rotation = LoopState::Scheduled;
            tracing::debug!("rotation loop scheduled");
        }
    }

    pub fn start_stats(&mut self) {
        if self.stats_loop == LoopState::Idle {
            self.stats_loop = LoopState::Scheduled;
            tracing::debug!("stats loop scheduled");
        }
    }

    pub fn rotation_state(&self) -> LoopState {
        self.rotation
    }

    pub fn stats_state(&self) -> LoopState {
        self.stats_loop
    }

    pub fn stats(&self) -> &PerfStats {
        &self.stats
    }

    pub fn rotation_step(&self) -> f32 {
        self.rotation_step
    }

    pub fn set_rotation_step(&mut self, step: f32) {
        self.rotation_step = step;
    }

    /// Ticks that actually ran.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// True while a texture load is still outstanding.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Run one frame.
    ///
    /// Both loops run even if the first one's render fails; the first error
    /// is returned after both have been rescheduled.
    pub fn tick(
        &mut self,
        context: &mut SceneContext,
        renderer: &mut dyn Renderer,
    ) -> Result<TickOutcome, RenderError> {
        if self.token.is_cancelled() {
            if self.rotation != LoopState::Idle || self.stats_loop != LoopState::Idle {
                tracing::info!(ticks = self.ticks, "frame loop cancelled");
            }
            self.rotation = LoopState::Idle;
            self.stats_loop = LoopState::Idle;
            return Ok(TickOutcome::Cancelled);
        }

        let _span = tracing::trace_span!("tick", n = self.ticks).entered();
        let mut counting = CountingRenderer {
            inner: renderer,
            calls: 0,
        };

        let loaded = self.deliver_texture(context, &mut counting);
        let rotated = self.run_rotation(context, &mut counting);
        let stats = self.run_stats(context, &mut counting);
        self.ticks += 1;

        loaded.and(rotated).and(stats)?;
        Ok(TickOutcome::Ran {
            renders: counting.calls,
        })
    }

    fn deliver_texture(
        &mut self,
        context: &mut SceneContext,
        renderer: &mut dyn Renderer,
    ) -> Result<(), RenderError> {
        let Some(pending) = &mut self.pending else {
            return Ok(());
        };
        match pending.poll() {
            LoadPoll::Pending => Ok(()),
            LoadPoll::Ready(result) => {
                self.pending = None;
                complete_texture_load(context, result, renderer).map(|_| ())
            }
            LoadPoll::Consumed => {
                self.pending = None;
                Ok(())
            }
        }
    }

    fn run_rotation(
        &mut self,
        context: &mut SceneContext,
        renderer: &mut dyn Renderer,
    ) -> Result<(), RenderError> {
        if !self.rotation.is_scheduled() {
            return Ok(());
        }
        self.rotation = LoopState::Running;

        if let Some(transform) = context.earth.and_then(|id| context.scene.transform_mut(id)) {
            transform.rotation.y = wrap_angle(transform.rotation.y + self.rotation_step);
        }
        let result = context.render(renderer);

        self.rotation = LoopState::Rescheduled;
        result
    }

    fn run_stats(
        &mut self,
        context: &SceneContext,
        renderer: &mut dyn Renderer,
    ) -> Result<(), RenderError> {
        if !self.stats_loop.is_scheduled() {
            return Ok(());
        }
        self.stats_loop = LoopState::Running;

        self.stats.update();
        let result = context.render(renderer);

        self.stats_loop = LoopState::Rescheduled;
        result
    }
}

/// Wrap to `[0, 2PI)`. `rem_euclid` rounds tiny negative inputs up to exactly `TAU`.
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LoadStatus;
    use crate::test_support::count_errors;
    use earthview_assets::{AssetError, TextureImage};
    use earthview_render::DebugTextRenderer;
    use earthview_scene::SphereGeometry;
    use std::path::PathBuf;

    fn context() -> SceneContext {
        SceneContext::new(
            PerspectiveCamera::default(),
            Viewport::new(640, 480),
            SphereGeometry::new(5.0, 32, 32),
        )
    }

    fn loaded() -> PendingTexture {
        PendingTexture::ready(
            "earth.png",
            Ok(Arc::new(TextureImage::solid(2, 2, [0, 0, 255, 255]))),
        )
    }

    fn failed() -> PendingTexture {
        PendingTexture::ready(
            "earth.png",
            Err(AssetError::Disconnected(PathBuf::from("earth.png"))),
        )
    }

    /// Renderer whose every call fails.
    struct BrokenRenderer;

    impl Renderer for BrokenRenderer {
        fn render(
            &mut self,
            _scene: &SceneGraph,
            _camera: &PerspectiveCamera,
            _viewport: &Viewport,
        ) -> Result<(), RenderError> {
            Err(RenderError::SurfaceLost)
        }
    }

    #[test]
    fn loops_start_idle_and_follow_state_machine() {
        let mut ctx = context();
        let mut frames = FrameLoop::new(0.01, None);
        let mut renderer = DebugTextRenderer::new();
        assert_eq!(frames.rotation_state(), LoopState::Idle);

        frames.start_rotation();
        frames.start_stats();
        assert_eq!(frames.rotation_state(), LoopState::Scheduled);
        assert_eq!(frames.stats_state(), LoopState::Scheduled);

        frames.tick(&mut ctx, &mut renderer).unwrap();
        assert_eq!(frames.rotation_state(), LoopState::Rescheduled);
        assert_eq!(frames.stats_state(), LoopState::Rescheduled);
    }

    #[test]
    fn both_loops_render_twice_per_tick() {
        let mut ctx = context();
        let mut frames = FrameLoop::new(0.01, None);
        frames.start_rotation();
        frames.start_stats();
        let mut renderer = DebugTextRenderer::new();

        for _ in 0..10 {
            let outcome = frames.tick(&mut ctx, &mut renderer).unwrap();
            assert_eq!(outcome, TickOutcome::Ran { renders: 2 });
        }
        assert_eq!(renderer.render_count(), 20);
        assert_eq!(frames.stats().total_frames(), 10);
    }

    #[test]
    fn single_loop_renders_once_per_tick() {
        let mut ctx = context();
        let mut frames = FrameLoop::new(0.01, None);
        frames.start_rotation();
        let mut renderer = DebugTextRenderer::new();

        let outcome = frames.tick(&mut ctx, &mut renderer).unwrap();
        assert_eq!(outcome, TickOutcome::Ran { renders: 1 });
        assert_eq!(frames.stats_state(), LoopState::Idle);
    }

    #[test]
    fn rotation_without_earth_only_renders() {
        let mut ctx = context();
        let mut frames = FrameLoop::new(0.01, None);
        frames.start_rotation();
        let mut renderer = DebugTextRenderer::new();

        frames.tick(&mut ctx, &mut renderer).unwrap();
        assert!(ctx.earth_rotation().is_none());
        assert!(ctx.scene.is_empty());
        assert_eq!(renderer.render_count(), 1);
    }

    #[test]
    fn rotation_accumulates_fixed_step_per_frame() {
        let mut ctx = context();
        let mut frames = FrameLoop::new(0.01, Some(loaded()));
        frames.start_rotation();
        let mut renderer = DebugTextRenderer::new();

        // The first tick delivers the texture and then already rotates once.
        let n = 1000;
        for _ in 0..n {
            frames.tick(&mut ctx, &mut renderer).unwrap();
        }

        let expected = (n as f32 * 0.01).rem_euclid(TAU);
        let actual = ctx.earth_rotation().unwrap();
        assert!((actual - expected).abs() < 1e-3, "{actual} vs {expected}");
        assert!((0.0..TAU).contains(&actual));
    }

    #[test]
    fn wrap_angle_stays_below_a_full_turn() {
        assert_eq!(wrap_angle(-1e-9), 0.0);
        assert_eq!(wrap_angle(TAU), 0.0);
        assert!((wrap_angle(-0.5) - (TAU - 0.5)).abs() < 1e-6);
        assert!((wrap_angle(TAU + 0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn tiny_negative_step_keeps_rotation_in_range() {
        let mut ctx = context();
        let mut frames = FrameLoop::new(-1e-9, Some(loaded()));
        frames.start_rotation();
        let mut renderer = DebugTextRenderer::new();

        for _ in 0..3 {
            frames.tick(&mut ctx, &mut renderer).unwrap();
            let rotation = ctx.earth_rotation().unwrap();
            assert!((0.0..TAU).contains(&rotation), "rotation = {rotation}");
        }
    }

    #[test]
    fn texture_delivery_adds_one_render_and_one_sphere() {
        let mut ctx = context();
        let mut frames = FrameLoop::new(0.01, Some(loaded()));
        frames.start_rotation();
        frames.start_stats();
        let mut renderer = DebugTextRenderer::new();
        assert!(frames.is_loading());

        let first = frames.tick(&mut ctx, &mut renderer).unwrap();
        assert_eq!(first, TickOutcome::Ran { renders: 3 });
        assert!(!frames.is_loading());

        for _ in 0..5 {
            let outcome = frames.tick(&mut ctx, &mut renderer).unwrap();
            assert_eq!(outcome, TickOutcome::Ran { renders: 2 });
        }
        assert_eq!(ctx.scene.meshes().count(), 1);
        assert_eq!(ctx.load_status(), &LoadStatus::Loaded);
    }

    #[test]
    fn failed_load_never_produces_a_sphere() {
        let mut ctx = context();
        let mut frames = FrameLoop::new(0.01, Some(failed()));
        frames.start_rotation();
        let mut renderer = DebugTextRenderer::new();

        let errors = count_errors(|| {
            for _ in 0..50 {
                frames.tick(&mut ctx, &mut renderer).unwrap();
            }
        });
        assert_eq!(errors, 1);
        assert!(!frames.is_loading());
        assert_eq!(ctx.scene.meshes().count(), 0);
        assert!(ctx.earth().is_none());
        assert!(matches!(ctx.load_status(), LoadStatus::Failed(_)));
        assert_eq!(renderer.render_count(), 50);
    }

    #[test]
    fn cancellation_stops_the_loop() {
        let mut ctx = context();
        let mut frames = FrameLoop::new(0.01, None);
        frames.start_rotation();
        frames.start_stats();
        let token = frames.token();
        let mut renderer = DebugTextRenderer::new();

        frames.tick(&mut ctx, &mut renderer).unwrap();
        token.cancel();
        let outcome = frames.tick(&mut ctx, &mut renderer).unwrap();

        assert_eq!(outcome, TickOutcome::Cancelled);
        assert_eq!(renderer.render_count(), 2);
        assert_eq!(frames.ticks(), 1);
        assert_eq!(frames.rotation_state(), LoopState::Idle);
        assert_eq!(frames.stats_state(), LoopState::Idle);
    }

    #[test]
    fn render_error_still_reschedules_both_loops() {
        let mut ctx = context();
        let mut frames = FrameLoop::new(0.01, None);
        frames.start_rotation();
        frames.start_stats();

        let err = frames.tick(&mut ctx, &mut BrokenRenderer).unwrap_err();
        assert!(matches!(err, RenderError::SurfaceLost));
        assert_eq!(frames.rotation_state(), LoopState::Rescheduled);
        assert_eq!(frames.stats_state(), LoopState::Rescheduled);
        assert_eq!(frames.stats().total_frames(), 1);
    }
}
