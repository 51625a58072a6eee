mod surface;

use anyhow::Result;
use clap::Parser;
use earthview_assets::TextureLoader;
use earthview_input::{PointerButton, PointerTracker};
use earthview_lifecycle::{LoadStatus, TickOutcome, Viewer, ViewerConfig};
use earthview_render::RenderError;
use earthview_tools::SceneInspector;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use surface::SurfaceRenderer;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Pixels of touchpad scroll that count as one wheel step.
const PIXELS_PER_LINE: f32 = 50.0;

#[derive(Parser)]
#[command(name = "earthview-desktop", about = "Rotating Earth viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML viewer config; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Asset root directory (overrides the config)
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Earth texture path relative to the asset root (overrides the config)
    #[arg(long)]
    texture: Option<PathBuf>,
}

/// Viewer plus the UI state around it.
struct AppState {
    viewer: Viewer,
    pointer: PointerTracker,
    show_panel: bool,
    show_stats: bool,
    last_renders: u32,
    title: String,
}

impl AppState {
    fn new(config: &ViewerConfig) -> Self {
        let loader = TextureLoader::new(&config.scene.asset_root);
        Self {
            viewer: Viewer::start(config, &loader),
            pointer: PointerTracker::new(),
            show_panel: true,
            show_stats: true,
            last_renders: 0,
            title: config.window.title.clone(),
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if self.show_stats {
            let stats = self.viewer.frame_loop.stats().snapshot();
            egui::Area::new(egui::Id::new("stats"))
                .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.monospace(format!("{:.0} FPS", stats.fps));
                        ui.monospace(format!(
                            "{:.2} ms ({:.2}-{:.2})",
                            stats.frame_ms_avg, stats.frame_ms_min, stats.frame_ms_max
                        ));
                        ui.monospace(format!("{} renders/tick", self.last_renders));
                    });
                });
        }

        if !self.show_panel {
            return;
        }

        let summary = SceneInspector::summary(&self.viewer.context.scene);
        let camera = self.viewer.context.camera;

        egui::Window::new("Debug")
            .default_pos([8.0, 96.0])
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading(&self.title);
                ui.separator();

                let mut step = self.viewer.frame_loop.rotation_step();
                if ui
                    .add(
                        egui::Slider::new(&mut step, 0.0..=0.1)
                            .text("rotation step")
                            .fixed_decimals(3),
                    )
                    .changed()
                {
                    self.viewer.frame_loop.set_rotation_step(step);
                }
                ui.checkbox(&mut self.show_stats, "Show stats");
                let mut rerender = self.viewer.helpers.rerender_on_change();
                if ui.checkbox(&mut rerender, "Render on view change").changed() {
                    self.viewer.helpers.set_rerender_on_change(rerender);
                }

                ui.separator();
                let status = match self.viewer.context.load_status() {
                    LoadStatus::Pending => "loading".to_string(),
                    LoadStatus::Loaded => "loaded".to_string(),
                    LoadStatus::Failed(reason) => format!("failed: {reason}"),
                };
                ui.label(format!("Texture: {status}"));
                if let Some(rot) = self.viewer.context.earth_rotation() {
                    ui.label(format!("Earth rotation: {rot:.3} rad"));
                }
                ui.label(format!(
                    "Camera: ({:.1}, {:.1}, {:.1})",
                    camera.position.x, camera.position.y, camera.position.z
                ));
                ui.label(format!("Distance: {:.1}", camera.distance_to_target()));
                ui.label(summary.to_string());
                ui.label(format!(
                    "View-change renders: {}",
                    self.viewer.helpers.change_renders()
                ));

                ui.separator();
                ui.small("F1: Toggle panel | LMB: Orbit | RMB: Pan | Wheel: Zoom");
            });
    }
}

struct GpuApp {
    state: AppState,
    window_size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    renderer: Option<SurfaceRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
}

impl GpuApp {
    fn new(config: &ViewerConfig) -> Self {
        Self {
            state: AppState::new(config),
            window_size: PhysicalSize::new(config.window.width, config.window.height),
            window: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.state.title.clone())
            .with_inner_size(self.window_size);
        let window = Arc::new(event_loop.create_window(attrs)?);

        let renderer = SurfaceRenderer::new(window.clone(), &self.state.viewer.context.viewport)?;
        let (width, height) = renderer.size();
        self.state.viewer.resize(width, height);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) {
        match key {
            KeyCode::F1 => self.state.show_panel = !self.state.show_panel,
            KeyCode::F2 => self.state.show_stats = !self.state.show_stats,
            KeyCode::Escape => {
                self.state.viewer.token().cancel();
                event_loop.exit();
            }
            _ => {}
        }
    }

    fn apply_input(&mut self, input: Option<earthview_input::ControlInput>) {
        let (Some(input), Some(renderer)) = (input, self.renderer.as_mut()) else {
            return;
        };
        if let Err(e) = self.state.viewer.handle_input(input, renderer) {
            report_render_error(renderer, &e);
        }
    }

    fn run_egui(&mut self) {
        let (Some(window), Some(egui_winit), Some(renderer)) = (
            self.window.as_ref(),
            self.egui_winit.as_mut(),
            self.renderer.as_mut(),
        ) else {
            return;
        };

        let raw_input = egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        renderer.set_overlay(
            paint_jobs,
            &full_output.textures_delta,
            full_output.pixels_per_point,
        );
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.run_egui();

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if let Err(e) = renderer.begin_frame() {
            report_render_error(renderer, &e);
            return;
        }

        match self.state.viewer.tick(renderer) {
            Ok(TickOutcome::Ran { renders }) => self.state.last_renders = renders,
            Ok(TickOutcome::Cancelled) => {
                renderer.end_frame();
                event_loop.exit();
                return;
            }
            Err(e) => report_render_error(renderer, &e),
        }
        renderer.end_frame();

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Recoverable surface errors reconfigure and wait for the next frame.
fn report_render_error(renderer: &mut SurfaceRenderer, error: &RenderError) {
    if error.is_recoverable() {
        tracing::debug!(%error, "surface unavailable, reconfiguring");
        renderer.reconfigure();
    } else {
        tracing::error!(%error, "render failed");
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_window(event_loop) {
            tracing::error!("failed to initialize window: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }
        let pointer_on_ui = self.egui_ctx.is_pointer_over_area();

        match event {
            WindowEvent::CloseRequested => {
                self.state.viewer.token().cancel();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.state.viewer.resize(new_size.width, new_size.height);
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(key, event_loop),
            WindowEvent::MouseInput { button, state, .. } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    MouseButton::Middle => PointerButton::Middle,
                    _ => return,
                };
                let pressed = state == ElementState::Pressed;
                if pressed && pointer_on_ui {
                    return;
                }
                self.state.pointer.button(button, pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let input = self
                    .state
                    .pointer
                    .cursor_moved(position.x as f32, position.y as f32);
                self.apply_input(input);
            }
            WindowEvent::CursorLeft { .. } => self.state.pointer.cursor_left(),
            WindowEvent::MouseWheel { delta, .. } if !pointer_on_ui => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                let input = self.state.pointer.wheel(lines);
                self.apply_input(input);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = &self.renderer {
            tracing::info!(
                ticks = self.state.viewer.frame_loop.ticks(),
                presents = renderer.presents(),
                "earthview-desktop exiting"
            );
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = ViewerConfig::load_or_default(cli.config.as_deref())?;
    if let Some(assets) = cli.assets {
        config.scene.asset_root = assets;
    }
    if let Some(texture) = cli.texture {
        config.scene.texture = texture;
    }

    tracing::info!("earthview-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(&config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
