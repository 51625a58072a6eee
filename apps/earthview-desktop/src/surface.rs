use earthview_render::{RenderError, Renderer};
use earthview_render_wgpu::WgpuRenderer;
use earthview_scene::{PerspectiveCamera, SceneGraph, Viewport};
use std::sync::Arc;
use winit::window::Window;

/// Window surface plus the scene and egui renderers that draw into it.
///
/// Render calls made between [`SurfaceRenderer::begin_frame`] and
/// [`SurfaceRenderer::end_frame`] draw into the same acquired texture, so a
/// tick that renders twice still presents once. A render outside a frame
/// (e.g. from a camera drag) acquires, draws and presents on its own, reusing
/// the last egui output.
pub struct SurfaceRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    scene: WgpuRenderer,
    overlay: Overlay,
    frame: Option<Frame>,
    presents: u64,
}

struct Frame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Last tessellated egui output.
struct Overlay {
    renderer: egui_wgpu::Renderer,
    paint_jobs: Vec<egui::ClippedPrimitive>,
    pixels_per_point: f32,
}

impl SurfaceRenderer {
    pub fn new(window: Arc<Window>, viewport: &Viewport) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow::anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("earthview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let viewport = Viewport {
            width: config.width,
            height: config.height,
            ..*viewport
        };
        let scene = WgpuRenderer::new(&device, &queue, format, &viewport);
        let overlay = Overlay {
            renderer: egui_wgpu::Renderer::new(&device, format, None, 1, false),
            paint_jobs: Vec::new(),
            pixels_per_point: window.scale_factor() as f32,
        };

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            adapter = %adapter.get_info().name,
            ?format,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            scene,
            overlay,
            frame: None,
            presents: 0,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Frames shown so far.
    pub fn presents(&self) -> u64 {
        self.presents
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.frame = None;
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.scene
            .resize(&self.device, self.config.width, self.config.height);
    }

    /// Re-apply the current configuration after a lost or outdated surface.
    pub fn reconfigure(&mut self) {
        self.frame = None;
        self.surface.configure(&self.device, &self.config);
    }

    /// Upload egui texture changes and keep the tessellated output for every
    /// present until the next call.
    pub fn set_overlay(
        &mut self,
        paint_jobs: Vec<egui::ClippedPrimitive>,
        textures: &egui::TexturesDelta,
        pixels_per_point: f32,
    ) {
        for (id, delta) in &textures.set {
            self.overlay
                .renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }
        for id in &textures.free {
            self.overlay.renderer.free_texture(id);
        }
        self.overlay.paint_jobs = paint_jobs;
        self.overlay.pixels_per_point = pixels_per_point;
    }

    pub fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.frame = Some(self.acquire()?);
        Ok(())
    }

    /// Paint the overlay over the frame and present it. No-op outside a frame.
    pub fn end_frame(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.present(frame);
        }
    }

    fn acquire(&self) -> Result<Frame, RenderError> {
        let texture = self.surface.get_current_texture().map_err(|e| match e {
            wgpu::SurfaceError::Lost => RenderError::SurfaceLost,
            wgpu::SurfaceError::Outdated => RenderError::SurfaceOutdated,
            wgpu::SurfaceError::Timeout => RenderError::Timeout,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            other => RenderError::Backend(other.to_string()),
        })?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Frame { texture, view })
    }

    fn present(&mut self, frame: Frame) {
        self.paint_overlay(&frame.view);
        frame.texture.present();
        self.presents += 1;
    }

    fn paint_overlay(&mut self, view: &wgpu::TextureView) {
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.overlay.pixels_per_point,
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        let callbacks = self.overlay.renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.overlay.paint_jobs,
            &screen,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.overlay
                .renderer
                .render(&mut pass, &self.overlay.paint_jobs, &screen);
        }
        self.queue
            .submit(callbacks.into_iter().chain(std::iter::once(encoder.finish())));
    }
}

impl Renderer for SurfaceRenderer {
    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        viewport: &Viewport,
    ) -> Result<(), RenderError> {
        match &self.frame {
            Some(frame) => {
                self.scene
                    .draw(&self.device, &self.queue, &frame.view, scene, camera, viewport);
            }
            None => {
                let frame = self.acquire()?;
                self.scene
                    .draw(&self.device, &self.queue, &frame.view, scene, camera, viewport);
                self.present(frame);
            }
        }
        Ok(())
    }
}
