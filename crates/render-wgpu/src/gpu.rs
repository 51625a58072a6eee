use crate::buffers::{
    FrameUniforms, GpuLineVertex, MeshVertex, ObjectUniforms, line_vertices, mesh_vertices,
};
use crate::shaders;
use earthview_assets::TextureImage;
use earthview_common::{Color, ObjectId, Transform};
use earthview_scene::{
    BasicMaterial, ObjectKind, PerspectiveCamera, SceneGraph, SphereGeometry, Viewport,
};
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const MSAA_SAMPLES: u32 = 4;

/// Uniform buffer and bind group holding one object's model matrix and tint.
struct ObjectBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct LineDraw {
    vertices: wgpu::Buffer,
    count: u32,
    object: ObjectBinding,
}

struct MeshDraw {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    material: Arc<wgpu::BindGroup>,
    object: ObjectBinding,
}

/// Render targets that follow the output size.
struct Targets {
    depth: wgpu::TextureView,
    msaa: Option<wgpu::TextureView>,
    size: (u32, u32),
}

/// wgpu scene renderer: helper line lists plus unlit textured meshes.
///
/// GPU resources are created the first time an object is drawn and cached by
/// object id. Scene objects are never removed, so the cache only grows.
pub struct WgpuRenderer {
    mesh_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white_material: Arc<wgpu::BindGroup>,
    lines: HashMap<ObjectId, LineDraw>,
    meshes: HashMap<ObjectId, MeshDraw>,
    targets: Targets,
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
}

impl WgpuRenderer {
    /// `viewport` supplies the initial target size and whether to multisample.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        viewport: &Viewport,
    ) -> Self {
        let sample_count = if viewport.antialias { MSAA_SAMPLES } else { 1 };

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::from_camera(&PerspectiveCamera::default())),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_layout = uniform_layout(device, "frame_layout");
        let object_layout = uniform_layout(device, "object_layout");
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("map_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &object_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let line_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("line_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LINE_SHADER.into()),
        });

        let target = PipelineTarget {
            format: surface_format,
            sample_count,
        };
        let mesh_pipeline = create_pipeline(
            device,
            &target,
            PipelineDesc {
                label: "mesh_pipeline",
                layout: &mesh_layout,
                shader: &mesh_shader,
                vs: "vs_mesh",
                fs: "fs_mesh",
                vertex: wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MeshVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                },
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
            },
        );
        let line_pipeline = create_pipeline(
            device,
            &target,
            PipelineDesc {
                label: "line_pipeline",
                layout: &line_layout,
                shader: &line_shader,
                vs: "vs_line",
                fs: "fs_line",
                vertex: wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GpuLineVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4],
                },
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
            },
        );

        let white = TextureImage::solid(1, 1, [255, 255, 255, 255]);
        let white_material = Arc::new(material_bind_group(
            device,
            &material_layout,
            &sampler,
            &upload_texture(device, queue, &white),
        ));

        let targets = Targets::new(
            device,
            surface_format,
            sample_count,
            viewport.width,
            viewport.height,
        );

        tracing::debug!(?surface_format, sample_count, "wgpu renderer created");

        Self {
            mesh_pipeline,
            line_pipeline,
            frame_buffer,
            frame_bind_group,
            object_layout,
            material_layout,
            sampler,
            white_material,
            lines: HashMap::new(),
            meshes: HashMap::new(),
            targets,
            surface_format,
            sample_count,
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.targets.size == (width.max(1), height.max(1)) {
            return;
        }
        self.targets = Targets::new(device, self.surface_format, self.sample_count, width, height);
    }

    /// Objects with GPU resources.
    pub fn cached_objects(&self) -> usize {
        self.lines.len() + self.meshes.len()
    }

    /// Clear `view` to the viewport's clear color and draw the whole scene.
    ///
    /// `view` must match the size last passed to [`WgpuRenderer::resize`].
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        viewport: &Viewport,
    ) {
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::from_camera(camera)),
        );

        for obj in scene.objects() {
            match &obj.kind {
                ObjectKind::Axes { .. } | ObjectKind::Grid { .. } => {
                    let draw = self.lines.entry(obj.id).or_insert_with(|| {
                        build_lines(device, &self.object_layout, &obj.kind, obj.id)
                    });
                    write_object(queue, &draw.object, &obj.transform, Color::WHITE);
                }
                ObjectKind::Mesh { geometry, material } => {
                    let draw = self.meshes.entry(obj.id).or_insert_with(|| {
                        build_mesh(
                            device,
                            queue,
                            MeshResources {
                                object_layout: &self.object_layout,
                                material_layout: &self.material_layout,
                                sampler: &self.sampler,
                                white_material: &self.white_material,
                            },
                            geometry,
                            material,
                        )
                    });
                    write_object(queue, &draw.object, &obj.transform, material.color);
                }
                ObjectKind::AmbientLight { .. } => {}
            }
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });
        {
            let (color_view, resolve_target) = match &self.targets.msaa {
                Some(msaa) => (msaa, Some(view)),
                None => (view, None),
            };
            let clear = viewport.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.r() as f64,
                            g: clear.g() as f64,
                            b: clear.b() as f64,
                            a: clear.alpha as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            // Insertion order is draw order.
            for obj in scene.objects() {
                if let Some(draw) = self.lines.get(&obj.id) {
                    pass.set_pipeline(&self.line_pipeline);
                    pass.set_bind_group(1, &draw.object.bind_group, &[]);
                    pass.set_vertex_buffer(0, draw.vertices.slice(..));
                    pass.draw(0..draw.count, 0..1);
                } else if let Some(draw) = self.meshes.get(&obj.id) {
                    pass.set_pipeline(&self.mesh_pipeline);
                    pass.set_bind_group(1, &draw.object.bind_group, &[]);
                    pass.set_bind_group(2, draw.material.as_ref(), &[]);
                    pass.set_vertex_buffer(0, draw.vertices.slice(..));
                    pass.set_index_buffer(draw.indices.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..draw.index_count, 0, 0..1);
                }
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}

impl Targets {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        sample_count: u32,
        width: u32,
        height: u32,
    ) -> Self {
        let size = (width.max(1), height.max(1));
        let depth = render_target(device, "depth_texture", DEPTH_FORMAT, sample_count, size);
        let msaa = (sample_count > 1)
            .then(|| render_target(device, "msaa_color", format, sample_count, size));
        Self { depth, msaa, size }
    }
}

fn render_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    sample_count: u32,
    (width, height): (u32, u32),
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

struct PipelineTarget {
    format: wgpu::TextureFormat,
    sample_count: u32,
}

struct PipelineDesc<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    vs: &'a str,
    fs: &'a str,
    vertex: wgpu::VertexBufferLayout<'a>,
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
}

fn create_pipeline(
    device: &wgpu::Device,
    target: &PipelineTarget,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: desc.shader,
            entry_point: Some(desc.vs),
            compilation_options: Default::default(),
            buffers: &[desc.vertex],
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.shader,
            entry_point: Some(desc.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target.format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            cull_mode: desc.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: target.sample_count,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}

fn object_binding(device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> ObjectBinding {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("object_uniforms"),
        contents: bytemuck::bytes_of(&ObjectUniforms::new(&Transform::default(), Color::WHITE)),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("object_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });
    ObjectBinding { buffer, bind_group }
}

fn write_object(queue: &wgpu::Queue, binding: &ObjectBinding, transform: &Transform, tint: Color) {
    queue.write_buffer(
        &binding.buffer,
        0,
        bytemuck::bytes_of(&ObjectUniforms::new(transform, tint)),
    );
}

fn build_lines(
    device: &wgpu::Device,
    object_layout: &wgpu::BindGroupLayout,
    kind: &ObjectKind,
    id: ObjectId,
) -> LineDraw {
    let verts = line_vertices(kind).unwrap_or_default();
    tracing::debug!(id = %id.short(), kind = kind.label(), vertices = verts.len(), "uploading lines");
    let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("line_vertices"),
        contents: bytemuck::cast_slice(&verts),
        usage: wgpu::BufferUsages::VERTEX,
    });
    LineDraw {
        vertices,
        count: verts.len() as u32,
        object: object_binding(device, object_layout),
    }
}

struct MeshResources<'a> {
    object_layout: &'a wgpu::BindGroupLayout,
    material_layout: &'a wgpu::BindGroupLayout,
    sampler: &'a wgpu::Sampler,
    white_material: &'a Arc<wgpu::BindGroup>,
}

fn build_mesh(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    res: MeshResources<'_>,
    geometry: &SphereGeometry,
    material: &BasicMaterial,
) -> MeshDraw {
    let mesh = geometry.build();
    let verts = mesh_vertices(&mesh);
    tracing::debug!(
        vertices = verts.len(),
        triangles = mesh.triangle_count(),
        "uploading mesh"
    );

    let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("mesh_vertices"),
        contents: bytemuck::cast_slice(&verts),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("mesh_indices"),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    let max_dim = device.limits().max_texture_dimension_2d;
    let material_group = match &material.map {
        Some(map) if map.width() <= max_dim && map.height() <= max_dim => {
            let view = upload_texture(device, queue, map);
            Arc::new(material_bind_group(device, res.material_layout, res.sampler, &view))
        }
        Some(map) => {
            tracing::warn!(
                width = map.width(),
                height = map.height(),
                max_dim,
                "texture exceeds device limit, drawing untextured"
            );
            Arc::clone(res.white_material)
        }
        None => Arc::clone(res.white_material),
    };

    MeshDraw {
        vertices,
        indices,
        index_count: mesh.indices.len() as u32,
        material: material_group,
        object: object_binding(device, res.object_layout),
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &TextureImage,
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: image.width(),
        height: image.height(),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("map_texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.pixels(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width()),
            rows_per_image: Some(image.height()),
        },
        size,
    );
    texture.create_view(&Default::default())
}

fn material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    view: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("material_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
