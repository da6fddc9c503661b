use std::sync::Arc;

use anyhow::Context;
use glam::{Mat4, Vec2, Vec3};
use pollster::block_on;
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use winit::window::Window;

/// Position and color, matching the shader's vertex input.
pub type ColorVertex = [Vec3; 2];

/// CPU-side geometry of one scene object. `lines` holds vertex pairs.
#[derive(Debug, Default, PartialEq)]
pub struct MeshData {
    pub triangles: Vec<ColorVertex>,
    pub lines: Vec<ColorVertex>,
}

struct VertexBuffer {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

/// GPU resources of one scene object: its geometry plus a model matrix that
/// places it.
pub struct GpuObject {
    triangles: Option<VertexBuffer>,
    lines: Option<VertexBuffer>,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
}

pub struct Renderer {
    pub window: Arc<Window>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::Texture,
    camera_buffer: wgpu::Buffer,
    surface: wgpu::Surface<'static>,
    triangle_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    camera_bind_group: wgpu::BindGroup,
    uniform_layout: wgpu::BindGroupLayout,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&Default::default());

        let size = window.inner_size();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create window surface")?;

        let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            compatible_surface: Some(&surface),
            ..Default::default()
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = block_on(adapter.request_device(&Default::default()))
            .context("failed to open GPU device")?;

        log::info!("rendering with {:?}", adapter.get_info().name);

        let surface_config = surface_configuration(size.width, size.height);
        surface.configure(&device, &surface_config);

        // Camera (group 0) and per-object model (group 1) matrices share a
        // layout.
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mat4 uniform"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(64),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&uniform_layout, &uniform_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!("shader.wgsl"));

        let triangle_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            wgpu::PrimitiveTopology::TriangleList,
        );
        let line_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            wgpu::PrimitiveTopology::LineList,
        );

        let camera_buffer = create_matrix_buffer(&device, &Mat4::IDENTITY);
        let camera_bind_group = create_matrix_bind_group(&device, &uniform_layout, &camera_buffer);

        let depth_texture = create_depth_texture(&device, &surface_config);

        Ok(Self {
            window,
            device,
            queue,
            surface_config,
            surface,
            depth_texture,
            camera_buffer,
            triangle_pipeline,
            line_pipeline,
            camera_bind_group,
            uniform_layout,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.surface_config = surface_configuration(width, height);
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_texture = create_depth_texture(&self.device, &self.surface_config);
    }

    pub fn set_proj_view(&self, proj_view: &Mat4) {
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(proj_view.as_ref()));
    }

    /// Uploads `mesh` as a new object placed at `position`.
    pub fn create_object(&self, mesh: &MeshData, position: Vec2) -> GpuObject {
        let model_buffer = create_matrix_buffer(&self.device, &model_matrix(position));
        let model_bind_group =
            create_matrix_bind_group(&self.device, &self.uniform_layout, &model_buffer);

        GpuObject {
            triangles: self.create_vertex_buffer(&mesh.triangles),
            lines: self.create_vertex_buffer(&mesh.lines),
            model_buffer,
            model_bind_group,
        }
    }

    /// Moves an object without touching its geometry.
    pub fn set_object_position(&self, object: &GpuObject, position: Vec2) {
        let model = model_matrix(position);
        self.queue
            .write_buffer(&object.model_buffer, 0, bytemuck::cast_slice(model.as_ref()));
    }

    fn create_vertex_buffer(&self, vertices: &[ColorVertex]) -> Option<VertexBuffer> {
        if vertices.is_empty() {
            return None;
        }

        let buffer = self.device.create_buffer_init(&BufferInitDescriptor {
            label: None,
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Some(VertexBuffer {
            buffer,
            vertex_count: vertices.len() as u32,
        })
    }

    pub fn frame_surface_texture(&self) -> Option<wgpu::SurfaceTexture> {
        self.surface.get_current_texture().ok()
    }

    /// Draws all triangles, then all lines, so outlines stay on top of fills
    /// at the same depth.
    pub fn draw(&self, view: &wgpu::TextureView, objects: &[&GpuObject]) {
        let mut encoder: wgpu::CommandEncoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        let depth_texture_view = self.depth_texture.create_view(&Default::default());

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: None,
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.05,
                        g: 0.05,
                        b: 0.06,
                        a: 1.,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_texture_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        rpass.set_bind_group(0, &self.camera_bind_group, &[]);

        let passes = [(&self.triangle_pipeline, true), (&self.line_pipeline, false)];

        for (pipeline, triangles) in passes {
            rpass.set_pipeline(pipeline);

            for object in objects {
                let vertex_buffer = if triangles {
                    &object.triangles
                } else {
                    &object.lines
                };
                let Some(vertex_buffer) = vertex_buffer else {
                    continue;
                };

                rpass.set_bind_group(1, &object.model_bind_group, &[]);
                rpass.set_vertex_buffer(0, vertex_buffer.buffer.slice(..));
                rpass.draw(0..vertex_buffer.vertex_count, 0..1);
            }
        }

        drop(rpass);

        self.queue.submit(Some(encoder.finish()));
    }
}

fn model_matrix(position: Vec2) -> Mat4 {
    Mat4::from_translation(position.extend(0.))
}

fn create_matrix_buffer(device: &wgpu::Device, matrix: &Mat4) -> wgpu::Buffer {
    device.create_buffer_init(&BufferInitDescriptor {
        label: None,
        contents: bytemuck::cast_slice(matrix.as_ref()),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

fn create_matrix_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: None,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    let vertex_buffers = &[wgpu::VertexBufferLayout {
        array_stride: 24,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 12,
                shader_location: 1,
            },
        ],
    }];

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: None,
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: None,
            compilation_options: Default::default(),
            buffers: vertex_buffers,
        },
        primitive: wgpu::PrimitiveState {
            topology,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: Default::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: None,
            compilation_options: Default::default(),
            targets: &[Some(wgpu::TextureFormat::Bgra8UnormSrgb.into())],
        }),
        multiview: None,
        cache: None,
    })
}

fn surface_configuration(width: u32, height: u32) -> wgpu::SurfaceConfiguration {
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: wgpu::TextureFormat::Bgra8UnormSrgb,
        width: width.max(1),
        height: height.max(1),
        present_mode: wgpu::PresentMode::Fifo,
        desired_maximum_frame_latency: 2,
        alpha_mode: wgpu::CompositeAlphaMode::Auto,
        view_formats: vec![wgpu::TextureFormat::Bgra8Unorm],
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width: config.width.max(1),
        height: config.height.max(1),
        depth_or_array_layers: 1,
    };

    let desc = wgpu::TextureDescriptor {
        label: None,
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    };

    device.create_texture(&desc)
}
