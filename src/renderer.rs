// Renderer module: draws the room scene with wgpu

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use wgpu::{Adapter, BindGroup, BindGroupLayout, Buffer, RenderPipeline};

use crate::camera::PerspectiveCamera;
use crate::error::RenderError;
use crate::scene::{Material, NodeId, Primitive, Scene, TextureSource};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

// Define Vertex struct for vertex data
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-frame camera and lighting.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    sun_dir: [f32; 4],
    sun_color: [f32; 4],
    ambient: [f32; 4],
}

/// Per-primitive transform and material parameters.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    emissive: [f32; 4],
    uv_transform: [f32; 4],
}

impl DrawUniforms {
    fn new(world: Mat4, material: &Material) -> Self {
        let color = srgb_to_linear(material.color);
        Self {
            model: world.to_cols_array_2d(),
            normal_matrix: world.inverse().transpose().to_cols_array_2d(),
            color: color.extend(1.0).to_array(),
            emissive: material.emissive.extend(0.0).to_array(),
            uv_transform: [
                material.map_repeat.x,
                material.map_repeat.y,
                material.map_rotation,
                0.0,
            ],
        }
    }
}

/// GPU copies of one scene primitive.
struct GpuPrimitive {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
    uniform_buffer: Buffer,
    bind_group: BindGroup,
}

struct DrawCall {
    key: (NodeId, usize),
    texture: Option<String>,
    double_sided: bool,
}

pub struct Renderer {
    adapter: Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    pipeline: RenderPipeline,
    double_sided_pipeline: RenderPipeline,
    globals_buffer: Buffer,
    globals_bind_group: BindGroup,
    draw_layout: BindGroupLayout,
    texture_layout: BindGroupLayout,
    sampler: wgpu::Sampler,
    white_texture: BindGroup,
    /// `None` marks a texture that failed to load; it is not retried.
    textures: HashMap<String, Option<BindGroup>>,
    primitives: HashMap<(NodeId, usize), GpuPrimitive>,
    asset_root: PathBuf,
}

impl Renderer {
    pub async fn new(window: Arc<winit::window::Window>, asset_root: PathBuf) -> Result<Self, RenderError> {
        // Initialize wgpu
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Renderer Device"),
                    required_features: wgpu::Features::default(),
                    required_limits: wgpu::Limits::default(),
                },
                None, // Trace path
            )
            .await?;

        // Get surface capabilities
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        let depth_view = create_depth_view(&device, &surface_config);

        // Load shader
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Room Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let globals_layout = uniform_layout(&device, "Globals Bind Group Layout", wgpu::ShaderStages::VERTEX_FRAGMENT);
        let draw_layout = uniform_layout(&device, "Draw Bind Group Layout", wgpu::ShaderStages::VERTEX_FRAGMENT);
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Bind Group Layout"),
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

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&globals_layout, &draw_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let pipeline = create_pipeline(
            &device,
            &render_pipeline_layout,
            &shader_module,
            surface_format,
            Some(wgpu::Face::Back),
        );
        let double_sided_pipeline =
            create_pipeline(&device, &render_pipeline_layout, &shader_module, surface_format, None);

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Buffer"),
            size: std::mem::size_of::<Globals>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        // Textures repeat so tiled floors and walls work.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texture Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let white = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let white_texture = upload_texture(&device, &queue, &texture_layout, &sampler, &white, "white");

        Ok(Self {
            adapter,
            device,
            queue,
            surface,
            surface_config,
            depth_view,
            pipeline,
            double_sided_pipeline,
            globals_buffer,
            globals_bind_group,
            draw_layout,
            texture_layout,
            sampler,
            white_texture,
            textures: HashMap::new(),
            primitives: HashMap::new(),
            asset_root,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let surface_caps = self.surface.get_capabilities(&self.adapter);
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface_config.present_mode = surface_caps.present_modes[0];
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    pub fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        self.write_globals(scene, camera);
        let draws = self.prepare(scene);

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => {
                log::debug!("Surface lost ({err}), reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return;
            }
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let background = srgb_to_linear(scene.background);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: background.x as f64,
                            g: background.y as f64,
                            b: background.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
            for draw in &draws {
                let Some(gpu) = self.primitives.get(&draw.key) else {
                    continue;
                };
                let texture = draw
                    .texture
                    .as_ref()
                    .and_then(|key| self.textures.get(key))
                    .and_then(Option::as_ref)
                    .unwrap_or(&self.white_texture);
                let pipeline = if draw.double_sided {
                    &self.double_sided_pipeline
                } else {
                    &self.pipeline
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, &gpu.bind_group, &[]);
                render_pass.set_bind_group(2, texture, &[]);
                render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..gpu.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }

    fn write_globals(&self, scene: &Scene, camera: &PerspectiveCamera) {
        let lighting = scene.lighting;
        let sun_dir = lighting.sun_position.normalize_or_zero();
        let ambient = lighting.ambient_color * lighting.ambient_intensity;
        let globals = Globals {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            sun_dir: sun_dir.extend(lighting.sun_intensity).to_array(),
            sun_color: lighting.sun_color.extend(1.0).to_array(),
            ambient: ambient.extend(1.0).to_array(),
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::cast_slice(&[globals]));
    }

    /// Uploads whatever is new, refreshes uniforms and drops GPU data of
    /// deleted nodes. Returns the draw list for this frame.
    fn prepare(&mut self, scene: &Scene) -> Vec<DrawCall> {
        let nodes = scene.mesh_nodes();
        let live: HashSet<NodeId> = nodes.iter().map(|(id, _)| *id).collect();
        self.primitives.retain(|(id, _), _| live.contains(id));

        let mut draws = Vec::new();
        for (id, world) in nodes {
            let Some(mesh) = scene.get(id).and_then(|n| n.mesh.as_ref()) else {
                continue;
            };
            for (index, primitive) in mesh.primitives.iter().enumerate() {
                let key = (id, index);
                if !self.primitives.contains_key(&key) {
                    let gpu = self.upload_primitive(primitive);
                    self.primitives.insert(key, gpu);
                }
                if let Some(gpu) = self.primitives.get(&key) {
                    let uniforms = DrawUniforms::new(world, &primitive.material);
                    self.queue
                        .write_buffer(&gpu.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
                }

                let texture = primitive.material.map.as_ref().map(|source| {
                    self.ensure_texture(source);
                    source.key().to_string()
                });
                draws.push(DrawCall {
                    key,
                    texture,
                    double_sided: primitive.material.double_sided,
                });
            }
        }
        draws
    }

    fn upload_primitive(&self, primitive: &Primitive) -> GpuPrimitive {
        let vertices: Vec<Vertex> = primitive
            .positions
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex {
                position: position.to_array(),
                normal: primitive.normals.get(i).copied().unwrap_or(Vec3::Y).to_array(),
                uv: primitive.uvs.get(i).map(|uv| uv.to_array()).unwrap_or([0.0, 0.0]),
            })
            .collect();

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&primitive.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniform Buffer"),
            size: std::mem::size_of::<DrawUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout: &self.draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        GpuPrimitive {
            vertex_buffer,
            index_buffer,
            index_count: primitive.indices.len() as u32,
            uniform_buffer,
            bind_group,
        }
    }

    fn ensure_texture(&mut self, source: &TextureSource) {
        if self.textures.contains_key(source.key()) {
            return;
        }
        let bind_group = match source {
            TextureSource::Embedded { key, image } => Some(upload_texture(
                &self.device,
                &self.queue,
                &self.texture_layout,
                &self.sampler,
                image,
                key,
            )),
            TextureSource::File(path) => match image::open(self.asset_root.join(path)) {
                Ok(decoded) => Some(upload_texture(
                    &self.device,
                    &self.queue,
                    &self.texture_layout,
                    &self.sampler,
                    &decoded.to_rgba8(),
                    path,
                )),
                Err(err) => {
                    log::warn!("Could not load texture {path}: {err}");
                    None
                }
            },
        };
        self.textures.insert(source.key().to_string(), bind_group);
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str, visibility: wgpu::ShaderStages) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader_module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
) -> RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader_module,
            entry_point: "vs_main",
            buffers: &[Vertex::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader_module,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &BindGroupLayout,
    sampler: &wgpu::Sampler,
    image: &image::RgbaImage,
    label: &str,
) -> BindGroup {
    let (width, height) = image.dimensions();
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

/// Material colours are authored in sRGB; the shader works in linear space.
fn srgb_to_linear(color: Vec3) -> Vec3 {
    let channel = |c: f32| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(channel(color.x), channel(color.y), channel(color.z))
}
