//! wgpu backend for [`GraphicsContext`].
//! wgpu = 26.x, winit = 0.30.x
//!
//! Draws are recorded during the frame and replayed in one render pass by
//! [`WgpuContext::present`]. Per-draw matrices live in a single uniform
//! buffer addressed with dynamic offsets.

use std::collections::HashMap;
use std::sync::Arc;

use asset::TextureData;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::{
    util::{DeviceExt, TextureDataOrder},
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, BlendState,
    Buffer, BufferBinding, BufferBindingType, BufferDescriptor, BufferSize, BufferUsages,
    ColorTargetState, ColorWrites, CommandEncoderDescriptor, CompareFunction, DepthBiasState,
    DepthStencilState, Device, DeviceDescriptor, Extent3d, Features, FilterMode, FragmentState,
    FrontFace, IndexFormat, Instance, InstanceDescriptor, Limits, LoadOp, Operations,
    PipelineLayout, PipelineLayoutDescriptor, PowerPreference, PresentMode, PrimitiveState,
    PrimitiveTopology, Queue, RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline,
    RenderPipelineDescriptor, Sampler, SamplerBindingType, SamplerDescriptor, ShaderModule,
    ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp, Surface, SurfaceConfiguration,
    SurfaceError, TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType,
    TextureUsages, TextureView, TextureViewDescriptor, TextureViewDimension, VertexBufferLayout,
    VertexState, VertexStepMode,
};
use winit::{dpi::PhysicalSize, window::Window};

use crate::context::{
    BufferHandle, DrawCall, GpuVertex, GraphicsContext, Primitive, ShaderHandle, ShaderKind,
    TextureHandle,
};
use crate::{RenderError, RenderResult};

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Maps OpenGL clip depth [-1, 1] to wgpu's [0, 1].
#[rustfmt::skip]
const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

const VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: std::mem::size_of::<GpuVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x4
    ],
};

/// Per-draw uniform block (matches `DrawUniform` in globe.wgsl).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct DrawUniform {
    proj: [f32; 16],
    model_view: [f32; 16],
    color: [f32; 4],
}

const UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniform>() as u64;
const INITIAL_UNIFORM_SLOTS: u64 = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    kind: ShaderKind,
    primitive: Primitive,
    blending: bool,
}

/// Handle-indexed storage that reuses freed slots.
struct Slots<T> {
    items: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Slots<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            free: Vec::new(),
        }
    }

    fn insert(&mut self, item: T) -> u32 {
        match self.free.pop() {
            Some(id) => {
                self.items[id as usize] = Some(item);
                id
            }
            None => {
                self.items.push(Some(item));
                self.items.len() as u32 - 1
            }
        }
    }

    /// Drops the item; freeing an empty or unknown slot does nothing.
    fn remove(&mut self, id: u32) -> Option<T> {
        let item = self.items.get_mut(id as usize)?.take()?;
        self.free.push(id);
        Some(item)
    }

    fn get(&self, id: u32) -> Option<&T> {
        self.items.get(id as usize)?.as_ref()
    }

    fn len(&self) -> usize {
        self.items.len() - self.free.len()
    }
}

struct RecordedDraw {
    key: PipelineKey,
    call: DrawCall,
    uniform_offset: u32,
}

pub struct WgpuContext {
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    device: Device,
    queue: Queue,
    depth_view: TextureView,

    shader: ShaderModule,
    pipeline_layout: PipelineLayout,
    pipelines: HashMap<PipelineKey, RenderPipeline>,

    uniform_bgl: BindGroupLayout,
    uniform_buf: Buffer,
    uniform_bg: BindGroup,
    uniform_stride: u64,
    uniform_slots: u64,

    texture_bgl: BindGroupLayout,
    sampler: Sampler,
    white_texture: BindGroup,

    shaders: Vec<ShaderKind>,
    buffers: Slots<Buffer>,
    textures: Slots<BindGroup>,

    // Frame recording
    viewport: (u32, u32),
    clear_color: wgpu::Color,
    uniforms: Vec<u8>,
    draws: Vec<RecordedDraw>,
}

impl WgpuContext {
    /// Create the context bound to an Arc<Window>.
    pub async fn new(window: Arc<Window>, backends: wgpu::Backends) -> anyhow::Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("GPU adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Globe Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
                ..Default::default()
            })
            .await?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no supported formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        let depth_view = create_depth_view(&device, &surface_config);

        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Globe WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/globe.wgsl").into()),
        });

        let uniform_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Draw BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: BufferSize::new(UNIFORM_SIZE),
                },
                count: None,
            }],
        });
        let texture_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Texture BGL"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Globe PipelineLayout"),
            bind_group_layouts: &[&uniform_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });

        // Longitude wraps, latitude clamps at the poles.
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("Surface Sampler"),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..Default::default()
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let uniform_stride = UNIFORM_SIZE.div_ceil(alignment) * alignment;
        let (uniform_buf, uniform_bg) =
            create_uniform_buffer(&device, &uniform_bgl, uniform_stride * INITIAL_UNIFORM_SLOTS);

        let white = TextureData::new_rgba8(1, 1, vec![255; 4]);
        let white_texture = upload_texture(&device, &queue, &texture_bgl, &sampler, "White", &white);

        log::info!("wgpu context ready: {width}x{height}, format {surface_format:?}");
        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            depth_view,
            shader,
            pipeline_layout,
            pipelines: HashMap::new(),
            uniform_bgl,
            uniform_buf,
            uniform_bg,
            uniform_stride,
            uniform_slots: INITIAL_UNIFORM_SLOTS,
            texture_bgl,
            sampler,
            white_texture,
            shaders: Vec::new(),
            buffers: Slots::new(),
            textures: Slots::new(),
            viewport: (width, height),
            clear_color: wgpu::Color::BLACK,
            uniforms: Vec::new(),
            draws: Vec::new(),
        })
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width.max(1);
        self.surface_config.height = height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.surface_config.width, self.surface_config.height);
    }

    /// Replays the recorded frame into the swapchain image and presents it.
    /// The recording is consumed even when the surface cannot be acquired.
    pub fn present(&mut self) -> Result<(), SurfaceError> {
        let draws = std::mem::take(&mut self.draws);
        let uniforms = std::mem::take(&mut self.uniforms);

        for draw in &draws {
            self.ensure_pipeline(draw.key);
        }
        self.ensure_uniform_capacity(draws.len() as u64);
        if !uniforms.is_empty() {
            self.queue.write_buffer(&self.uniform_buf, 0, &uniforms);
        }

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Globe Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let vw = self.viewport.0.clamp(1, self.surface_config.width);
            let vh = self.viewport.1.clamp(1, self.surface_config.height);
            rpass.set_viewport(0.0, 0.0, vw as f32, vh as f32, 0.0, 1.0);

            for draw in &draws {
                let (Some(pipeline), Some(vb)) = (
                    self.pipelines.get(&draw.key),
                    self.buffers.get(draw.call.vertex_buffer.0),
                ) else {
                    continue;
                };
                let texture_bg = draw
                    .call
                    .texture
                    .and_then(|t| self.textures.get(t.0))
                    .unwrap_or(&self.white_texture);

                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &self.uniform_bg, &[draw.uniform_offset]);
                rpass.set_bind_group(1, texture_bg, &[]);
                rpass.set_vertex_buffer(0, vb.slice(..));
                match draw.call.index_buffer {
                    Some(ib) => {
                        let Some(ib) = self.buffers.get(ib.0) else {
                            continue;
                        };
                        rpass.set_index_buffer(ib.slice(..), IndexFormat::Uint32);
                        rpass.draw_indexed(0..draw.call.count, 0, 0..1);
                    }
                    None => rpass.draw(0..draw.call.count, 0..1),
                }
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let fs_entry = match key.kind {
            ShaderKind::VertexColor => "fs_vertex_color",
            ShaderKind::Textured => "fs_textured",
        };
        let topology = match key.primitive {
            Primitive::Points => PrimitiveTopology::PointList,
            Primitive::Lines => PrimitiveTopology::LineList,
            Primitive::Triangles => PrimitiveTopology::TriangleList,
        };
        let cull_mode = (key.primitive == Primitive::Triangles).then_some(wgpu::Face::Back);
        let blend = if key.blending {
            BlendState::ALPHA_BLENDING
        } else {
            BlendState::REPLACE
        };

        let label = format!("{:?}/{:?}/blend={}", key.kind, key.primitive, key.blending);
        log::debug!("creating pipeline {label}");
        let pipeline = self.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&self.pipeline_layout),
            vertex: VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[VERTEX_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &self.shader,
                entry_point: Some(fs_entry),
                targets: &[Some(ColorTargetState {
                    format: self.surface_config.format,
                    blend: Some(blend),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: PrimitiveState {
                topology,
                front_face: FrontFace::Ccw,
                cull_mode,
                ..Default::default()
            },
            // Translucent parts test depth but never occlude.
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: !key.blending,
                depth_compare: CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        self.pipelines.insert(key, pipeline);
    }

    fn ensure_uniform_capacity(&mut self, draws: u64) {
        if draws <= self.uniform_slots {
            return;
        }
        let slots = draws.next_power_of_two();
        log::debug!("growing draw uniform buffer to {slots} slots");
        let (buf, bg) = create_uniform_buffer(&self.device, &self.uniform_bgl, self.uniform_stride * slots);
        self.uniform_buf = buf;
        self.uniform_bg = bg;
        self.uniform_slots = slots;
    }

    fn push_buffer(&mut self, buffer: Buffer) -> BufferHandle {
        BufferHandle(self.buffers.insert(buffer))
    }
}

impl GraphicsContext for WgpuContext {
    fn create_vertex_buffer(&mut self, label: &str, vertices: &[GpuVertex]) -> RenderResult<BufferHandle> {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: BufferUsages::VERTEX,
        });
        Ok(self.push_buffer(buffer))
    }

    fn create_index_buffer(&mut self, label: &str, indices: &[u32]) -> RenderResult<BufferHandle> {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: BufferUsages::INDEX,
        });
        Ok(self.push_buffer(buffer))
    }

    fn release_buffer(&mut self, handle: BufferHandle) {
        self.buffers.remove(handle.0);
    }

    fn create_texture(&mut self, label: &str, texture: &TextureData) -> RenderResult<TextureHandle> {
        if !texture.is_valid() {
            return Err(RenderError::Backend(format!(
                "texture '{label}' has {} bytes for {}x{}",
                texture.data.len(),
                texture.width,
                texture.height
            )));
        }
        let max = self.device.limits().max_texture_dimension_2d;
        if texture.width > max || texture.height > max {
            return Err(RenderError::Backend(format!(
                "texture '{label}' is {}x{}, device limit is {max}",
                texture.width, texture.height
            )));
        }
        let bg = upload_texture(&self.device, &self.queue, &self.texture_bgl, &self.sampler, label, texture);
        let handle = TextureHandle(self.textures.insert(bg));
        log::debug!("texture '{label}' uploaded, {} live", self.textures.len());
        Ok(handle)
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(handle.0);
    }

    fn create_shader(&mut self, kind: ShaderKind) -> RenderResult<ShaderHandle> {
        if let Some(i) = self.shaders.iter().position(|&k| k == kind) {
            return Ok(ShaderHandle(i as u32));
        }
        self.shaders.push(kind);
        Ok(ShaderHandle(self.shaders.len() as u32 - 1))
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.clear_color = wgpu::Color {
            r: f64::from(color[0]),
            g: f64::from(color[1]),
            b: f64::from(color[2]),
            a: f64::from(color[3]),
        };
        self.draws.clear();
        self.uniforms.clear();
    }

    fn draw(&mut self, call: &DrawCall) -> RenderResult<()> {
        let kind = *self
            .shaders
            .get(call.shader.0 as usize)
            .ok_or_else(|| RenderError::Backend(format!("unknown shader {:?}", call.shader)))?;

        let proj = OPENGL_TO_WGPU_MATRIX * Mat4::from_cols_array(&call.proj);
        let uniform = DrawUniform {
            proj: proj.to_cols_array(),
            model_view: call.model_view,
            color: call.color,
        };
        let uniform_offset = self.uniforms.len() as u32;
        self.uniforms.extend_from_slice(bytemuck::bytes_of(&uniform));
        self.uniforms.resize(uniform_offset as usize + self.uniform_stride as usize, 0);

        self.draws.push(RecordedDraw {
            key: PipelineKey {
                kind,
                primitive: call.primitive,
                blending: call.blending,
            },
            call: call.clone(),
            uniform_offset,
        });
        Ok(())
    }
}

fn create_uniform_buffer(device: &Device, layout: &BindGroupLayout, size: u64) -> (Buffer, BindGroup) {
    let buffer = device.create_buffer(&BufferDescriptor {
        label: Some("Draw UBO"),
        size,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("Draw BG"),
        layout,
        entries: &[BindGroupEntry {
            binding: 0,
            resource: BindingResource::Buffer(BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: BufferSize::new(UNIFORM_SIZE),
            }),
        }],
    });
    (buffer, bind_group)
}

fn upload_texture(
    device: &Device,
    queue: &Queue,
    layout: &BindGroupLayout,
    sampler: &Sampler,
    label: &str,
    texture: &TextureData,
) -> BindGroup {
    let tex = device.create_texture_with_data(
        queue,
        &TextureDescriptor {
            label: Some(label),
            size: Extent3d {
                width: texture.width,
                height: texture.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        &texture.data,
    );
    let view = tex.create_view(&TextureViewDescriptor::default());
    device.create_bind_group(&BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: BindingResource::TextureView(&view),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::Sampler(sampler),
            },
        ],
    })
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn gl_depth_range_maps_to_zero_one() {
        let near = OPENGL_TO_WGPU_MATRIX * Vec4::new(0.3, -0.2, -1.0, 1.0);
        let far = OPENGL_TO_WGPU_MATRIX * Vec4::new(0.3, -0.2, 1.0, 1.0);
        assert_eq!(near, Vec4::new(0.3, -0.2, 0.0, 1.0));
        assert_eq!(far, Vec4::new(0.3, -0.2, 1.0, 1.0));
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut slots = Slots::new();
        let a = slots.insert("a");
        let b = slots.insert("b");
        assert_eq!((a, b), (0, 1));

        assert_eq!(slots.remove(a), Some("a"));
        assert_eq!(slots.remove(a), None);
        assert_eq!(slots.remove(42), None);
        assert_eq!(slots.get(a), None);
        assert_eq!(slots.len(), 1);

        assert_eq!(slots.insert("c"), a);
        assert_eq!(slots.get(a), Some(&"c"));
        assert_eq!(slots.get(b), Some(&"b"));
        assert_eq!(slots.items.len(), 2);
    }

    #[test]
    fn uniform_block_matches_shader_layout() {
        assert_eq!(UNIFORM_SIZE, 144);
        assert_eq!(VERTEX_LAYOUT.array_stride, 48);
        assert_eq!(VERTEX_LAYOUT.attributes[3].offset, 32);
    }
}
