use anyhow::{Result, anyhow};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingResource, BindingType, BufferBindingType, ColorTargetState,
    CommandEncoder, Device, FragmentState, PipelineCompilationOptions, PipelineLayoutDescriptor,
    PrimitiveState, Queue, RenderPipeline, SamplerBindingType, ShaderStages, TextureFormat,
    TextureSampleType, TextureView, TextureViewDimension, VertexState,
};

use crate::media::types::DecodedFrame;

const CHROMA_KEY_SHADER: &str = include_str!("../../../../assets/shaders/builtin/chroma_key.wgsl");

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 3],
    tex_coord: [f32; 2],
}

/// Triangle strip spanning [-1,1]×[-1,1] in the XY plane at Z=0. Texture V
/// is flipped so row 0 of the decoded frame lands at the top of the quad.
const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, -1.0, 0.0],
        tex_coord: [0.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, 1.0, 0.0],
        tex_coord: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, -1.0, 0.0],
        tex_coord: [1.0, 1.0],
    },
    QuadVertex {
        position: [1.0, 1.0, 0.0],
        tex_coord: [1.0, 0.0],
    },
];

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadUniforms {
    model_view_projection: [[f32; 4]; 4],
}

/// Owns the GPU resources for the clip quad and issues the per-frame draw.
///
/// The frame texture is written only by [`ChromaCompositor::upload_frame`]
/// (the pull of the latest decoded frame) and read only by the draw pass.
pub struct ChromaCompositor {
    pipeline: RenderPipeline,
    bind_group_layout: BindGroupLayout,
    bind_group: BindGroup,
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    frame_texture: wgpu::Texture,
    frame_view: TextureView,
    frame_sampler: wgpu::Sampler,
    frame_size: (u32, u32),
}

impl ChromaCompositor {
    /// Build the quad geometry, frame texture, and chroma-key pipeline.
    ///
    /// Shader or pipeline validation failure is fatal: the compositor cannot
    /// run without its program, so the error scope result aborts
    /// initialization instead of being logged.
    pub fn new(device: &Device, queue: &Queue, target_format: TextureFormat) -> Result<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let frame_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("clip-frame-sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        // Placeholder until the first decoded frame arrives; recreated at the
        // clip's real dimensions on first upload.
        let (frame_texture, frame_view) = create_frame_texture(device, 1, 1);
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &frame_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[0u8; 4],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("clip-quad-vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("clip-quad-uniforms"),
            size: std::mem::size_of::<QuadUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Bind group layout: frame texture(0), sampler(1), MVP uniform(2)
        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("clip-quad-bgl"),
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
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::VERTEX,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<QuadUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("chroma-key"),
            source: wgpu::ShaderSource::Wgsl(CHROMA_KEY_SHADER.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("chroma-key-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_attributes = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("chroma-key-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader_module,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &vertex_attributes,
                }],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader_module,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: target_format,
                    // Source-alpha over one-minus-source-alpha: the keyed-out
                    // background lets the host's scene show through.
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let bind_group = create_bind_group(
            device,
            &bind_group_layout,
            &frame_view,
            &frame_sampler,
            &uniform_buffer,
        );

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(anyhow!("chroma-key pipeline creation failed: {error}"));
        }
        log::info!("chroma-key compositor initialized");

        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_group,
            vertex_buffer,
            uniform_buffer,
            frame_texture,
            frame_view,
            frame_sampler,
            frame_size: (1, 1),
        })
    }

    /// Pull a decoded frame into the frame texture. Recreates the texture
    /// (and bind group) when the clip's dimensions change. GPU validation
    /// errors are logged with the call site, same as [`ChromaCompositor::draw`].
    pub fn upload_frame(&mut self, device: &Device, queue: &Queue, frame: &DecodedFrame) {
        let expected = frame.width as usize * frame.height as usize * 4;
        if frame.data.len() < expected {
            log::warn!(
                "decoded frame is short: {} bytes for {}x{}",
                frame.data.len(),
                frame.width,
                frame.height
            );
            return;
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        if (frame.width, frame.height) != self.frame_size {
            let (texture, view) = create_frame_texture(device, frame.width, frame.height);
            self.frame_texture = texture;
            self.frame_view = view;
            self.frame_size = (frame.width, frame.height);
            self.bind_group = create_bind_group(
                device,
                &self.bind_group_layout,
                &self.frame_view,
                &self.frame_sampler,
                &self.uniform_buffer,
            );
            log::info!("clip frame texture resized to {}x{}", frame.width, frame.height);
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.frame_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.width * 4),
                rows_per_image: Some(frame.height),
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );
        check_gpu(device, "clip-frame upload");
    }

    /// Composite the quad over `target` with the given MVP.
    ///
    /// Loads the existing target contents rather than clearing — the quad is
    /// drawn over the host's scene. GPU validation errors are logged with the
    /// call site and do not halt subsequent frames.
    pub fn draw(
        &self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        target: &TextureView,
        mvp: Mat4,
    ) {
        let uniforms = QuadUniforms {
            model_view_projection: mvp.to_cols_array_2d(),
        };

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        check_gpu(device, "clip-quad uniform upload");

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clip-quad"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.draw(0..4, 0..1);
        }
        check_gpu(device, "clip-quad draw");
    }
}

fn create_frame_texture(device: &Device, width: u32, height: u32) -> (wgpu::Texture, TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("clip-frame"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_bind_group(
    device: &Device,
    layout: &BindGroupLayout,
    frame_view: &TextureView,
    frame_sampler: &wgpu::Sampler,
    uniform_buffer: &wgpu::Buffer,
) -> BindGroup {
    device.create_bind_group(&BindGroupDescriptor {
        label: Some("clip-quad-bg"),
        layout,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: BindingResource::TextureView(frame_view),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::Sampler(frame_sampler),
            },
            BindGroupEntry {
                binding: 2,
                resource: uniform_buffer.as_entire_binding(),
            },
        ],
    })
}

/// Resolve the innermost validation error scope, logging instead of failing.
fn check_gpu(device: &Device, site: &str) {
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        log::error!("GPU error at {site}: {error}");
    }
}
