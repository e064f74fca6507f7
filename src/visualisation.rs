use std::{borrow::Cow::Borrowed, mem::size_of};

use glam::Vec3;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingType, Buffer, BufferBindingType, BufferDescriptor, BufferUsages,
    Color, CommandEncoderDescriptor, CompareFunction, DepthStencilState, Device, Extent3d,
    FragmentState, IndexFormat, LoadOp, MultisampleState, Operations, PipelineLayoutDescriptor,
    PrimitiveState, Queue, RenderPassColorAttachment, RenderPassDepthStencilAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, ShaderModuleDescriptor,
    ShaderSource, ShaderStages, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureView, TextureViewDescriptor, VertexAttribute, VertexBufferLayout,
    VertexFormat, VertexState, VertexStepMode,
};

use crate::camera::Camera;
use crate::data::MeshVertex;
use crate::meshing::{GpuMesher, MeshFrame};

#[include_wgsl_oil::include_wgsl_oil("visualisation.wgsl")]
mod shader {}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

// `vertex_attr_array!` packs attributes tightly, `MeshVertex` pads each to 16 bytes
const VERTEX_ATTRIBUTES: [VertexAttribute; 3] = [
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: MeshVertex::POSITION_OFFSET,
        shader_location: 0,
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: MeshVertex::NORMAL_OFFSET,
        shader_location: 1,
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: MeshVertex::COLOR_OFFSET,
        shader_location: 2,
    },
];

#[repr(C, align(16))]
#[derive(Default, Copy, Clone)]
struct Uniforms {
    view_projection: [f32; 4 * 4],
    camera_position: [f32; 3],
    _padding_0: f32,
    light_direction: [f32; 3],
    _padding_1: f32,
}

unsafe impl bytemuck::Pod for Uniforms {}
unsafe impl bytemuck::Zeroable for Uniforms {}

/// Draws the mesher's output buffers in place with one directional light
pub struct Visualisation {
    uniform_buffer: Buffer,
    bind_group: BindGroup,
    render_pipeline: RenderPipeline,
    depth_view: TextureView,
}

impl Visualisation {
    pub fn new(device: &Device, format: TextureFormat, width: u32, height: u32) -> Self {
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("visualisation.wgsl"),
            source: ShaderSource::Wgsl(Borrowed(shader::SOURCE)),
        });

        let uniform_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("Visualisation::uniform_buffer"),
            size: size_of::<Uniforms>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: None,
            entries: &[BindGroupLayoutEntry {
                binding: shader::globals::uniforms::binding::BINDING,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: None,
            layout: &bind_group_layout,
            entries: &[BindGroupEntry {
                binding: shader::globals::uniforms::binding::BINDING,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Visualisation::render_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: shader::entry_points::vertex::NAME,
                buffers: &[VertexBufferLayout {
                    array_stride: size_of::<MeshVertex>() as u64,
                    step_mode: VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: shader::entry_points::fragment::NAME,
                targets: &[Some(format.into())],
            }),
            primitive: PrimitiveState::default(),
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: MultisampleState::default(),
            multiview: None,
        });

        Visualisation {
            uniform_buffer,
            bind_group,
            render_pipeline,
            depth_view: Self::create_depth_view(device, width, height),
        }
    }

    fn create_depth_view(device: &Device, width: u32, height: u32) -> TextureView {
        let texture = device.create_texture(&TextureDescriptor {
            label: Some("Visualisation::depth_texture"),
            size: Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        self.depth_view = Self::create_depth_view(device, width, height);
    }

    pub fn visualise(
        &self,
        device: &Device,
        queue: &Queue,
        view: &TextureView,
        camera: &Camera,
        mesher: &GpuMesher,
        frame: Option<&MeshFrame>,
    ) {
        let uniforms = Uniforms {
            view_projection: (camera.projection() * camera.view()).to_cols_array(),
            camera_position: camera.position().to_array(),
            light_direction: Vec3::new(-0.4, -1., 0.6).normalize().to_array(),
            ..Default::default()
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut command_encoder =
            device.create_command_encoder(&CommandEncoderDescriptor { label: None });
        {
            let mut render_pass = command_encoder.begin_render_pass(&RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color {
                            r: 0.5,
                            g: 0.55,
                            b: 0.6,
                            a: 1.,
                        }),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.),
                        store: false,
                    }),
                    stencil_ops: None,
                }),
            });
            if let Some(frame) = frame.filter(|frame| frame.index_count > 0) {
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, &self.bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesher.vertex_buffer().slice(..));
                render_pass.set_index_buffer(mesher.index_buffer().slice(..), IndexFormat::Uint32);
                render_pass.draw_indexed(0..frame.index_count, 0, 0..1);
            }
        }
        queue.submit(Some(command_encoder.finish()));
    }
}
