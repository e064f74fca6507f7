use std::{borrow::Cow, mem::size_of, sync::Arc};

use encase::ShaderSize;
use log::info;
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayoutDescriptor, Buffer,
    BufferBindingType, BufferDescriptor, BufferUsages, CommandEncoderDescriptor,
    ComputePassDescriptor, ComputePipeline, ComputePipelineDescriptor, Device,
    PipelineLayoutDescriptor, Queue, ShaderModuleDescriptor, ShaderSource,
};

use super::grid::Grid;
use super::orchestrator::{FieldParams, FrameStats, Mesh, MeshFrame, Mesher};
use super::primitives::PrimitiveBuffer;
use super::tables::flattened_tri_table;
use super::writer::whole_triangles;
use crate::common::{MAX_PRIMITIVES, WORKGROUP_SIZE};
use crate::data::{MeshParams, MeshVertex, Primitive};
use crate::error::{BlobError, Result};
use crate::gpu_context::GpuContext;
use crate::profiling::GpuTimer;
use crate::wgpu_utilities::{compute_buffer_entry, read_buffer, read_mapped, QueueUtilities};

#[include_wgsl_oil::include_wgsl_oil("marching_cubes.wgsl")]
pub mod shader {}

/// Compute backend writing straight into vertex and index buffers the renderer draws from
pub struct GpuMesher {
    device: Arc<Device>,
    queue: Arc<Queue>,
    grid: Grid,
    capacity: u32,
    published: u32,

    primitives: PrimitiveBuffer,
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    counter_buffer: Buffer,
    counter_staging_buffer: Buffer,
    params_buffer: Buffer,
    primitive_buffer: Buffer,

    bind_group: BindGroup,
    compute_pipeline: ComputePipeline,
    timer: Option<GpuTimer>,
}

fn check_binding_size(device: &Device, buffer: &'static str, required: u64) -> Result<()> {
    let limits = device.limits();
    let limit = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
    if required > limit {
        return Err(BlobError::CapacityExceedsDevice {
            buffer,
            required,
            limit,
        });
    }
    Ok(())
}

impl GpuMesher {
    /// Sized so that no cell can ever overflow
    pub fn new(context: &GpuContext, grid: Grid) -> Result<Self> {
        Self::with_capacity(context, grid, grid.vertex_capacity())
    }

    /// `capacity` is rounded down to whole triangles, keeping at least one
    pub fn with_capacity(context: &GpuContext, grid: Grid, capacity: u32) -> Result<Self> {
        let device = &context.device;
        let capacity = whole_triangles(capacity);
        let vertex_bytes = capacity as u64 * size_of::<MeshVertex>() as u64;
        let index_bytes = capacity as u64 * size_of::<u32>() as u64;
        check_binding_size(device, "vertex", vertex_bytes)?;
        check_binding_size(device, "index", index_bytes)?;

        let shader_module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("marching_cubes.wgsl"),
            source: ShaderSource::Wgsl(Cow::Borrowed(shader::SOURCE)),
        });

        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("GpuMesher::bind_group_layout"),
            entries: &[
                compute_buffer_entry(
                    shader::globals::vertices::binding::BINDING,
                    BufferBindingType::Storage { read_only: false },
                ),
                compute_buffer_entry(
                    shader::globals::indices::binding::BINDING,
                    BufferBindingType::Storage { read_only: false },
                ),
                compute_buffer_entry(
                    shader::globals::counter::binding::BINDING,
                    BufferBindingType::Storage { read_only: false },
                ),
                compute_buffer_entry(
                    shader::globals::params::binding::BINDING,
                    BufferBindingType::Uniform,
                ),
                compute_buffer_entry(
                    shader::globals::primitives::binding::BINDING,
                    BufferBindingType::Uniform,
                ),
                compute_buffer_entry(
                    shader::globals::tri_table::binding::BINDING,
                    BufferBindingType::Storage { read_only: true },
                ),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let compute_pipeline = device.create_compute_pipeline(&ComputePipelineDescriptor {
            label: Some("GpuMesher::compute_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: shader::entry_points::main::NAME,
        });

        let vertex_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("GpuMesher::vertex_buffer"),
            size: vertex_bytes,
            usage: BufferUsages::STORAGE | BufferUsages::VERTEX | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("GpuMesher::index_buffer"),
            size: index_bytes,
            usage: BufferUsages::STORAGE | BufferUsages::INDEX | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let counter_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("GpuMesher::counter_buffer"),
            size: size_of::<u32>() as u64,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let counter_staging_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("GpuMesher::counter_staging_buffer"),
            size: size_of::<u32>() as u64,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("GpuMesher::params_buffer"),
            size: MeshParams::SHADER_SIZE.get(),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let primitive_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("GpuMesher::primitive_buffer"),
            size: (size_of::<Primitive>() * MAX_PRIMITIVES) as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let tri_table_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("GpuMesher::tri_table_buffer"),
            contents: bytemuck::cast_slice(&flattened_tri_table()),
            usage: BufferUsages::STORAGE,
        });

        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("GpuMesher::bind_group"),
            layout: &bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: shader::globals::vertices::binding::BINDING,
                    resource: vertex_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: shader::globals::indices::binding::BINDING,
                    resource: index_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: shader::globals::counter::binding::BINDING,
                    resource: counter_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: shader::globals::params::binding::BINDING,
                    resource: params_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: shader::globals::primitives::binding::BINDING,
                    resource: primitive_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: shader::globals::tri_table::binding::BINDING,
                    resource: tri_table_buffer.as_entire_binding(),
                },
            ],
        });

        let timer = GpuTimer::new(device, &context.queue);
        info!(
            "gpu mesher: {} cells, {capacity} vertex slots ({} MiB), gpu timing {}",
            grid.cells,
            (vertex_bytes + index_bytes) >> 20,
            if timer.is_some() { "on" } else { "off" }
        );

        Ok(GpuMesher {
            device: context.device.clone(),
            queue: context.queue.clone(),
            grid,
            capacity,
            published: 0,
            primitives: PrimitiveBuffer::new(),
            vertex_buffer,
            index_buffer,
            counter_buffer,
            counter_staging_buffer,
            params_buffer,
            primitive_buffer,
            bind_group,
            compute_pipeline,
            timer,
        })
    }

    pub fn vertex_buffer(&self) -> &Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &Buffer {
        &self.index_buffer
    }

    /// Copies the published part of the last pass back to the host
    pub fn read_mesh(&self) -> Result<Mesh> {
        let length = self.published as usize;
        Ok(Mesh {
            vertices: read_buffer(&self.device, &self.queue, &self.vertex_buffer, length)?,
            indices: read_buffer(&self.device, &self.queue, &self.index_buffer, length)?,
        })
    }
}

impl Mesher for GpuMesher {
    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn generate(&mut self, primitives: &[Primitive], params: FieldParams) -> Result<MeshFrame> {
        self.primitives.upload(primitives);
        let mesh_params = MeshParams {
            cells: self.grid.cells,
            origin: self.grid.origin,
            cell_size: self.grid.cell_size,
            iso_level: params.iso_level,
            primitive_count: self.primitives.count() as u32,
            smooth_k: params.smooth_k,
        };
        self.queue
            .write_buffer(&self.counter_buffer, 0, bytemuck::bytes_of(&0u32));
        self.queue
            .write_encased_uniform_buffer(&self.params_buffer, &mesh_params)?;
        self.queue
            .write_buffer(&self.primitive_buffer, 0, self.primitives.as_bytes());

        let [x, y, z] = self.grid.workgroup_count(WORKGROUP_SIZE);
        let mut command_encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor { label: None });
        if let Some(timer) = &self.timer {
            timer.start(&mut command_encoder);
        }
        {
            let mut compute_pass = command_encoder.begin_compute_pass(&ComputePassDescriptor {
                label: Some("marching cubes"),
            });
            compute_pass.set_pipeline(&self.compute_pipeline);
            compute_pass.set_bind_group(0, &self.bind_group, &[]);
            compute_pass.dispatch_workgroups(x, y, z);
        }
        if let Some(timer) = &self.timer {
            timer.end(&mut command_encoder);
        }
        command_encoder.copy_buffer_to_buffer(
            &self.counter_buffer,
            0,
            &self.counter_staging_buffer,
            0,
            size_of::<u32>() as u64,
        );
        self.queue.submit(Some(command_encoder.finish()));

        // waits for the whole dispatch, an earlier read would undercount
        let requested = read_mapped::<u32>(&self.device, &self.counter_staging_buffer, 1)?[0];
        let gpu_time = match &self.timer {
            Some(timer) => Some(timer.read(&self.device)?),
            None => None,
        };
        self.published = requested.min(self.capacity);

        Ok(MeshFrame {
            index_count: self.published,
            bounds: self.grid.bounds(),
            stats: FrameStats {
                requested_vertices: requested,
                gpu_time,
                ..Default::default()
            },
            ..Default::default()
        })
    }
}
