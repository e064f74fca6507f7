use bytemuck::Pod;
use encase::{internal::WriteInto, ShaderType, UniformBuffer};
use futures::{channel::oneshot, executor::block_on};
use wgpu::{
    BindGroupLayoutEntry, BindingType, Buffer, BufferAddress, BufferBindingType,
    BufferDescriptor, BufferUsages, CommandEncoderDescriptor, Device, Maintain, MapMode, Queue,
    ShaderStages,
};

use crate::error::{BlobError, Result};

pub trait QueueUtilities<T: ShaderType + WriteInto> {
    fn write_encased_uniform_buffer(&self, buffer: &Buffer, data: &T) -> Result<()>;
}

impl<T: ShaderType + WriteInto> QueueUtilities<T> for Queue {
    fn write_encased_uniform_buffer(&self, buffer: &Buffer, data: &T) -> Result<()> {
        let mut encased_uniform_buffer = UniformBuffer::new(Vec::<u8>::new());
        encased_uniform_buffer.write(data)?;
        self.write_buffer(buffer, 0, &encased_uniform_buffer.into_inner());
        Ok(())
    }
}

/// Compute visible buffer binding, the shape every meshing binding shares
pub fn compute_buffer_entry(binding: u32, ty: BufferBindingType) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::COMPUTE,
        ty: BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Maps a `MAP_READ` buffer, blocks until the device is idle and copies out `length` elements
pub fn read_mapped<T: Pod>(
    device: &Device,
    staging_buffer: &Buffer,
    length: usize,
) -> Result<Vec<T>> {
    let buffer_slice = staging_buffer.slice(..);
    let (sender, receiver) = oneshot::channel();
    buffer_slice.map_async(MapMode::Read, move |result| {
        // the receiver only goes away if this function has already returned
        let _ = sender.send(result);
    });
    device.poll(Maintain::Wait);
    block_on(receiver).map_err(|_| BlobError::MapCancelled)??;

    let result = {
        let data = buffer_slice.get_mapped_range();
        bytemuck::cast_slice::<u8, T>(&data)[..length].to_vec()
    };
    staging_buffer.unmap();
    Ok(result)
}

/// Copies the first `length` elements of a `COPY_SRC` buffer back to the host
pub fn read_buffer<T: Pod>(
    device: &Device,
    queue: &Queue,
    buffer: &Buffer,
    length: usize,
) -> Result<Vec<T>> {
    if length == 0 {
        return Ok(Vec::new());
    }
    let size = (std::mem::size_of::<T>() * length) as BufferAddress;
    let staging_buffer = device.create_buffer(&BufferDescriptor {
        size,
        label: Some("read_buffer::staging_buffer"),
        usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor { label: None });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging_buffer, 0, size);
    queue.submit(Some(encoder.finish()));

    let result = read_mapped(device, &staging_buffer, length);
    staging_buffer.destroy();
    result
}
