use std::time::Duration;

use wgpu::{
    Buffer, BufferDescriptor, BufferUsages, CommandEncoder, Device, QuerySet, QuerySetDescriptor,
    QueryType, Queue,
};

use crate::error::Result;
use crate::wgpu_utilities::read_mapped;

const TIMESTAMP_BYTES: u64 = 2 * std::mem::size_of::<u64>() as u64;

/// Raw timestamps, in ticks of the queue's timestamp period
pub struct Timing {
    pub start: u64,
    pub end: u64,
}

impl Timing {
    pub fn duration(&self, period_nanoseconds: f32) -> Duration {
        let ticks = self.end.saturating_sub(self.start);
        Duration::from_nanos((ticks as f64 * period_nanoseconds as f64) as u64)
    }
}

/// Brackets recorded commands with a pair of timestamps
///
/// Only available on devices created with `Features::TIMESTAMP_QUERY`.
pub struct GpuTimer {
    query_set: QuerySet,
    query_buffer: Buffer,
    staging_buffer: Buffer,
    period: f32,
}

impl GpuTimer {
    pub fn new(device: &Device, queue: &Queue) -> Option<Self> {
        if !device.features().contains(wgpu::Features::TIMESTAMP_QUERY) {
            return None;
        }

        let query_set = device.create_query_set(&QuerySetDescriptor {
            label: Some("GpuTimer::query_set"),
            ty: QueryType::Timestamp,
            count: 2,
        });

        let query_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("GpuTimer::query_buffer"),
            size: TIMESTAMP_BYTES,
            usage: BufferUsages::QUERY_RESOLVE | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("GpuTimer::staging_buffer"),
            size: TIMESTAMP_BYTES,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Some(GpuTimer {
            query_set,
            query_buffer,
            staging_buffer,
            period: queue.get_timestamp_period(),
        })
    }

    pub fn start(&self, command_encoder: &mut CommandEncoder) {
        command_encoder.write_timestamp(&self.query_set, 0);
    }

    /// Writes the end timestamp and schedules both for readback
    pub fn end(&self, command_encoder: &mut CommandEncoder) {
        command_encoder.write_timestamp(&self.query_set, 1);
        command_encoder.resolve_query_set(&self.query_set, 0..2, &self.query_buffer, 0);
        command_encoder.copy_buffer_to_buffer(
            &self.query_buffer,
            0,
            &self.staging_buffer,
            0,
            TIMESTAMP_BYTES,
        );
    }

    /// Reads the timestamps of the last submitted `start`/`end` pair
    pub fn read(&self, device: &Device) -> Result<Duration> {
        let timestamps = read_mapped::<u64>(device, &self.staging_buffer, 2)?;
        let timing = Timing {
            start: timestamps[0],
            end: timestamps[1],
        };
        Ok(timing.duration(self.period))
    }
}
