use std::sync::Arc;

use futures::executor::block_on;
use log::info;
use wgpu::{
    Adapter, Device, DeviceDescriptor, Features, Instance, Limits, PowerPreference, Queue,
    RequestAdapterOptions, Surface,
};

use crate::error::{BlobError, Result};

/// Adapter, device and queue shared by the mesher and the renderer
pub struct GpuContext {
    pub adapter: Adapter,
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
}

impl GpuContext {
    /// Requests a device able to present to `surface` when one is given
    ///
    /// Timestamp queries are enabled whenever the adapter offers them. Storage and buffer size
    /// limits are raised to what the adapter supports so large grids fit.
    pub async fn new(instance: &Instance, surface: Option<&Surface>) -> Result<Self> {
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: surface,
            })
            .await
            .ok_or(BlobError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        info!(
            "using {} ({:?}, {:?})",
            adapter_info.name, adapter_info.device_type, adapter_info.backend
        );

        let adapter_limits = adapter.limits();
        let limits = Limits {
            max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
            max_buffer_size: adapter_limits.max_buffer_size,
            ..Limits::downlevel_defaults().using_resolution(adapter_limits)
        };
        let features = adapter.features() & Features::TIMESTAMP_QUERY;

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("blobmesh"),
                    features,
                    limits,
                },
                None,
            )
            .await?;

        Ok(GpuContext {
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// A context without a presentation surface, for tests and offline meshing
    pub fn headless() -> Result<Self> {
        block_on(Self::new(&Instance::default(), None))
    }

    pub fn supports_timestamps(&self) -> bool {
        self.device.features().contains(Features::TIMESTAMP_QUERY)
    }
}
