use thiserror::Error;

/// Failures of the meshing core and its collaborators
///
/// Only initialisation and explicit readback can fail. Running out of output capacity
/// during a frame is not an error, the extra triangles are dropped.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("no suitable GPU adapter was found")]
    NoAdapter,
    #[error("failed to request a GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("failed to create a window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to create a presentation surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to map a GPU buffer for reading: {0}")]
    BufferAsync(#[from] wgpu::BufferAsyncError),
    #[error("failed to encode shader uniforms: {0}")]
    Encode(#[from] encase::internal::Error),
    #[error("buffer mapping was cancelled before completion")]
    MapCancelled,
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("{buffer} buffer needs {required} bytes but the device allows at most {limit}")]
    CapacityExceedsDevice {
        buffer: &'static str,
        required: u64,
        limit: u64,
    },
    #[error("failed to build the meshing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BlobError>;
