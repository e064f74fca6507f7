pub mod camera;
pub mod clock;
pub mod common;
pub mod config;
pub mod data;
pub mod error;
pub mod gpu_context;
pub mod meshing;
pub mod profiling;
pub mod simulation;
pub mod visualisation;
pub mod wgpu_utilities;

pub use error::{BlobError, Result};
