//! Iso-surface extraction of smooth blended spheres.
//!
//! Every frame the primitives are re-uploaded, each grid cell samples its eight corners,
//! triangulates them with the marching cubes tables and appends its triangles to shared
//! output buffers through a single atomic counter. `CpuMesher` and `GpuMesher` run the same
//! per-cell task, on rayon and as a wgpu compute pass.

pub mod cpu;
pub mod field;
pub mod gpu;
pub mod grid;
pub mod orchestrator;
pub mod primitives;
pub mod tables;
pub mod triangulate;
pub mod writer;

pub use cpu::CpuMesher;
pub use gpu::GpuMesher;
pub use grid::{Aabb, Grid};
pub use orchestrator::{FieldParams, FrameOrchestrator, FrameStats, Mesh, MeshFrame, Mesher};
pub use primitives::PrimitiveBuffer;
