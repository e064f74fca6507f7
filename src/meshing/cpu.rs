use glam::UVec3;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::field::{evaluate, gradient};
use super::grid::Grid;
use super::orchestrator::{FieldParams, FrameStats, Mesh, MeshFrame, Mesher};
use super::primitives::PrimitiveBuffer;
use super::tables::CORNER_OFFSETS;
use super::triangulate::{triangulate_cell, CornerSample};
use super::writer::MeshBuffers;
use crate::common::GRADIENT_STEP;
use crate::data::Primitive;
use crate::error::Result;

/// Host backend, one rayon task per cell writing through shared `MeshBuffers`
pub struct CpuMesher {
    grid: Grid,
    primitives: PrimitiveBuffer,
    buffers: MeshBuffers,
    pool: Option<ThreadPool>,
}

impl CpuMesher {
    /// Sized so that no cell can ever overflow
    pub fn new(grid: Grid) -> Self {
        Self::with_capacity(grid, grid.vertex_capacity())
    }

    /// `capacity` is rounded down to whole triangles, keeping at least one
    pub fn with_capacity(grid: Grid, capacity: u32) -> Self {
        CpuMesher {
            grid,
            primitives: PrimitiveBuffer::new(),
            buffers: MeshBuffers::new(capacity),
            pool: None,
        }
    }

    /// Runs passes on a dedicated pool instead of the global one
    ///
    /// With a single thread the cells are visited in index order and repeated passes produce
    /// identical buffers slot for slot.
    pub fn with_threads(mut self, threads: usize) -> Result<Self> {
        self.pool = Some(ThreadPoolBuilder::new().num_threads(threads).build()?);
        Ok(self)
    }

    /// Copies the published part of the last pass
    pub fn mesh(&mut self) -> Mesh {
        let (vertices, indices) = self.buffers.read();
        Mesh { vertices, indices }
    }
}

fn mesh_cell(
    grid: &Grid,
    primitives: &[Primitive],
    params: FieldParams,
    buffers: &MeshBuffers,
    index: u32,
) {
    let cell = grid.cell_coordinates(index);
    let corners: [CornerSample; 8] = std::array::from_fn(|corner| {
        let position = grid.corner_position(cell + UVec3::from_array(CORNER_OFFSETS[corner]));
        CornerSample {
            position,
            sample: evaluate(position, primitives, params.smooth_k),
        }
    });

    let step = GRADIENT_STEP * grid.cell_size.min_element();
    let triangles = triangulate_cell(&corners, params.iso_level, |point| {
        gradient(point, primitives, params.smooth_k, step)
    });
    if !triangles.is_empty() {
        buffers.reserve(triangles.len()).write(triangles.as_slice());
    }
}

impl Mesher for CpuMesher {
    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn capacity(&self) -> u32 {
        self.buffers.capacity()
    }

    fn generate(&mut self, primitives: &[Primitive], params: FieldParams) -> Result<MeshFrame> {
        self.buffers.reset();
        self.primitives.upload(primitives);

        let grid = &self.grid;
        let buffers = &self.buffers;
        let primitives = self.primitives.active();
        let pass = || {
            (0..grid.cell_count())
                .into_par_iter()
                .for_each(|index| mesh_cell(grid, primitives, params, buffers, index));
        };
        match &self.pool {
            Some(pool) => pool.install(pass),
            None => pass(),
        }

        Ok(MeshFrame {
            index_count: buffers.published(),
            bounds: grid.bounds(),
            stats: FrameStats {
                requested_vertices: buffers.requested(),
                ..Default::default()
            },
            ..Default::default()
        })
    }
}
