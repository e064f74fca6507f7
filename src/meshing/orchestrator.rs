use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use super::grid::{Aabb, Grid};
use crate::data::{MeshVertex, Primitive};
use crate::error::Result;

/// Per-frame field scalars
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FieldParams {
    pub iso_level: f32,
    /// blend radius of the smooth minimum, `0` is a hard union
    pub smooth_k: f32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// vertex slots the cells asked for, more than the capacity when triangles were dropped
    pub requested_vertices: u32,
    /// wall time of `generate` including the wait for the dispatch
    pub elapsed: Duration,
    /// time between the timestamps around the compute pass, when the device supports them
    pub gpu_time: Option<Duration>,
}

/// What the renderer consumes after each tick
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MeshFrame {
    /// valid prefix of the output buffers, whole triangles only
    pub index_count: u32,
    pub bounds: Aabb,
    /// numbered by `FrameOrchestrator`, starting at 1
    pub frame: u64,
    pub stats: FrameStats,
}

impl MeshFrame {
    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    pub fn dropped_triangles(&self) -> u32 {
        self.stats.requested_vertices.saturating_sub(self.index_count) / 3
    }
}

/// Host copy of a published triangle list
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [MeshVertex; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|triangle| std::array::from_fn(|corner| self.vertices[triangle[corner] as usize]))
    }
}

/// A backend that meshes a primitive list over a fixed grid into its output buffers
pub trait Mesher {
    fn grid(&self) -> &Grid;

    /// vertex and index slots available per frame
    fn capacity(&self) -> u32;

    /// Runs one full pass and returns only once every cell has been written
    fn generate(&mut self, primitives: &[Primitive], params: FieldParams) -> Result<MeshFrame>;
}

/// Drives a mesher once per tick and keeps the last published frame
pub struct FrameOrchestrator<M: Mesher> {
    mesher: M,
    frame: u64,
    published: Option<MeshFrame>,
}

impl<M: Mesher> FrameOrchestrator<M> {
    pub fn new(mesher: M) -> Self {
        FrameOrchestrator {
            mesher,
            frame: 0,
            published: None,
        }
    }

    pub fn tick(&mut self, primitives: &[Primitive], params: FieldParams) -> Result<MeshFrame> {
        self.frame += 1;
        trace!(
            "frame {}: meshing {} primitives, iso {} smooth k {}",
            self.frame,
            primitives.len(),
            params.iso_level,
            params.smooth_k
        );

        let start = Instant::now();
        let mut frame = self.mesher.generate(primitives, params)?;
        frame.frame = self.frame;
        frame.stats.elapsed = start.elapsed();

        if frame.dropped_triangles() > 0 {
            warn!(
                "frame {}: output capacity of {} vertices exceeded, {} triangles dropped",
                frame.frame,
                self.mesher.capacity(),
                frame.dropped_triangles()
            );
        }
        debug!(
            "frame {}: {} triangles in {:?} (gpu {:?})",
            frame.frame,
            frame.triangle_count(),
            frame.stats.elapsed,
            frame.stats.gpu_time
        );

        self.published = Some(frame);
        Ok(frame)
    }

    pub fn published(&self) -> Option<&MeshFrame> {
        self.published.as_ref()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn mesher(&self) -> &M {
        &self.mesher
    }

    pub fn mesher_mut(&mut self) -> &mut M {
        &mut self.mesher
    }
}
