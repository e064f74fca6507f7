use crate::meshing::gpu::shader::{constants, entry_points};

/// maximum number of sphere primitives uploaded per frame
pub const MAX_PRIMITIVES: usize = constants::MAX_PRIMITIVES::VALUE as usize;
/// upper bound of the classic marching cubes triangle table
pub const MAX_TRIANGLES_PER_CELL: usize = constants::MAX_TRIANGLES_PER_CELL::VALUE as usize;
pub const MAX_VERTICES_PER_CELL: usize = MAX_TRIANGLES_PER_CELL * 3;

pub const WORKGROUP_SIZE: [u32; 3] = entry_points::main::WORKGROUP_SIZE;

/// field value of a point that no primitive influences
///
/// finite so the expanded smooth minimum cancels it exactly (`sentinel * 0.0 == 0.0`)
pub const FIELD_SENTINEL: f32 = constants::FIELD_SENTINEL::VALUE as f32;

/// finite difference step for normals, as a fraction of the cell size
pub const GRADIENT_STEP: f32 = constants::GRADIENT_STEP::VALUE as f32;

/// below this the two corner values of an edge are treated as equal
pub const DEGENERATE_EDGE_EPSILON: f32 = constants::DEGENERATE_EDGE_EPSILON::VALUE as f32;
