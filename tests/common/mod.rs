//! Shared helpers for the meshing integration tests

#![allow(dead_code)]

use std::collections::HashMap;

use blobmesh::{
    data::{MeshVertex, Primitive},
    gpu_context::GpuContext,
    meshing::{CpuMesher, FieldParams, Grid, Mesh, MeshFrame, Mesher},
};
use glam::Vec3;

// ============================================================================
// Scenes
// ============================================================================

/// Half-extent of every test volume
pub const VOLUME_RADIUS: f32 = 0.175;

pub fn sphere(center: Vec3, radius: f32, color: Vec3) -> Primitive {
    Primitive::new(center, radius, color)
}

/// A white sphere of radius 0.1 at the origin
pub fn single_sphere() -> Vec<Primitive> {
    vec![sphere(Vec3::ZERO, 0.1, Vec3::ONE)]
}

/// Two spheres of radius 0.04 whose surfaces are 0.01 apart along x
pub fn sphere_pair() -> Vec<Primitive> {
    vec![
        sphere(Vec3::new(-0.045, 0., 0.), 0.04, Vec3::ONE),
        sphere(Vec3::new(0.045, 0., 0.), 0.04, Vec3::ZERO),
    ]
}

pub fn hard_union() -> FieldParams {
    FieldParams {
        iso_level: 0.,
        smooth_k: 0.,
    }
}

pub fn blended(smooth_k: f32) -> FieldParams {
    FieldParams {
        iso_level: 0.,
        smooth_k,
    }
}

pub fn grid(cells_per_axis: u32) -> Grid {
    Grid::centered(cells_per_axis, VOLUME_RADIUS).unwrap()
}

// ============================================================================
// Meshing
// ============================================================================

pub fn cpu_mesh(grid: Grid, primitives: &[Primitive], params: FieldParams) -> (MeshFrame, Mesh) {
    let mut mesher = CpuMesher::new(grid);
    let frame = mesher.generate(primitives, params).unwrap();
    (frame, mesher.mesh())
}

/// A headless device, or `None` with a note when the machine has no usable adapter
pub fn gpu_context() -> Option<GpuContext> {
    match GpuContext::headless() {
        Ok(context) => Some(context),
        Err(error) => {
            eprintln!("skipping GPU test: {error}");
            None
        }
    }
}

// ============================================================================
// Topology
// ============================================================================

fn position_key(vertex: &MeshVertex) -> [u32; 3] {
    vertex.position.map(f32::to_bits)
}

/// Triangles over shared vertex ids, merging slots with bit-identical positions
///
/// Triangles that collapse to a line or a point once welded are left out.
pub fn weld(mesh: &Mesh) -> (usize, Vec<[usize; 3]>) {
    let mut ids: HashMap<[u32; 3], usize> = HashMap::new();
    let mut triangles = Vec::with_capacity(mesh.triangle_count());
    for triangle in mesh.triangles() {
        let welded = triangle.map(|vertex| {
            let next = ids.len();
            *ids.entry(position_key(&vertex)).or_insert(next)
        });
        if welded[0] != welded[1] && welded[1] != welded[2] && welded[0] != welded[2] {
            triangles.push(welded);
        }
    }
    (ids.len(), triangles)
}

/// Every edge of a closed surface is shared by exactly two triangles
pub fn is_closed(mesh: &Mesh) -> bool {
    let (_, triangles) = weld(mesh);
    let mut uses: HashMap<(usize, usize), u32> = HashMap::new();
    for [a, b, c] in triangles {
        for (u, v) in [(a, b), (b, c), (c, a)] {
            *uses.entry((u.min(v), u.max(v))).or_default() += 1;
        }
    }
    !uses.is_empty() && uses.values().all(|&count| count == 2)
}

/// Number of connected pieces of the welded surface
pub fn components(mesh: &Mesh) -> usize {
    let (vertex_count, triangles) = weld(mesh);
    let mut parents: Vec<usize> = (0..vertex_count).collect();

    fn root(parents: &mut [usize], mut id: usize) -> usize {
        while parents[id] != id {
            parents[id] = parents[parents[id]];
            id = parents[id];
        }
        id
    }

    for [a, b, c] in triangles {
        for (u, v) in [(a, b), (b, c)] {
            let (u, v) = (root(&mut parents, u), root(&mut parents, v));
            parents[u] = v;
        }
    }
    let mut roots: Vec<usize> = (0..vertex_count).map(|id| root(&mut parents, id)).collect();
    roots.sort_unstable();
    roots.dedup();
    roots.len()
}

/// Order-independent fingerprint of a triangle list, for comparing passes whose slot order differs
pub fn triangle_set(mesh: &Mesh) -> Vec<[[u32; 3]; 3]> {
    let mut triangles: Vec<[[u32; 3]; 3]> = mesh
        .triangles()
        .map(|triangle| triangle.map(|vertex| position_key(&vertex)))
        .collect();
    triangles.sort_unstable();
    triangles
}

pub fn face_normal(triangle: &[MeshVertex; 3]) -> Vec3 {
    let [a, b, c] = triangle.map(|vertex| vertex.position());
    (b - a).cross(c - a)
}
