//! End-to-end meshing on the rayon backend
//!
//! Geometry, topology and overflow behaviour of complete passes over small scenes.

mod common;
use common::*;

use approx::assert_relative_eq;
use blobmesh::{
    common::MAX_PRIMITIVES,
    config::BlobConfig,
    data::MeshVertex,
    meshing::{Aabb, CpuMesher, FrameOrchestrator, Mesher},
    simulation::BlobSimulation,
};
use glam::Vec3;

// ============================================================================
// Single sphere
// ============================================================================

#[test]
fn sphere_mesh_is_closed_and_on_the_surface() {
    let grid = grid(16);
    let (frame, mesh) = cpu_mesh(grid, &single_sphere(), hard_union());

    assert!(frame.triangle_count() > 0);
    assert_eq!(frame.dropped_triangles(), 0);
    assert_eq!(mesh.indices.len(), frame.index_count as usize);
    assert!(is_closed(&mesh), "sphere surface has open edges");
    assert_eq!(components(&mesh), 1);

    let tolerance = grid.cell_size.x * 0.5;
    for vertex in &mesh.vertices {
        let distance = vertex.position().length();
        assert!(
            (distance - 0.1).abs() < tolerance,
            "vertex {:?} is {distance} from the center",
            vertex.position()
        );
    }
}

#[test]
fn sphere_normals_and_faces_point_outward() {
    let (_, mesh) = cpu_mesh(grid(16), &single_sphere(), hard_union());

    for vertex in &mesh.vertices {
        let radial = vertex.position().normalize();
        assert!(vertex.normal().dot(radial) > 0.99, "normal {:?}", vertex.normal());
        assert_relative_eq!(vertex.normal().length(), 1., epsilon = 1e-5);
        assert!(vertex.color().abs_diff_eq(Vec3::ONE, 1e-5));
    }
    for triangle in mesh.triangles() {
        let centroid = triangle.iter().map(MeshVertex::position).sum::<Vec3>() / 3.;
        assert!(face_normal(&triangle).dot(centroid) > -1e-9);
    }
}

#[test]
fn indices_name_their_own_slots() {
    let (_, mesh) = cpu_mesh(grid(12), &single_sphere(), hard_union());
    assert_eq!(mesh.vertices.len(), mesh.indices.len());
    assert!(mesh
        .indices
        .iter()
        .enumerate()
        .all(|(slot, &index)| index as usize == slot));
}

// ============================================================================
// Blending
// ============================================================================

#[test]
fn hard_union_keeps_nearby_spheres_apart() {
    let (_, mesh) = cpu_mesh(grid(24), &sphere_pair(), hard_union());
    assert!(is_closed(&mesh));
    assert_eq!(components(&mesh), 2);

    for vertex in mesh.vertices.iter().filter(|vertex| vertex.position[0] < -0.02) {
        assert!(vertex.color().abs_diff_eq(Vec3::ONE, 1e-5));
    }
    for vertex in mesh.vertices.iter().filter(|vertex| vertex.position[0] > 0.02) {
        assert!(vertex.color().abs_diff_eq(Vec3::ZERO, 1e-5));
    }
}

#[test]
fn smooth_union_bridges_the_gap() {
    let (_, mesh) = cpu_mesh(grid(24), &sphere_pair(), blended(0.05));
    assert!(is_closed(&mesh));
    assert_eq!(components(&mesh), 1);

    // the bridge takes a mix of both colors
    assert!(mesh.vertices.iter().any(|vertex| {
        vertex.position[0].abs() < 0.01 && vertex.color().x > 0.2 && vertex.color().x < 0.8
    }));
}

#[test]
fn primitives_past_the_limit_are_ignored() {
    let grid = grid(12);
    let mut primitives = vec![sphere(Vec3::ZERO, 0.1, Vec3::ONE); MAX_PRIMITIVES];
    primitives.push(sphere(Vec3::splat(0.12), 0.05, Vec3::ZERO));

    let (_, truncated) = cpu_mesh(grid, &primitives, hard_union());
    let (_, single) = cpu_mesh(grid, &single_sphere(), hard_union());
    assert_eq!(triangle_set(&truncated), triangle_set(&single));
}

// ============================================================================
// Concurrency and capacity
// ============================================================================

#[test]
fn thread_count_does_not_change_the_triangle_set() {
    let grid = grid(20);
    let primitives = sphere_pair();
    let params = blended(0.03);

    let mut serial = CpuMesher::new(grid).with_threads(1).unwrap();
    let mut parallel = CpuMesher::new(grid).with_threads(4).unwrap();
    let serial_frame = serial.generate(&primitives, params).unwrap();
    let parallel_frame = parallel.generate(&primitives, params).unwrap();

    assert_eq!(serial_frame.index_count, parallel_frame.index_count);
    assert_eq!(triangle_set(&serial.mesh()), triangle_set(&parallel.mesh()));
}

#[test]
fn overflow_publishes_only_whole_triangles() {
    let grid = grid(16);
    let mut mesher = CpuMesher::with_capacity(grid, 31);
    assert_eq!(mesher.capacity(), 30);

    let frame = mesher.generate(&single_sphere(), hard_union()).unwrap();
    assert_eq!(frame.index_count, 30);
    assert!(frame.stats.requested_vertices > 30);
    assert!(frame.dropped_triangles() > 0);

    let mesh = mesher.mesh();
    assert!(mesh.indices.iter().all(|&index| index < 30));
    let tolerance = grid.cell_size.x * 0.5;
    for vertex in &mesh.vertices {
        assert!((vertex.position().length() - 0.1).abs() < tolerance);
    }

    // a larger buffer on the next pass recovers everything
    let (full, _) = cpu_mesh(grid, &single_sphere(), hard_union());
    assert_eq!(full.index_count, frame.stats.requested_vertices);
}

#[test]
fn tiny_capacity_keeps_one_triangle() {
    let mut mesher = CpuMesher::with_capacity(grid(8), 0);
    assert_eq!(mesher.capacity(), 3);
    let frame = mesher.generate(&single_sphere(), hard_union()).unwrap();
    assert_eq!(frame.index_count, 3);
}

#[test]
fn repeated_passes_start_from_an_empty_buffer() {
    let mut mesher = CpuMesher::new(grid(12));
    let first = mesher.generate(&single_sphere(), hard_union()).unwrap();
    let second = mesher.generate(&single_sphere(), hard_union()).unwrap();
    assert_eq!(first.index_count, second.index_count);

    let empty = mesher.generate(&[], hard_union()).unwrap();
    assert_eq!(empty.index_count, 0);
    assert!(mesher.mesh().vertices.is_empty());
}

// ============================================================================
// Frames
// ============================================================================

#[test]
fn orchestrator_numbers_and_publishes_frames() {
    let mut orchestrator = FrameOrchestrator::new(CpuMesher::new(grid(12)));
    assert!(orchestrator.published().is_none());

    let first = orchestrator.tick(&single_sphere(), hard_union()).unwrap();
    let second = orchestrator.tick(&sphere_pair(), blended(0.05)).unwrap();

    assert_eq!((first.frame, second.frame), (1, 2));
    assert_eq!(orchestrator.frame(), 2);
    assert_eq!(orchestrator.published(), Some(&second));
    assert_eq!(second.bounds, orchestrator.mesher().grid().bounds());
}

#[test]
fn simulated_blobs_stay_inside_the_grid() {
    let config = BlobConfig {
        seed: Some(7),
        ..BlobConfig::default()
    };
    let grid = grid(config.cells_per_axis);
    let mut simulation = BlobSimulation::new(&config, &grid);
    let mut orchestrator = FrameOrchestrator::new(CpuMesher::new(grid));

    let bounds = grid.bounds();
    let slack = Aabb::new(bounds.min - Vec3::splat(1e-5), bounds.max + Vec3::splat(1e-5));
    for _ in 0..5 {
        simulation.update(1. / 60.);
        let frame = orchestrator
            .tick(&simulation.primitives(), config.field_params())
            .unwrap();
        assert!(frame.triangle_count() > 0);
        assert_eq!(frame.dropped_triangles(), 0);
    }

    let mesh = orchestrator.mesher_mut().mesh();
    assert!(mesh.vertices.iter().all(|vertex| slack.contains(vertex.position())));
}
