use glam::Vec3;

use super::field::FieldSample;
use super::tables::{EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use crate::common::{DEGENERATE_EDGE_EPSILON, MAX_TRIANGLES_PER_CELL};
use crate::data::MeshVertex;

/// Field sample at one corner of a cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerSample {
    pub position: Vec3,
    pub sample: FieldSample,
}

/// Surface crossing on a cell edge, before a normal is attached
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EdgeVertex {
    pub position: Vec3,
    pub color: Vec3,
}

pub type Triangle = [MeshVertex; 3];

/// The at most five triangles of one cell, stored inline
#[derive(Debug, Clone, Copy)]
pub struct CellTriangles {
    triangles: [Triangle; MAX_TRIANGLES_PER_CELL],
    len: usize,
}

impl Default for CellTriangles {
    fn default() -> Self {
        CellTriangles {
            triangles: [[MeshVertex::default(); 3]; MAX_TRIANGLES_PER_CELL],
            len: 0,
        }
    }
}

impl CellTriangles {
    fn push(&mut self, triangle: Triangle) {
        self.triangles[self.len] = triangle;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[Triangle] {
        &self.triangles[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Triangle> {
        self.as_slice().iter()
    }
}

/// Bit `i` is set when corner `i` lies inside, below `iso_level`
pub fn configuration_index(corners: &[CornerSample; 8], iso_level: f32) -> u8 {
    corners
        .iter()
        .enumerate()
        .filter(|(_, corner)| corner.sample.value < iso_level)
        .fold(0, |configuration, (i, _)| configuration | (1 << i))
}

/// Where along an edge from `v0` to `v1` the field reaches `iso_level`, in `[0, 1]`
pub fn edge_interpolant(v0: f32, v1: f32, iso_level: f32) -> f32 {
    let delta = v1 - v0;
    if delta.abs() < DEGENERATE_EDGE_EPSILON {
        return 0.5;
    }
    ((iso_level - v0) / delta).clamp(0., 1.)
}

fn interpolate_edge(corners: &[CornerSample; 8], edge: usize, iso_level: f32) -> EdgeVertex {
    let [a, b] = EDGE_CORNERS[edge];
    let (from, to) = (&corners[a], &corners[b]);
    let t = edge_interpolant(from.sample.value, to.sample.value, iso_level);
    EdgeVertex {
        position: from.position + (to.position - from.position) * t,
        color: from.sample.color + (to.sample.color - from.sample.color) * t,
    }
}

/// Triangulates one cell from its eight corner samples
///
/// `gradient` returns the field gradient at a surface point; it is normalized into the vertex
/// normal and the face normal is used wherever it vanishes. Triangles wind counter-clockwise
/// seen from outside.
pub fn triangulate_cell<G>(corners: &[CornerSample; 8], iso_level: f32, gradient: G) -> CellTriangles
where
    G: Fn(Vec3) -> Vec3,
{
    let mut triangles = CellTriangles::default();
    let configuration = configuration_index(corners, iso_level) as usize;
    let crossed = EDGE_TABLE[configuration];
    if crossed == 0 {
        return triangles;
    }

    let mut edge_vertices = [EdgeVertex::default(); 12];
    for (edge, vertex) in edge_vertices.iter_mut().enumerate() {
        if crossed & (1 << edge) != 0 {
            *vertex = interpolate_edge(corners, edge, iso_level);
        }
    }

    for edges in TRI_TABLE[configuration].chunks_exact(3) {
        if edges[0] < 0 {
            break;
        }
        // the table winds inward
        let vertices = [
            edge_vertices[edges[0] as usize],
            edge_vertices[edges[2] as usize],
            edge_vertices[edges[1] as usize],
        ];
        let face_normal = (vertices[1].position - vertices[0].position)
            .cross(vertices[2].position - vertices[0].position)
            .normalize_or_zero();
        triangles.push(vertices.map(|vertex| {
            let normal = gradient(vertex.position)
                .try_normalize()
                .unwrap_or(face_normal);
            MeshVertex::new(vertex.position, normal, vertex.color)
        }));
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meshing::tables::{triangle_count, CORNER_OFFSETS};
    use approx::assert_relative_eq;

    fn cell(configuration: u8) -> [CornerSample; 8] {
        std::array::from_fn(|i| CornerSample {
            position: Vec3::from_array(CORNER_OFFSETS[i].map(|offset| offset as f32)),
            sample: FieldSample {
                value: if configuration & (1 << i) != 0 { -1. } else { 1. },
                color: Vec3::splat(i as f32 / 7.),
            },
        })
    }

    fn no_gradient(_: Vec3) -> Vec3 {
        Vec3::ZERO
    }

    #[test]
    fn configuration_marks_corners_below_iso() {
        let corners = cell(0b1000_0101);
        assert_eq!(configuration_index(&corners, 0.), 0b1000_0101);
        // nothing is strictly below a level under every corner
        assert_eq!(configuration_index(&corners, -1.), 0);
    }

    #[test]
    fn uniform_cells_emit_nothing() {
        assert!(triangulate_cell(&cell(0x00), 0., no_gradient).is_empty());
        assert!(triangulate_cell(&cell(0xff), 0., no_gradient).is_empty());
    }

    #[test]
    fn every_configuration_emits_its_table_count() {
        for configuration in 0..=255u8 {
            let triangles = triangulate_cell(&cell(configuration), 0., no_gradient);
            assert_eq!(triangles.len(), triangle_count(configuration));
            assert!(triangles.len() <= MAX_TRIANGLES_PER_CELL);
        }
    }

    #[test]
    fn interpolant_handles_flat_and_out_of_range_edges() {
        assert_eq!(edge_interpolant(0.25, 0.25, 0.), 0.5);
        assert_eq!(edge_interpolant(-1., 3., 0.), 0.25);
        assert_eq!(edge_interpolant(1., 2., 0.), 0.);
        assert_eq!(edge_interpolant(-2., -1., 0.), 1.);
    }

    #[test]
    fn vertices_lie_on_crossed_edges() {
        let mut corners = cell(0b0000_0001);
        corners[0].sample.value = -0.25;
        corners[1].sample.value = 0.75;
        let triangles = triangulate_cell(&corners, 0., no_gradient);
        assert_eq!(triangles.len(), 1);
        let on_x_edge = triangles.as_slice()[0]
            .iter()
            .find(|vertex| vertex.position[1] == 0. && vertex.position[2] == 0.)
            .unwrap();
        assert_relative_eq!(on_x_edge.position[0], 0.25);
        assert_relative_eq!(on_x_edge.color[0], 0.25 / 7., epsilon = 1e-6);
    }

    #[test]
    fn faces_point_away_from_the_inside() {
        let corner = Vec3::ZERO;
        for (configuration, sign) in [(0b0000_0001u8, 1.), (0b1111_1110u8, -1.)] {
            let triangles = triangulate_cell(&cell(configuration), 0., no_gradient);
            assert_eq!(triangles.len(), 1);
            let triangle = &triangles.as_slice()[0];
            let centroid = triangle.iter().map(MeshVertex::position).sum::<Vec3>() / 3.;
            for vertex in triangle {
                assert!(sign * vertex.normal().dot(centroid - corner) > 0.);
            }
        }
    }

    #[test]
    fn gradient_overrides_face_normals() {
        let triangles = triangulate_cell(&cell(0b0000_0001), 0., |_| Vec3::new(0., 0., 2.));
        for vertex in triangles.as_slice()[0] {
            assert_eq!(vertex.normal(), Vec3::Z);
        }
    }
}
