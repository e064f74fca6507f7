use glam::{UVec3, Vec3};

use crate::common::MAX_VERTICES_PER_CELL;
use crate::error::{BlobError, Result};

/// Axis aligned box in world space
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Aabb { min, max }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Static lattice of cubic cells the field is sampled on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    /// number of cells along each axis
    pub cells: UVec3,
    /// world position of the minimum corner
    pub origin: Vec3,
    /// world size of one cell along each axis
    pub cell_size: Vec3,
}

impl Grid {
    pub fn new(cells: UVec3, origin: Vec3, cell_size: Vec3) -> Result<Self> {
        if cells.min_element() == 0 {
            return Err(BlobError::InvalidGrid(format!(
                "every axis needs at least one cell, got {cells}"
            )));
        }
        if !cell_size.is_finite() || cell_size.min_element() <= 0. {
            return Err(BlobError::InvalidGrid(format!(
                "cell size must be positive and finite, got {cell_size}"
            )));
        }
        if !origin.is_finite() {
            return Err(BlobError::InvalidGrid(format!(
                "origin must be finite, got {origin}"
            )));
        }
        let capacity = cells.x as u64 * cells.y as u64 * cells.z as u64 * MAX_VERTICES_PER_CELL as u64;
        if capacity > u32::MAX as u64 {
            return Err(BlobError::InvalidGrid(format!(
                "{cells} cells need {capacity} vertex slots, more than 32 bit indices can address"
            )));
        }
        Ok(Grid {
            cells,
            origin,
            cell_size,
        })
    }

    /// A cube of `cells_per_axis`³ cells spanning `[-volume_radius, volume_radius]` on each axis
    pub fn centered(cells_per_axis: u32, volume_radius: f32) -> Result<Self> {
        let cells = UVec3::splat(cells_per_axis);
        let cell_size = Vec3::splat(volume_radius / cells_per_axis.max(1) as f32 * 2.);
        let origin = -0.5 * cells.as_vec3() * cell_size;
        Grid::new(cells, origin, cell_size)
    }

    pub fn cell_count(&self) -> u32 {
        self.cells.x * self.cells.y * self.cells.z
    }

    /// vertex (and index) slots needed so that no cell can ever overflow
    pub fn vertex_capacity(&self) -> u32 {
        self.cell_count() * MAX_VERTICES_PER_CELL as u32
    }

    pub fn extent(&self) -> Vec3 {
        self.cells.as_vec3() * self.cell_size
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.origin, self.origin + self.extent())
    }

    /// Region primitive centers are kept in so their blended surface never touches the
    /// boundary, the bounds shrunk by `volume_radius * (0.3 + 3 * smooth_k)` on every side
    pub fn padded_bounds(&self, volume_radius: f32, smooth_k: f32) -> Aabb {
        let bounds = self.bounds();
        let center = bounds.center();
        let half = (bounds.size() * 0.5 - volume_radius * (0.3 + smooth_k * 3.)).max(Vec3::ZERO);
        Aabb::new(center - half, center + half)
    }

    /// Cell coordinates of a flat cell index, x varying fastest
    pub fn cell_coordinates(&self, index: u32) -> UVec3 {
        let x = index % self.cells.x;
        let y = (index / self.cells.x) % self.cells.y;
        let z = index / (self.cells.x * self.cells.y);
        UVec3::new(x, y, z)
    }

    pub fn cell_index(&self, cell: UVec3) -> u32 {
        cell.x + cell.y * self.cells.x + cell.z * self.cells.x * self.cells.y
    }

    /// World position of a lattice corner, corners range over `0..=cells` on each axis
    pub fn corner_position(&self, corner: UVec3) -> Vec3 {
        self.origin + corner.as_vec3() * self.cell_size
    }

    /// Number of workgroups needed to cover every cell with the given workgroup shape
    pub fn workgroup_count(&self, workgroup_size: [u32; 3]) -> [u32; 3] {
        [
            (self.cells.x + workgroup_size[0] - 1) / workgroup_size[0],
            (self.cells.y + workgroup_size[1] - 1) / workgroup_size[1],
            (self.cells.z + workgroup_size[2] - 1) / workgroup_size[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn centered_grid_spans_the_volume() {
        let grid = Grid::centered(40, 0.175).unwrap();
        let bounds = grid.bounds();
        assert_relative_eq!(bounds.min.x, -0.175, epsilon = 1e-6);
        assert_relative_eq!(bounds.max.z, 0.175, epsilon = 1e-6);
        assert_relative_eq!(grid.cell_size.y, 0.00875, epsilon = 1e-7);
        assert_eq!(grid.cell_count(), 64_000);
        assert_eq!(grid.vertex_capacity(), 960_000);
    }

    #[test]
    fn rejects_empty_and_degenerate_grids() {
        assert!(matches!(
            Grid::new(UVec3::new(4, 0, 4), Vec3::ZERO, Vec3::ONE),
            Err(BlobError::InvalidGrid(_))
        ));
        assert!(Grid::new(UVec3::splat(4), Vec3::ZERO, Vec3::new(1., 0., 1.)).is_err());
        assert!(Grid::new(UVec3::splat(4), Vec3::ZERO, Vec3::splat(f32::NAN)).is_err());
        assert!(Grid::centered(0, 1.).is_err());
    }

    #[test]
    fn rejects_grids_beyond_32_bit_indices() {
        assert!(Grid::new(UVec3::splat(1024), Vec3::ZERO, Vec3::ONE).is_err());
    }

    #[test]
    fn cell_index_round_trips_with_x_fastest() {
        let grid = Grid::new(UVec3::new(3, 4, 5), Vec3::ZERO, Vec3::ONE).unwrap();
        assert_eq!(grid.cell_coordinates(1), UVec3::new(1, 0, 0));
        assert_eq!(grid.cell_coordinates(3), UVec3::new(0, 1, 0));
        assert_eq!(grid.cell_coordinates(12), UVec3::new(0, 0, 1));
        for index in 0..grid.cell_count() {
            assert_eq!(grid.cell_index(grid.cell_coordinates(index)), index);
        }
    }

    #[test]
    fn padding_grows_with_smoothing_and_never_inverts() {
        let grid = Grid::centered(40, 0.175).unwrap();
        let sharp = grid.padded_bounds(0.175, 0.);
        let smooth = grid.padded_bounds(0.175, 0.1);
        assert_relative_eq!(sharp.max.x, 0.175 - 0.0525, epsilon = 1e-6);
        assert!(smooth.size().x < sharp.size().x);
        let collapsed = grid.padded_bounds(0.175, 10.);
        assert_eq!(collapsed.size(), Vec3::ZERO);
    }

    #[test]
    fn workgroups_cover_partial_tiles() {
        let grid = Grid::new(UVec3::new(9, 8, 5), Vec3::ZERO, Vec3::ONE).unwrap();
        assert_eq!(grid.workgroup_count([8, 8, 4]), [2, 1, 2]);
    }
}
