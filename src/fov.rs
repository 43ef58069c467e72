//! The size and granularity of the voxel grid in which images are
//! reconstructed.
//!
//! The grid is centred on the origin, which is always the centre of a voxel:
//! along an axis with `n` voxels, voxel `i` is centred at `(i - n/2) * pitch`
//! (integer division), so even-sized axes extend half a voxel further on the
//! negative side.

use geometry::Point;
use units::{mm_, Length};

use crate::index::{BoxDim_u, Index3_u};
use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelGrid {
    pub n: BoxDim_u,
    pub pitch: Length,
}

impl VoxelGrid {

    pub fn new(n: BoxDim_u, pitch: Length) -> Result<Self> {
        if n.contains(&0) {
            return Err(Error::geometry(format!("voxel grid {n:?} has an empty dimension")))
        }
        if !(mm_(pitch) > 0.0 && mm_(pitch).is_finite()) {
            return Err(Error::geometry(format!("voxel pitch must be positive, got {pitch:?}")))
        }
        Ok(Self { n, pitch })
    }

    pub fn n_voxels(&self) -> usize { self.n.iter().product() }

    /// Find centre of voxel with given 3D index
    pub fn voxel_centre(&self, i: Index3_u) -> Point {
        let s = mm_(self.pitch);
        let c = |axis: usize| (i[axis] as f32 - (self.n[axis] / 2) as f32) * s;
        Point::new(c(0), c(1), c(2))
    }

    /// Index of the voxel containing `p`, if any
    pub fn index_of(&self, p: Point) -> Option<Index3_u> {
        let s = mm_(self.pitch);
        let i = |axis: usize, x: f32| {
            let i = (x / s).round() + (self.n[axis] / 2) as f32;
            (i >= 0.0 && i < self.n[axis] as f32).then_some(i as usize)
        };
        Some([i(0, p.x)?, i(1, p.y)?, i(2, p.z)?])
    }
}

#[cfg(test)]
mod test_voxel_grid {
    use super::*;
    use rstest::rstest;
    use units::mm;
    use float_eq::assert_float_eq;
    use proptest::prelude::*;

    #[rstest(/**/ index,   expected_position,
             case([0,0,0], [-2.0, -2.0, -2.0]),
             case([1,1,1], [ 0.0,  0.0,  0.0]),
             case([2,1,0], [ 2.0,  0.0, -2.0]),
             case([0,2,1], [-2.0,  2.0,  0.0]),
    )]
    fn voxel_centres(index: Index3_u, expected_position: [f32; 3]) {
        // Odd along x and y, even along z
        let grid = VoxelGrid::new([3, 3, 2], mm(2.0)).unwrap();
        let c = grid.voxel_centre(index);
        assert_float_eq!([c.x, c.y, c.z], expected_position, ulps <= [1, 1, 1]);
    }

    #[rstest(/**/ position          , expected,
             case(( 0.0,  0.0,  0.0), Some([1, 1, 1])),
             case(( 0.9, -0.9,  0.0), Some([1, 1, 1])),
             case(( 1.1, -1.1, -1.0), Some([2, 0, 0])),
             case(( 2.9,  0.0,  0.0), Some([2, 1, 1])),
             case(( 3.1,  0.0,  0.0), None),
             case(( 0.0,  0.0, -3.1), None),
             case(( 0.0,  0.0,  1.5), None),
    )]
    fn positions_to_voxels(position: (f32, f32, f32), expected: Option<Index3_u>) {
        let grid = VoxelGrid::new([3, 3, 2], mm(2.0)).unwrap();
        let (x, y, z) = position;
        assert_eq!(grid.index_of(Point::new(x, y, z)), expected);
    }

    #[rstest(/**/ n        , pitch,
             case([0, 3, 3], 1.0),
             case([3, 3, 3], 0.0),
             case([3, 3, 3], -1.0),
    )]
    fn invalid_grids(n: BoxDim_u, pitch: f32) {
        assert!(matches!(VoxelGrid::new(n, mm(pitch)), Err(Error::GeometryMismatch(_))));
    }

    proptest! {
        #[test]
        fn every_voxel_contains_its_centre(
            nx in 1..20_usize, ny in 1..20_usize, nz in 1..20_usize,
            pitch in 0.01..10.0_f32,
            i in 0..20_usize, j in 0..20_usize, k in 0..20_usize,
        ) {
            let grid = VoxelGrid::new([nx, ny, nz], mm(pitch)).unwrap();
            let index = [i % nx, j % ny, k % nz];
            prop_assert_eq!(grid.index_of(grid.voxel_centre(index)), Some(index));
        }
    }
}
