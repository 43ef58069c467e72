//! Self-consistency check of a cone set against a point source at a known
//! position.
//!
//! Each cone is backprojected on its own and the slice through the source
//! plane is kept. A cone whose slice is empty at the source voxel is *bad*:
//! its surface misses the source.

use std::fmt;

use ndarray::{Array2, Array3, Axis};

use geometry::Point;

use crate::backproject::{reconstruct, Engine};
use crate::cone::ComptonCone;
use crate::fov::VoxelGrid;
use crate::index::Index3_u;
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct Validation {
    /// One slice per cone, in the order of the cones. Indexed
    /// `[cone, iy, ix]`, like the slices of a `VoxelVolume`.
    pub stack: Array3<f32>,
    /// Sum of all the slices in `stack`
    pub summed: Array2<f32>,
    /// Number of cones missing the source
    pub bad: usize,
    /// Grid index of the voxel containing the source
    pub source_voxel: Index3_u,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationStats {
    pub n_cones: usize,
    pub n_bad: usize,
    pub empty_input: bool,
}

impl fmt::Display for ValidationStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use crate::utils::{group_digits as g, percent};
        if self.empty_input { return write!(f, "no cones to validate") }
        write!(f, "{} of {} cones miss the source ({}%)",
               g(self.n_bad), g(self.n_cones), percent(self.n_bad, self.n_cones))
    }
}

/// Score `cones` against a point source at `source`, which must lie in
/// `grid`. No cones give an empty stack and are flagged in the statistics.
pub fn validate(
    cones: &[ComptonCone],
    source: Point,
    grid: &VoxelGrid,
    tolerance: f32,
    engine: &dyn Engine,
) -> Result<(Validation, ValidationStats)> {
    let source_voxel @ [ix, iy, iz] = grid.index_of(source).ok_or_else(|| Error::geometry(format!(
        "point source at ({}, {}, {}) mm lies outside the {:?} voxel grid",
        source.x, source.y, source.z, grid.n)))?;

    let [nx, ny, _] = grid.n;
    let mut stack = Array3::zeros((cones.len(), ny, nx));
    let mut bad = 0;
    for (mut slice, cone) in stack.axis_iter_mut(Axis(0)).zip(cones) {
        let (volume, _) = reconstruct(std::slice::from_ref(cone), grid, tolerance, engine)?;
        let source_plane = volume.slice_z(iz);
        if source_plane[[iy, ix]] == 0.0 { bad += 1 }
        slice.assign(&source_plane);
    }
    let summed = stack.sum_axis(Axis(0));

    let stats = ValidationStats { n_cones: cones.len(), n_bad: bad, empty_input: cones.is_empty() };
    Ok((Validation { stack, summed, bad, source_voxel }, stats))
}
