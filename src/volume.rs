//! Backprojection output: per-voxel counts over a `VoxelGrid`.
//!
//! The first two axes of `data` are swapped with respect to the grid: the
//! count for grid index `[ix, iy, iz]` is at `data[[iy, ix, iz]]`, which is
//! what image viewers expect of a stack of `z` slices.

use std::path::Path;

use ndarray::{Array2, Array3, Axis};

use crate::fov::VoxelGrid;
use crate::index::Index3_u;
use crate::io::raw;
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct VoxelVolume {
    pub grid: VoxelGrid,
    pub data: Array3<f32>,
}

impl VoxelVolume {

    pub fn zeros(grid: VoxelGrid) -> Self {
        let [nx, ny, nz] = grid.n;
        Self { grid, data: Array3::zeros((ny, nx, nz)) }
    }

    /// Wrap counts accumulated in grid order (`[ix, iy, iz]`)
    pub(crate) fn from_grid_order(grid: VoxelGrid, counts: Array3<f32>) -> Self {
        let data = counts.permuted_axes([1, 0, 2]).as_standard_layout().into_owned();
        Self { grid, data }
    }

    /// Count in the voxel with grid index `[ix, iy, iz]`
    pub fn get(&self, [ix, iy, iz]: Index3_u) -> f32 { self.data[[iy, ix, iz]] }

    /// The slice at grid index `iz`, indexed `[iy, ix]`
    pub fn slice_z(&self, iz: usize) -> Array2<f32> {
        self.data.index_axis(Axis(2), iz).to_owned()
    }

    pub fn total(&self) -> f32 { self.data.sum() }

    pub fn max(&self) -> f32 { self.data.fold(0.0, |m, &x| x.max(m)) }

    /// Number of voxels with nonzero count
    pub fn n_lit(&self) -> usize { self.data.iter().filter(|&&x| x != 0.0).count() }

    /// Write the counts, `data`'s last axis varying fastest
    pub fn write_raw(&self, path: &Path) -> Result<()> {
        raw::write(self.data.iter().copied(), path)
    }

    /// Read counts written by `write_raw` for the same `grid`
    pub fn read_raw(grid: VoxelGrid, path: &Path) -> Result<Self> {
        let [nx, ny, nz] = grid.n;
        let values = raw::read(path)?;
        let found = values.len();
        let data = Array3::from_shape_vec((ny, nx, nz), values).map_err(|_| Error::geometry(format!(
            "`{}` holds {found} voxels, grid {:?} needs {}", path.display(), grid.n, grid.n_voxels())))?;
        Ok(Self { grid, data })
    }
}
