//! Simple (non-iterative) backprojection of Compton cones.
//!
//! Every voxel is tested against every cone: a voxel is on a cone's surface
//! if the direction from the apex to the voxel centre makes an angle with the
//! cone axis whose cosine is within `tolerance` of the cone's. Each such
//! (voxel, cone) pair adds 1 to the voxel. No spatial pruning is done.
//!
//! The work can be split in different ways, by choosing an `Engine`. All
//! engines share the same membership test, and all counts are small integers,
//! so every engine produces exactly the same volume.

use std::fmt;

use ndarray::{Array3, Zip};
use rayon::prelude::*;
use serde::Deserialize;

use geometry::Point;

use crate::cone::{ComptonCone, Frame};
use crate::fov::VoxelGrid;
use crate::volume::VoxelVolume;
use crate::{Error, Result};

/// Default `tolerance` on the cosine of the cone half-angle
pub const DEFAULT_TOLERANCE: f32 = 0.01;

/// Execution strategy for accumulating cones into a voxel grid
pub trait Engine: Send + Sync {
    /// Per-voxel counts, indexed in grid order `[ix, iy, iz]`
    fn accumulate(&self, grid: &VoxelGrid, cones: &[ComptonCone], tolerance: f32) -> Array3<f32>;
    fn name(&self) -> &'static str;
}

/// Single thread, voxel by voxel
#[derive(Clone, Copy, Debug, Default)]
pub struct Serial;

/// Voxels shared out between threads
#[derive(Clone, Copy, Debug, Default)]
pub struct VoxelParallel;

/// Cones shared out between threads, each job accumulating `job_size` cones
/// into a private volume. The volumes are summed at the end.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConeParallel {
    /// 0: one job per thread
    pub job_size: usize,
}

/// Names the engines, for selection at startup
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    #[default]
    Serial,
    VoxelParallel,
    ConeParallel,
}

impl EngineKind {
    pub fn engine(self) -> Box<dyn Engine> {
        match self {
            Self::Serial        => Box::new(Serial),
            Self::VoxelParallel => Box::new(VoxelParallel),
            Self::ConeParallel  => Box::new(ConeParallel::default()),
        }
    }
}

/// Is the voxel centred at `voxel` on the surface of `cone`? Never true at the
/// apex itself, where the direction is undefined.
#[inline]
pub fn on_surface(cone: &ComptonCone, voxel: Point, tolerance: f32) -> bool {
    (voxel - cone.apex)
        .normalize()
        .map_or(false, |u| (u.dot(&cone.direction) - cone.cos_theta).abs() < tolerance)
}

fn count_cones(cones: &[ComptonCone], voxel: Point, tolerance: f32) -> f32 {
    cones.iter().filter(|cone| on_surface(cone, voxel, tolerance)).count() as f32
}

fn add_cone(counts: &mut Array3<f32>, grid: &VoxelGrid, cone: &ComptonCone, tolerance: f32) {
    Zip::indexed(counts).for_each(|(i, j, k), count| {
        if on_surface(cone, grid.voxel_centre([i, j, k]), tolerance) { *count += 1.0 }
    });
}

impl Engine for Serial {
    fn accumulate(&self, grid: &VoxelGrid, cones: &[ComptonCone], tolerance: f32) -> Array3<f32> {
        let mut counts = Array3::zeros(grid.n);
        Zip::indexed(&mut counts).for_each(|(i, j, k), count| {
            *count = count_cones(cones, grid.voxel_centre([i, j, k]), tolerance);
        });
        counts
    }
    fn name(&self) -> &'static str { "serial" }
}

impl Engine for VoxelParallel {
    fn accumulate(&self, grid: &VoxelGrid, cones: &[ComptonCone], tolerance: f32) -> Array3<f32> {
        let mut counts = Array3::zeros(grid.n);
        Zip::indexed(&mut counts).par_for_each(|(i, j, k), count| {
            *count = count_cones(cones, grid.voxel_centre([i, j, k]), tolerance);
        });
        counts
    }
    fn name(&self) -> &'static str { "voxel-parallel" }
}

impl Engine for ConeParallel {
    fn accumulate(&self, grid: &VoxelGrid, cones: &[ComptonCone], tolerance: f32) -> Array3<f32> {
        let job_size = match self.job_size {
            0 => (cones.len() / rayon::current_num_threads()).max(1),
            n => n,
        };
        let initial_thread_state = || Array3::zeros(grid.n);
        cones
            .par_iter()
            // Each job needs a whole volume of its own: keep jobs few and large
            .fold_chunks(job_size, initial_thread_state, |mut counts, cone| {
                add_cone(&mut counts, grid, cone, tolerance);
                counts
            })
            .reduce(initial_thread_state, |a, b| a + b)
    }
    fn name(&self) -> &'static str { "cone-parallel" }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructionStats {
    pub n_cones: usize,
    pub n_voxels: usize,
    /// Voxels crossed by at least one cone
    pub n_lit: usize,
    pub max_count: f32,
    pub frame: Option<Frame>,
    pub engine: &'static str,
}

impl fmt::Display for ReconstructionStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use crate::utils::{group_digits as g, percent};
        write!(f, "{} cones backprojected ({}) into {} voxels: {} lit ({}%), max count {}",
               g(self.n_cones), self.engine, g(self.n_voxels),
               g(self.n_lit), percent(self.n_lit, self.n_voxels), self.max_count)
    }
}

/// Accumulate `cones` into a volume over `grid`.
///
/// All cones must be expressed in the same frame, otherwise
/// `Error::MixedFrames`. The grid carries no frame of its own: its voxel
/// centres are read as coordinates of whatever frame the cones are in, so
/// reconstructing `Frame::Local` cones on a millimetre grid is the caller's
/// choice to make.
///
/// The grid is centred on the origin only along odd-sized axes. Voxel `i`
/// sits at `(i - n/2) * pitch`, so an even-sized axis reaches half a voxel
/// further towards negative coordinates. No cones give an empty volume.
pub fn reconstruct(
    cones: &[ComptonCone],
    grid: &VoxelGrid,
    tolerance: f32,
    engine: &dyn Engine,
) -> Result<(VoxelVolume, ReconstructionStats)> {
    if !(tolerance > 0.0 && tolerance.is_finite()) {
        return Err(Error::Config(format!("angular tolerance must be positive, got {tolerance}")))
    }
    let frame = common_frame(cones)?;
    let volume = VoxelVolume::from_grid_order(*grid, engine.accumulate(grid, cones, tolerance));
    let stats = ReconstructionStats {
        n_cones: cones.len(),
        n_voxels: grid.n_voxels(),
        n_lit: volume.n_lit(),
        max_count: volume.max(),
        frame,
        engine: engine.name(),
    };
    Ok((volume, stats))
}

/// The frame shared by all `cones`, `None` if there are none
pub fn common_frame(cones: &[ComptonCone]) -> Result<Option<Frame>> {
    let frame = cones.first().map(|c| c.frame);
    if cones.iter().any(|c| Some(c.frame) != frame) { return Err(Error::MixedFrames) }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use geometry::Vector;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;
    use units::mm;

    fn cone(apex: (f32, f32, f32), axis: (f32, f32, f32), cos_theta: f32) -> ComptonCone {
        let (x, y, z) = apex;
        let (dx, dy, dz) = axis;
        ComptonCone::new(0, Point::new(x, y, z), Vector::new(dx, dy, dz), cos_theta, Frame::Global).unwrap()
    }

    fn cube(n: usize) -> VoxelGrid { VoxelGrid::new([n, n, n], mm(1.0)).unwrap() }

    fn lit_voxels(volume: &VoxelVolume) -> Vec<[usize; 3]> {
        let [nx, ny, nz] = volume.grid.n;
        let mut lit = vec![];
        for ix in 0..nx { for iy in 0..ny { for iz in 0..nz {
            if volume.get([ix, iy, iz]) > 0.0 { lit.push([ix, iy, iz]) }
        }}}
        lit
    }

    #[test]
    fn degenerate_cone_is_a_half_line() {
        let grid = cube(9);
        let (volume, stats) = reconstruct(&[cone((0.0, 0.0, 0.0), (0.0, 0.0, 1.0), 1.0)], &grid, 0.01, &Serial).unwrap();
        // Apex excluded, only the forward half of the axis
        assert_eq!(lit_voxels(&volume), vec![[4, 4, 5], [4, 4, 6], [4, 4, 7], [4, 4, 8]]);
        assert_eq!(stats.n_lit, 4);
        assert_eq!(stats.max_count, 1.0);
    }

    #[rstest(/**/ cos_theta           , on_cone,
             case(std::f32::consts::FRAC_1_SQRT_2, [3, 0, 3]),
             case(0.8                 , [3, 0, 4]),
             case(0.6                 , [4, 0, 3]),
    )]
    fn rings_around_the_axis(cos_theta: f32, on_cone: [i32; 3]) {
        let half = 8;
        let grid = cube(2 * half + 1);
        let (volume, _) = reconstruct(&[cone((0.0, 0.0, 0.0), (0.0, 0.0, 1.0), cos_theta)], &grid, 0.01, &Serial).unwrap();
        let index = |x: i32, y: i32, z: i32| [(x + half as i32) as usize, (y + half as i32) as usize, (z + half as i32) as usize];

        // Voxels exactly on the cone, and their images under the symmetries of the ring
        let [a, b, z] = on_cone;
        for (x, y) in [(a, b), (-a, b), (b, a), (b, -a), (-b, -a)] {
            assert_eq!(volume.get(index(x, y, z)), 1.0, "({x}, {y}, {z})");
        }

        // Every lit voxel lies in the ring of radius tan(θ)·z, widened by the tolerance
        let (tan_min, tan_max) = ((cos_theta + 0.01).acos().tan(), (cos_theta - 0.01).acos().tan());
        for [ix, iy, iz] in lit_voxels(&volume) {
            let (x, y, z) = (ix as f32 - half as f32, iy as f32 - half as f32, iz as f32 - half as f32);
            assert!(z > 0.0);
            let r = (x * x + y * y).sqrt();
            assert!(r >= z * tan_min - 1e-4 && r <= z * tan_max + 1e-4, "({x}, {y}, {z})");
            assert_eq!(volume.get(index(-x as i32,  y as i32, z as i32)), 1.0);
            assert_eq!(volume.get(index( y as i32,  x as i32, z as i32)), 1.0);
        }
    }

    #[test]
    fn output_has_x_and_y_swapped() {
        let grid = cube(9);
        let (volume, _) = reconstruct(&[cone((0.0, 0.0, 0.0), (1.0, 0.0, 0.0), 1.0)], &grid, 0.01, &Serial).unwrap();
        assert_eq!(volume.get([6, 4, 4]), 1.0);
        assert_eq!(volume.data[[4, 6, 4]], 1.0);
        assert_eq!(volume.data[[6, 4, 4]], 0.0);
    }

    #[test]
    fn counts_add_up_over_cones() {
        let grid = cube(9);
        let line = cone((0.0, 0.0, 0.0), (0.0, 0.0, 1.0), 1.0);
        let (volume, _) = reconstruct(&[line, line, line], &grid, 0.01, &Serial).unwrap();
        assert_eq!(volume.get([4, 4, 7]), 3.0);
        assert_float_eq!(volume.total(), 12.0, ulps <= 0);
    }

    #[test]
    fn no_cones_give_an_empty_volume() {
        let (volume, stats) = reconstruct(&[], &cube(5), 0.01, &ConeParallel::default()).unwrap();
        assert_eq!(volume.total(), 0.0);
        assert_eq!(stats.frame, None);
    }

    #[test]
    fn frames_must_not_be_mixed() {
        let global = cone((0.0, 0.0, 0.0), (0.0, 0.0, 1.0), 0.5);
        let local = ComptonCone { frame: Frame::Local, ..global };
        let result = reconstruct(&[global, local], &cube(3), 0.01, &Serial);
        assert!(matches!(result, Err(Error::MixedFrames)));
    }

    #[test]
    fn local_cones_use_grid_coordinates_as_they_are() {
        let global = cone((0.0, 0.0, 0.0), (0.0, 0.0, 1.0), 0.8);
        let local = ComptonCone { frame: Frame::Local, ..global };
        let (from_global, _) = reconstruct(&[global], &cube(9), 0.01, &Serial).unwrap();
        let (from_local, stats) = reconstruct(&[local], &cube(9), 0.01, &Serial).unwrap();
        assert_eq!(from_local.data, from_global.data);
        assert_eq!(stats.frame, Some(Frame::Local));
    }

    #[test]
    fn even_axis_reaches_further_on_negative_side() {
        // x centres at -2, -1, 0, 1
        let grid = VoxelGrid::new([4, 3, 3], mm(1.0)).unwrap();
        let forward  = cone((0.0, 0.0, 0.0), ( 1.0, 0.0, 0.0), 1.0);
        let backward = cone((0.0, 0.0, 0.0), (-1.0, 0.0, 0.0), 1.0);
        let (volume, _) = reconstruct(&[forward], &grid, 0.01, &Serial).unwrap();
        assert_eq!(lit_voxels(&volume), vec![[3, 1, 1]]);
        let (volume, _) = reconstruct(&[backward], &grid, 0.01, &Serial).unwrap();
        assert_eq!(lit_voxels(&volume), vec![[0, 1, 1], [1, 1, 1]]);
    }

    #[rstest(tolerance, case(0.0), case(-0.01), case(f32::NAN))]
    fn tolerance_must_be_positive(tolerance: f32) {
        let result = reconstruct(&[], &cube(3), tolerance, &Serial);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    // ----- All engines agree ------------------------------------------------------------
    fn some_cones() -> impl Strategy<Value = Vec<ComptonCone>> {
        let coord = -6.0..6.0_f32;
        let cone = (coord.clone(), coord.clone(), coord, -1.0..1.0_f32, -1.0..1.0_f32, 0.1..1.0_f32, -0.95..0.95_f32)
            .prop_map(|(x, y, z, dx, dy, dz, cos)| cone((x, y, z), (dx, dy, dz), cos));
        prop::collection::vec(cone, 0..12)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]
        #[test]
        fn engines_give_identical_volumes(cones in some_cones(), job_size in 0..4_usize) {
            let grid = VoxelGrid::new([11, 9, 7], mm(1.5)).unwrap();
            let serial = Serial.accumulate(&grid, &cones, 0.01);
            prop_assert_eq!(&VoxelParallel.accumulate(&grid, &cones, 0.01), &serial);
            prop_assert_eq!(&ConeParallel { job_size }.accumulate(&grid, &cones, 0.01), &serial);
        }
    }

    #[rstest(kind, name,
             case(EngineKind::Serial       , "serial"),
             case(EngineKind::VoxelParallel, "voxel-parallel"),
             case(EngineKind::ConeParallel , "cone-parallel"),
    )]
    fn engine_selection(kind: EngineKind, name: &str) {
        assert_eq!(kind.engine().name(), name);
    }
}
