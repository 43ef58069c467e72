//! Stages of a reconstruction run, wired together from a `Config`.
//!
//! Each stage reports its statistics and timing through the `Progress` it is
//! given; the underlying algorithms print nothing.

use crate::backproject::{reconstruct, Engine};
use crate::cluster::cluster;
use crate::cone::ComptonCone;
use crate::config::Config;
use crate::detector::build_detector_cones;
use crate::hits::{PixelCluster, PixelHit};
use crate::steps::InteractionStep;
use crate::truth::build_truth_cones;
use crate::utils::timing::Progress;
use crate::validate::{validate, Validation};
use crate::volume::VoxelVolume;
use crate::Result;

pub fn clusters(hits: &[PixelHit], config: &Config, progress: &mut Progress) -> Result<Vec<PixelCluster>> {
    progress.start("Clustering pixel hits");
    let c = &config.clustering;
    let (clusters, stats) = cluster(hits, config.sensor.pixel_count, c.window, c.aggregation)?;
    progress.done();
    progress.note(&stats.to_string());
    Ok(clusters)
}

pub fn detector_cones(clusters: &[PixelCluster], config: &Config, progress: &mut Progress) -> Result<Vec<ComptonCone>> {
    progress.start("Building cones from cluster pairs");
    let frame = config.output_frame()?;
    let (cones, stats) = build_detector_cones(
        clusters,
        config.source_energy,
        config.sensor.thickness,
        config.drift_speed()?,
        frame.as_ref(),
    )?;
    progress.done();
    progress.note(&stats.to_string());
    Ok(cones)
}

/// Pixel hits all the way to cones
pub fn cones_from_hits(hits: &[PixelHit], config: &Config, progress: &mut Progress) -> Result<Vec<ComptonCone>> {
    let clusters = clusters(hits, config, progress)?;
    detector_cones(&clusters, config, progress)
}

pub fn truth_cones(steps: &[InteractionStep], config: &Config, progress: &mut Progress) -> Vec<ComptonCone> {
    progress.start("Building cones from tracking truth");
    let (cones, stats) = build_truth_cones(steps, config.source_energy);
    progress.done();
    progress.note(&stats.to_string());
    cones
}

pub fn image(cones: &[ComptonCone], config: &Config, engine: &dyn Engine, progress: &mut Progress) -> Result<VoxelVolume> {
    progress.start("Backprojecting cones");
    let (volume, stats) = reconstruct(cones, &config.voxel_grid()?, config.image.tolerance, engine)?;
    progress.done();
    progress.note(&stats.to_string());
    Ok(volume)
}

/// Point-source check, if the configuration places a source
pub fn point_source_check(
    cones: &[ComptonCone],
    config: &Config,
    engine: &dyn Engine,
    progress: &mut Progress,
) -> Result<Option<Validation>> {
    let Some(source) = config.source_position() else { return Ok(None) };
    progress.start("Validating cones against the point source");
    let (validation, stats) = validate(cones, source, &config.voxel_grid()?, config.image.tolerance, engine)?;
    progress.done();
    progress.note(&stats.to_string());
    Ok(Some(validation))
}
