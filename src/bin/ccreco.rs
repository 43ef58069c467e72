// ----------------------------------- CLI -----------------------------------
#[derive(clap::Parser, Debug, Clone)]
#[clap(name = "ccreco", about = "Backproject Compton cones into a voxel image")]
pub struct Cli {

    /// Reconstruction configuration (TOML)
    #[clap(short, long)]
    pub config: PathBuf,

    /// Cone table to reconstruct
    pub cones: PathBuf,

    /// Where to write the reconstructed volume (raw little-endian f32)
    #[clap(short, long, default_value = "ccreco.raw")]
    pub output: PathBuf,

    /// Cones are in local sensor coordinates, rather than global mm
    #[clap(long)]
    pub local: bool,

    /// Check the cones against the point source given in the configuration,
    /// writing the summed source-plane slice here
    #[clap(long)]
    pub validate: Option<PathBuf>,

    /// Override the engine chosen in the configuration
    #[clap(short, long, value_enum)]
    pub engine: Option<EngineKind>,

    /// Cones per job for the cone-parallel engine [default: one job per thread]
    #[clap(long)]
    pub job_size: Option<usize>,

    /// Maximum number of rayon threads
    #[clap(short = 'j', long, default_value = "4")]
    pub n_threads: usize,

}

// --------------------------------------------------------------------------------

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use ccreco::backproject::{ConeParallel, Engine, EngineKind};
use ccreco::cone::Frame;
use ccreco::config::read_config_file;
use ccreco::io::{cones::read_cones, raw};
use ccreco::pipeline;
use ccreco::utils::{group_digits, timing::Progress};

fn main() -> Result<(), Box<dyn Error>> {

    let Cli { config, cones, output, local, validate, engine, job_size, n_threads } = Cli::parse();

    let mut progress = Progress::new();

    progress.start(&format!("Reading configuration {config:?}"));
    let config = read_config_file(&config)?;
    progress.done();

    progress.start(&format!("Reading cones {cones:?}"));
    let frame = if local { Frame::Local } else { Frame::Global };
    let cones = read_cones(&cones, frame)?;
    progress.done_with_message(&format!("Read {} cones", group_digits(cones.len())));

    let engine: Box<dyn Engine> = match (engine.unwrap_or(config.image.engine), job_size) {
        (EngineKind::ConeParallel, Some(job_size)) => Box::new(ConeParallel { job_size }),
        (kind, _) => kind.engine(),
    };
    let pool = rayon::ThreadPoolBuilder::new().num_threads(n_threads).build()?;
    progress.note(&format!("Using {} engine, up to {n_threads} threads", engine.name()));

    let volume = pool.install(|| pipeline::image(&cones, &config, engine.as_ref(), &mut progress))?;
    progress.start(&format!("Writing volume to {output:?}"));
    volume.write_raw(&output)?;
    progress.done();

    if let Some(path) = validate {
        let validation = pool.install(|| pipeline::point_source_check(&cones, &config, engine.as_ref(), &mut progress))?;
        let Some(validation) = validation else {
            return Err("--validate requires a [validation] source in the configuration".into())
        };
        progress.start(&format!("Writing summed source-plane slice to {path:?}"));
        raw::write(validation.summed.iter().copied(), &path)?;
        progress.done();
    }
    Ok(())
}
