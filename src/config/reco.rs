//! Configuration file parser for reconstruction runs

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

use geometry::{Point, Rotation};
use units::todo::Energyf32;
use units::{mm_, ns, Length, Time, Velocity};

use crate::backproject::{EngineKind, DEFAULT_TOLERANCE};
use crate::cluster::Aggregation;
use crate::fov::VoxelGrid;
use crate::sensor::{charge_speed, SensorFrame};
use crate::{Error, Result};

// TOML has no notion of units, so quantities such as "2 ns" are written as
// strings and handed to `uom`'s parser.
fn deserialize_uom_opt<'d, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| s.parse::<T>())
        .transpose()
        .map_err(de::Error::custom)
}

fn deserialize_uom<'d, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    String::deserialize(deserializer)?
        .parse::<T>()
        .map_err(de::Error::custom)
}

fn deserialize_uom_3d<'d, D, T>(deserializer: D) -> std::result::Result<(T, T, T), D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let (x, y, z) = <(String, String, String)>::deserialize(deserializer)?;
    tr_tup_res((x.parse(), y.parse(), z.parse())).map_err(de::Error::custom)
}

fn deserialize_uom_3d_opt<'d, D, T>(deserializer: D) -> std::result::Result<Option<(T, T, T)>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<(String, String, String)>::deserialize(deserializer)?
        .map(|(x, y, z)| tr_tup_res((x.parse(), y.parse(), z.parse())))
        .transpose()
        .map_err(de::Error::custom)
}

/// Transpose 3-tuple of `Result`
///
/// `Ok` if all elements `Ok`; if any element is an `Err` return the first one.
fn tr_tup_res<O, E>((x,y,z): (std::result::Result<O, E>, std::result::Result<O, E>, std::result::Result<O, E>))
                    -> std::result::Result<(O, O, O), E> {
    Ok((x?, y?, z?))
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {

    /// Energy of the source photons, MeV
    pub source_energy: Energyf32,

    #[serde(default)]
    pub clustering: Clustering,

    pub sensor: Sensor,

    pub image: Image,

    pub validation: Option<Validation>,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Clustering {
    #[serde(default = "default_window")]
    #[serde(deserialize_with = "deserialize_uom")]
    pub window: Time,

    #[serde(default)]
    pub aggregation: Aggregation,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Sensor {
    /// Pixels per side
    pub pixel_count: usize,

    #[serde(deserialize_with = "deserialize_uom")]
    pub pixel_pitch: Length,

    #[serde(deserialize_with = "deserialize_uom")]
    pub thickness: Length,

    /// Global position of the sensor centre
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_3d_opt")]
    pub translation: Option<(Length, Length, Length)>,

    /// Row-major; identity if absent
    pub rotation: Option<[[f32; 3]; 3]>,

    /// Either the drift speed, or mobility and bias from which to derive it
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_opt")]
    pub drift_speed: Option<Velocity>,

    /// cm²/V/s
    pub mobility: Option<f32>,

    /// V
    pub bias: Option<f32>,

    /// Map detector cones into the global frame
    #[serde(default)]
    pub global: bool,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Image {
    pub nvoxels: (usize, usize, usize),

    #[serde(deserialize_with = "deserialize_uom")]
    pub voxel_pitch: Length,

    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    #[serde(default)]
    pub engine: EngineKind,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Validation {
    /// Position of the point source
    #[serde(deserialize_with = "deserialize_uom_3d")]
    pub source: (Length, Length, Length),
}

fn default_window() -> Time { ns(100.0) }
fn default_tolerance() -> f32 { DEFAULT_TOLERANCE }

impl Default for Clustering {
    fn default() -> Self { Self { window: default_window(), aggregation: Aggregation::default() } }
}

impl Config {

    /// Check values which the parser cannot
    pub fn check(&self) -> Result<()> {
        if !(self.source_energy > 0.0) {
            return Err(Error::Config(format!("source energy must be positive, got {} MeV", self.source_energy)))
        }
        if !(ns(0.0) <= self.clustering.window) {
            return Err(Error::Config("clustering window must not be negative".into()))
        }
        self.sensor_frame()?;
        self.voxel_grid()?;
        self.drift_speed()?;
        Ok(())
    }

    pub fn sensor_frame(&self) -> Result<SensorFrame> {
        let s = &self.sensor;
        let translation = s.translation
            .map(|(x, y, z)| Point::from_lengths(x, y, z))
            .unwrap_or_default();
        let rotation = s.rotation.map(Rotation::from_rows).unwrap_or_default();
        SensorFrame::new(translation, rotation, s.pixel_pitch, s.pixel_count, s.thickness)
    }

    /// The frame into which detector cones should be mapped, if any
    pub fn output_frame(&self) -> Result<Option<SensorFrame>> {
        self.sensor.global.then(|| self.sensor_frame()).transpose()
    }

    pub fn voxel_grid(&self) -> Result<VoxelGrid> {
        let (nx, ny, nz) = self.image.nvoxels;
        VoxelGrid::new([nx, ny, nz], self.image.voxel_pitch)
    }

    /// The configured drift speed, or one derived from mobility and bias
    pub fn drift_speed(&self) -> Result<Velocity> {
        let s = &self.sensor;
        match (s.drift_speed, s.mobility, s.bias) {
            (Some(v), None, None) => Ok(v),
            (None, Some(mobility), Some(bias)) => {
                if !(mm_(s.thickness) > 0.0) {
                    return Err(Error::geometry("sensor thickness must be positive"))
                }
                Ok(charge_speed(mobility, bias, s.thickness))
            },
            _ => Err(Error::Config("specify either `drift_speed` or both `mobility` and `bias`".into())),
        }
    }

    pub fn source_position(&self) -> Option<Point> {
        self.validation.as_ref().map(|v| {
            let (x, y, z) = v.source;
            Point::from_lengths(x, y, z)
        })
    }
}

pub fn parse_config(text: &str) -> Result<Config> {
    let config: Config = toml::from_str(text)?;
    config.check()?;
    Ok(config)
}

pub fn read_config_file(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
    parse_config(&text)
}
