//! Compton camera reconstruction.
//!
//! Raw pixel hits are grouped into clusters (`cluster`), pairs of clusters
//! are turned into Compton cones (`detector`), or cones are taken directly
//! from tracking truth (`truth`). Cones are backprojected into a voxel volume
//! (`backproject`), and can be checked against a known point source
//! (`validate`).

pub mod error;
pub use error::{Error, Result};

pub mod utils;
pub mod index;
pub mod hits;
pub mod steps;
pub mod cluster;
pub mod cone;
pub mod truth;
pub mod sensor;
pub mod detector;
pub mod fov;
pub mod volume;
pub mod backproject;
pub mod validate;
pub mod config;
pub mod io;
pub mod pipeline;

pub use units::{Length, Time, Velocity, Ratio};
pub use geometry::{Point, Vector, Rotation};
