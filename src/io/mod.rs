pub mod raw;
pub mod cones;
