//! Frame-agnostic points, vectors and rotations.
//!
//! Components are plain `f32`s: the same types carry sensor-local fractional
//! pixel coordinates and global millimetre positions. Which frame a value lives
//! in is tracked by the code that owns it.

mod point;
mod vector;
mod rotation;
mod mix;

pub use point::Point;
pub use vector::Vector;
pub use rotation::Rotation;
