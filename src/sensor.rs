//! Placement of a pixellated sensor in the laboratory, and the mapping
//! between its local fractional coordinates and global millimetres.
//!
//! Local coordinates: `x`, `y` are fractional pixel indices (pixel centres at
//! integers, `0` being the first pixel); `z` is depth along the sensor normal
//! in units of the sensor thickness, `0` at the mid-plane.

use geometry::{Point, Rotation, Vector};
use units::{cm_, mm_, mm_ns, Length, Velocity};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorFrame {
    /// Global position of the sensor centre, mm
    pub translation: Point,
    pub rotation: Rotation,
    pub pixel_pitch: Length,
    /// Pixels per side of the square sensor
    pub pixel_count: usize,
    pub thickness: Length,
}

impl SensorFrame {

    pub fn new(
        translation: Point,
        rotation: Rotation,
        pixel_pitch: Length,
        pixel_count: usize,
        thickness: Length,
    ) -> Result<Self> {
        if pixel_count == 0 {
            return Err(Error::geometry("sensor has no pixels"))
        }
        if !(mm_(pixel_pitch) > 0.0) {
            return Err(Error::geometry(format!("pixel pitch must be positive, got {pixel_pitch:?}")))
        }
        if !(mm_(thickness) > 0.0) {
            return Err(Error::geometry(format!("sensor thickness must be positive, got {thickness:?}")))
        }
        if !translation.is_finite() {
            return Err(Error::geometry("sensor translation is not finite"))
        }
        if !rotation.is_orthonormal(1e-4) {
            return Err(Error::geometry(format!("sensor rotation is not orthonormal: {:?}", rotation.0)))
        }
        Ok(Self { translation, rotation, pixel_pitch, pixel_count, thickness })
    }

    /// Global position of a point given in local fractional coordinates
    pub fn to_global(&self, local: Point) -> Point {
        let centred = local.coords() + self.centre_offset();
        self.translation + self.rotation.apply(centred.component_mul(self.scale()))
    }

    /// Local fractional coordinates of a global position
    pub fn to_local(&self, global: Point) -> Point {
        let centred = self.rotation.apply_inverse(global - self.translation).component_div(self.scale());
        Point::origin() + (centred - self.centre_offset())
    }

    /// Physical size of one unit of each local coordinate, mm
    fn scale(&self) -> Vector {
        let pitch = mm_(self.pixel_pitch);
        Vector::new(pitch, pitch, mm_(self.thickness))
    }

    /// Shift from pixel indices to positions relative to the sensor centre
    fn centre_offset(&self) -> Vector {
        let c = -(self.pixel_count as f32 / 2.0 - 0.5);
        Vector::new(c, c, 0.0)
    }
}

/// Speed of charge carriers drifting across an ohmic sensor of `thickness`
/// under a uniform field, given their `mobility` (cm²/V/s) and the `bias`
/// voltage (V).
pub fn charge_speed(mobility: f32, bias: f32, thickness: Length) -> Velocity {
    let field = bias / cm_(thickness); // V/cm
    // cm/s -> mm/ns
    mm_ns(mobility * field * 1e-8)
}
