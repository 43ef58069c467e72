//! Pixel-level detector records: raw activations and the clusters built from them.

use units::todo::{Energyf32, Timef32};

pub type EventId = u32;
pub type PixelIndex = i32;

/// One digitized pixel activation, as delivered by the detector chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelHit {
    pub event_id: EventId,
    pub x: PixelIndex,
    pub y: PixelIndex,
    /// Time of arrival, ns
    pub toa: Timef32,
    /// keV
    pub energy: Energyf32,
}

impl PixelHit {
    pub fn new(event_id: EventId, (x, y): (PixelIndex, PixelIndex), toa: Timef32, energy: Energyf32) -> Self {
        Self { event_id, x, y, toa, energy }
    }

    /// Chebyshev adjacency: neighbouring pixels, including diagonals and the
    /// pixel itself
    pub fn is_adjacent(&self, other: &Self) -> bool {
        (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }

    pub fn on_sensor(&self, pixel_count: usize) -> bool {
        let n = pixel_count as PixelIndex;
        (0..n).contains(&self.x) && (0..n).contains(&self.y)
    }
}

/// One energy deposition reconstructed from adjacent, nearly coincident pixel
/// hits.
///
/// Positions are fractional pixel indices: integer values are pixel centres,
/// with `(0, 0)` the centre of the lower-left pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelCluster {
    pub event_id: EventId,
    pub x: f32,
    pub y: f32,
    /// keV
    pub energy: Energyf32,
    /// Earliest time of arrival among the members, ns
    pub toa: Timef32,
    /// Number of member hits
    pub n_hits: u32,
}

/// 1-D identifier of the pixel at `(x, y)` on a sensor with `n` pixels per side
pub fn pixel_id(x: PixelIndex, y: PixelIndex, n: usize) -> i64 {
    x as i64 * n as i64 + y as i64
}

/// Inverse of `pixel_id`, `None` on a sensor without pixels
pub fn pixel_xy(id: i64, n: usize) -> Option<(PixelIndex, PixelIndex)> {
    let n = n as i64;
    Some(((id.checked_div(n)?) as PixelIndex, (id.checked_rem(n)?) as PixelIndex))
}
