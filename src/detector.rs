//! Compton cones from pairs of pixel clusters.
//!
//! An event is usable only if it left exactly two clusters whose energies add
//! up to the source energy. The lower-energy cluster is taken to be the
//! Compton scatter and the higher one the absorption of the scattered photon,
//! which requires the latter to lie above the Compton edge. This ordering is
//! a heuristic: a scatter depositing more than the absorption is
//! misclassified.
//!
//! Depth is known only relative to the scatter, from the difference in charge
//! drift times. The scatter is placed on the sensor mid-plane.

use itertools::Itertools;

use geometry::Point;
use units::todo::Energyf32;
use units::{mm_, ns, ratio_, Length, Velocity};

use crate::cone::{compton_cos_theta, e1_max, ComptonCone, DetectorStats, Frame, Rejection};
use crate::hits::PixelCluster;
use crate::sensor::SensorFrame;
use crate::{Error, Result};

/// Largest difference (MeV) between summed cluster energy and source energy
pub const ENERGY_SUM_TOLERANCE: Energyf32 = 0.1;

/// One cone per accepted event, in ascending order of event id.
///
/// Cluster energies are in keV, `source_energy` in MeV. With a `frame` the
/// cones are mapped to the global frame, otherwise they stay in local
/// fractional sensor coordinates.
pub fn build_detector_cones(
    clusters: &[PixelCluster],
    source_energy: Energyf32,
    thickness: Length,
    drift_speed: Velocity,
    frame: Option<&SensorFrame>,
) -> Result<(Vec<ComptonCone>, DetectorStats)> {
    if !(mm_(thickness) > 0.0) {
        return Err(Error::geometry(format!("sensor thickness must be positive, got {thickness:?}")))
    }
    if let Some(frame) = frame {
        if frame.thickness != thickness {
            return Err(Error::geometry(format!(
                "sensor thickness {thickness:?} differs from the frame's {:?}", frame.thickness)))
        }
    }
    let mut stats = DetectorStats::default();
    let mut cones = vec![];
    let by_event = clusters.iter()
        .sorted_by_key(|c| c.event_id)
        .group_by(|c| c.event_id);
    for (_, event) in &by_event {
        let event: Vec<_> = event.collect();
        let outcome = match event[..] {
            [a, b] => cone_from_pair(a, b, source_energy, thickness, drift_speed, frame),
            _      => Err(Rejection::NotTwoClusters),
        };
        stats.record(&outcome);
        if let Ok(cone) = outcome { cones.push(cone) }
    }
    Ok((cones, stats))
}

fn cone_from_pair(
    a: &PixelCluster,
    b: &PixelCluster,
    source_energy: Energyf32,
    thickness: Length,
    drift_speed: Velocity,
    frame: Option<&SensorFrame>,
) -> std::result::Result<ComptonCone, Rejection> {
    let (scatter, absorption) = if a.energy <= b.energy { (a, b) } else { (b, a) };
    let e1       = scatter   .energy / 1000.0;
    let absorbed = absorption.energy / 1000.0;

    if (e1 + absorbed - source_energy).abs() >= ENERGY_SUM_TOLERANCE {
        return Err(Rejection::EnergySum)
    }
    if absorbed <= e1_max(source_energy) {
        return Err(Rejection::BelowComptonEdge)
    }
    let cos_theta = compton_cos_theta(e1, source_energy).ok_or(Rejection::Kinematics)?;

    let depth: Length = drift_speed * ns(scatter.toa - absorption.toa);
    let dz = ratio_(depth / thickness);

    let apex       = Point::new(scatter.x, scatter.y, 0.0);
    let absorption = Point::new(absorption.x, absorption.y, dz);
    let (apex, absorption, frame_tag) = match frame {
        Some(f) => (f.to_global(apex), f.to_global(absorption), Frame::Global),
        None    => (apex, absorption, Frame::Local),
    };
    ComptonCone::new(scatter.event_id, apex, apex - absorption, cos_theta, frame_tag)
}
