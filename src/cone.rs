//! Compton cones: the common output of both cone builders

use std::collections::BTreeMap;
use std::fmt;

use geometry::{Point, Vector};
use units::todo::Energyf32;

use crate::hits::EventId;

/// Electron rest energy, MeV
pub const ELECTRON_MASS: Energyf32 = 0.511;

/// Value of `ComptonCone::error_flag`: no per-cone uncertainty is estimated
pub const ERROR_SENTINEL: f32 = 200.0;

/// Coordinate frame in which a cone's apex and direction are expressed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Frame {
    /// Fractional pixel indices across the sensor, fractional thickness
    /// along its normal
    Local,
    /// Millimetres in the laboratory frame
    Global,
}

/// The locus of incoming photon directions compatible with one Compton
/// scatter: every point `p` such that the angle between `p - apex` and
/// `direction` has cosine `cos_theta`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComptonCone {
    pub event_id: EventId,
    pub apex: Point,
    /// Unit length
    pub direction: Vector,
    pub cos_theta: f32,
    pub error_flag: f32,
    pub frame: Frame,
}

impl ComptonCone {
    /// Build a cone whose axis points along `axis` (normalized here).
    pub fn new(event_id: EventId, apex: Point, axis: Vector, cos_theta: f32, frame: Frame) -> Result<Self, Rejection> {
        if !apex.is_finite() { return Err(Rejection::DegenerateDirection) }
        let direction = axis.normalize().ok_or(Rejection::DegenerateDirection)?;
        if !(-1.0..=1.0).contains(&cos_theta) { return Err(Rejection::Kinematics) }
        Ok(Self { event_id, apex, direction, cos_theta, error_flag: ERROR_SENTINEL, frame })
    }
}

/// Cosine of the photon scattering angle, from the energy `e1` given to the
/// electron by a photon of energy `e0` (both MeV).
///
/// `None` unless `0 ≤ e1 < e0` and the resulting cosine is physical.
pub fn compton_cos_theta(e1: Energyf32, e0: Energyf32) -> Option<f32> {
    if !(e0 > 0.0 && (0.0..e0).contains(&e1)) { return None }
    let cos = 1.0 - ELECTRON_MASS * e1 / (e0 * (e0 - e1));
    (-1.0..=1.0).contains(&cos).then_some(cos)
}

/// Compton edge: the largest energy a photon of energy `e0` can give to an
/// electron in a single scatter. A deposit above it cannot be a single
/// Compton scatter of the source photon.
pub fn e1_max(e0: Energyf32) -> Energyf32 {
    e0 * e0 / (e0 + ELECTRON_MASS / 2.0)
}

/// Why an event produced no cone. Not an error: rejected events are counted
/// and skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rejection {
    /// The source photon never appears in the event
    NoPrimary,
    /// Deposited energy differs from the source energy
    NotFullEnergy,
    /// Earliest interaction is neither a tracked scatter nor a Compton recoil
    UnknownTopology,
    /// Nothing follows the recoil electron and its descendants
    NoScatteredPhoton,
    /// Detector events must consist of exactly two clusters
    NotTwoClusters,
    /// Summed cluster energy too far from the source energy
    EnergySum,
    /// Absorption cluster at or below the Compton edge
    BelowComptonEdge,
    /// Energies incompatible with Compton scattering
    Kinematics,
    /// Apex and second interaction coincide, or are not finite
    DegenerateDirection,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Rejection::*;
        let text = match self {
            NoPrimary           => "no primary photon",
            NotFullEnergy       => "not full energy",
            UnknownTopology     => "unknown topology",
            NoScatteredPhoton   => "no scattered photon",
            NotTwoClusters      => "not two clusters",
            EnergySum           => "energy sum",
            BelowComptonEdge    => "below Compton edge",
            Kinematics          => "unphysical kinematics",
            DegenerateDirection => "degenerate direction",
        };
        f.write_str(text)
    }
}

/// Outcome of building cones from a batch of events
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConeStats {
    pub n_events: usize,
    pub n_cones: usize,
    pub rejected: BTreeMap<Rejection, usize>,
}

pub type TruthStats    = ConeStats;
pub type DetectorStats = ConeStats;

impl ConeStats {
    pub(crate) fn record(&mut self, outcome: &Result<ComptonCone, Rejection>) {
        self.n_events += 1;
        match outcome {
            Ok(_)  => self.n_cones += 1,
            Err(r) => *self.rejected.entry(*r).or_default() += 1,
        }
    }

    pub fn n_rejected(&self, reason: Rejection) -> usize {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }
}

impl fmt::Display for ConeStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use crate::utils::{group_digits as g, percent};
        write!(f, "{} cones from {} events ({}%)",
               g(self.n_cones), g(self.n_events), percent(self.n_cones, self.n_events))?;
        for (reason, n) in &self.rejected {
            write!(f, "\n    rejected ({reason}): {}", g(n))?;
        }
        Ok(())
    }
}
