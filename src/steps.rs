//! Per-step particle-tracking records, the input of the ground-truth cone
//! builder

use std::str::FromStr;

use geometry::{Point, Vector};
use units::todo::{Energyf32, Timef32};

use crate::hits::EventId;

pub type TrackId = u32;

/// The source photon is always the first track of its event
pub const PRIMARY_TRACK: TrackId = 1;

/// The first secondary created in an event
pub const FIRST_SECONDARY: TrackId = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Particle { Gamma, Electron, Positron, Other }

/// Physics process which created a track
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Process {
    /// Tracks that were not created by any process: the primaries
    Primary,
    Compton,
    Photoelectric,
    Ionisation,
    Other,
}

impl FromStr for Particle {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "gamma" => Self::Gamma,
            "e-"    => Self::Electron,
            "e+"    => Self::Positron,
            _       => Self::Other,
        })
    }
}

impl FromStr for Process {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" | "primary" => Self::Primary,
            "compt"        => Self::Compton,
            "phot"         => Self::Photoelectric,
            "eIoni"        => Self::Ionisation,
            _              => Self::Other,
        })
    }
}

/// One step of one track, as recorded by the particle-transport engine.
/// Positions in mm (global frame), energies in MeV, times in ns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionStep {
    pub event_id: EventId,
    pub track_id: TrackId,
    pub parent_id: TrackId,
    pub particle: Particle,
    pub pre_kinetic_energy: Energyf32,
    pub post_kinetic_energy: Energyf32,
    pub energy_deposited: Energyf32,
    pub pre_time: Timef32,
    pub pre_position: Point,
    pub post_position: Point,
    pub pre_direction: Vector,
    pub post_direction: Vector,
    pub creator: Process,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest(/**/ name   , process,
             case("compt", Process::Compton),
             case("phot" , Process::Photoelectric),
             case("eIoni", Process::Ionisation),
             case(""     , Process::Primary),
             case("msc"  , Process::Other),
    )]
    fn creator_process_names(name: &str, process: Process) {
        assert_eq!(name.parse::<Process>(), Ok(process));
    }

    #[test]
    fn particle_names() {
        assert_eq!("gamma".parse::<Particle>(), Ok(Particle::Gamma));
        assert_eq!("e-"   .parse::<Particle>(), Ok(Particle::Electron));
        assert_eq!("alpha".parse::<Particle>(), Ok(Particle::Other));
    }
}
