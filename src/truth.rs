//! Compton cones from particle-tracking ground truth.
//!
//! Only full-energy events are used. The earliest step of each event
//! identifies the first Compton scatter, in one of two tracking topologies:
//!
//! + The primary photon is tracked through the scatter: the step's end point
//!   is the apex and its outgoing direction gives the cone axis.
//!
//! + The recoil electron is recorded as a new track created by `compt`: its
//!   starting point is the apex. The axis is found from whatever follows once
//!   the electron and all its descendants are removed.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use ordered_float::OrderedFloat;

use units::todo::Energyf32;

use crate::cone::{compton_cos_theta, ComptonCone, Frame, Rejection, TruthStats};
use crate::hits::EventId;
use crate::steps::{InteractionStep, Process, TrackId, FIRST_SECONDARY, PRIMARY_TRACK};

/// Largest difference between deposited and source energy (MeV) for an event
/// to count as full-energy
pub const FULL_ENERGY_TOLERANCE: Energyf32 = 1e-5;

/// One cone per accepted event, in ascending order of event id. The steps may
/// arrive in any order.
pub fn build_truth_cones(steps: &[InteractionStep], source_energy: Energyf32) -> (Vec<ComptonCone>, TruthStats) {
    let mut stats = TruthStats::default();
    let mut cones = vec![];
    let by_event = steps.iter()
        .sorted_by_key(|s| s.event_id)
        .group_by(|s| s.event_id);
    for (event_id, event) in &by_event {
        let outcome = cone_from_event(event_id, event.collect(), source_energy);
        stats.record(&outcome);
        if let Ok(cone) = outcome { cones.push(cone) }
    }
    (cones, stats)
}

fn cone_from_event(
    event_id: EventId,
    mut steps: Vec<&InteractionStep>,
    source_energy: Energyf32,
) -> Result<ComptonCone, Rejection> {
    let is_primary = |s: &&InteractionStep| s.track_id == PRIMARY_TRACK;
    if !steps.iter().any(is_primary) { return Err(Rejection::NoPrimary) }

    let deposited: Energyf32 = steps.iter().map(|s| s.energy_deposited).sum();
    if (deposited - source_energy).abs() > FULL_ENERGY_TOLERANCE {
        return Err(Rejection::NotFullEnergy)
    }

    steps.sort_by_key(|s| OrderedFloat(s.pre_time));
    let first = steps[0];

    let (apex, axis, e1) =
        if is_primary(&first) && first.energy_deposited > 0.0 && steps.iter().filter(|s| is_primary(s)).count() > 1 {
            (first.post_position, -first.post_direction, first.energy_deposited)
        } else if first.track_id == FIRST_SECONDARY && first.creator == Process::Compton {
            let apex = first.pre_position;
            let removed = descendants(&steps, first.track_id);
            let next = steps.iter()
                .find(|s| !removed.contains(&s.track_id))
                .ok_or(Rejection::NoScatteredPhoton)?;
            let axis = if is_primary(next) { -next.pre_direction }
                       else                { apex - next.pre_position };
            (apex, axis, first.pre_kinetic_energy)
        } else {
            return Err(Rejection::UnknownTopology)
        };

    let cos_theta = compton_cos_theta(e1, source_energy).ok_or(Rejection::Kinematics)?;
    ComptonCone::new(event_id, apex, axis, cos_theta, Frame::Global)
}

/// `root` and every track descending from it
fn descendants(steps: &[&InteractionStep], root: TrackId) -> HashSet<TrackId> {
    let mut children: HashMap<TrackId, HashSet<TrackId>> = HashMap::new();
    for s in steps {
        if s.track_id != s.parent_id {
            children.entry(s.parent_id).or_default().insert(s.track_id);
        }
    }
    let mut found = HashSet::from([root]);
    let mut pending = vec![root];
    while let Some(track) = pending.pop() {
        for &child in children.get(&track).into_iter().flatten() {
            if found.insert(child) { pending.push(child) }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::Particle;
    use float_eq::assert_float_eq;
    use geometry::{Point, Vector};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const E0: Energyf32 = 0.140;

    /// A step with only the fields the cone builder looks at
    fn step(event_id: EventId, (track_id, parent_id): (TrackId, TrackId), t: f32, edep: Energyf32) -> InteractionStep {
        InteractionStep {
            event_id, track_id, parent_id,
            particle: if track_id == PRIMARY_TRACK { Particle::Gamma } else { Particle::Electron },
            pre_kinetic_energy: 0.0,
            post_kinetic_energy: 0.0,
            energy_deposited: edep,
            pre_time: t,
            pre_position: Point::origin(),
            post_position: Point::origin(),
            pre_direction: Vector::new(0.0, 0.0, 1.0),
            post_direction: Vector::new(0.0, 0.0, 1.0),
            creator: if track_id == PRIMARY_TRACK { Process::Primary } else { Process::Other },
        }
    }

    fn tracked_scatter(event_id: EventId) -> Vec<InteractionStep> {
        let scatter = InteractionStep {
            post_position: Point::new(1.0, 2.0, 3.0),
            post_direction: Vector::new(0.0, 0.0, -1.0),
            ..step(event_id, (1, 0), 1.0, 0.030)
        };
        vec![scatter, step(event_id, (1, 0), 2.0, 0.110)]
    }

    fn recoil_electron(event_id: EventId) -> InteractionStep {
        InteractionStep {
            pre_position: Point::new(1.0, 1.0, 1.0),
            pre_kinetic_energy: 0.030,
            creator: Process::Compton,
            ..step(event_id, (2, 1), 1.0, 0.030)
        }
    }

    #[test]
    fn primary_tracked_through_scatter() {
        let (cones, stats) = build_truth_cones(&tracked_scatter(7), E0);
        assert_eq!(stats.n_cones, 1);
        let cone = cones[0];
        assert_eq!(cone.event_id, 7);
        assert_eq!(cone.apex, Point::new(1.0, 2.0, 3.0));
        assert_eq!(cone.direction, Vector::new(0.0, 0.0, 1.0));
        assert_eq!(cone.frame, Frame::Global);
        assert_float_eq!(cone.cos_theta, compton_cos_theta(0.030, E0).unwrap(), ulps <= 1);
    }

    #[test]
    fn recoil_electron_then_primary() {
        let photon = InteractionStep {
            pre_direction: Vector::new(1.0, 0.0, 0.0),
            ..step(1, (1, 0), 2.0, 0.110)
        };
        // A delta ray of the recoil electron must be skipped
        let steps = [recoil_electron(1), step(1, (3, 2), 1.5, 0.0), photon];
        let (cones, _) = build_truth_cones(&steps, E0);
        assert_eq!(cones[0].apex, Point::new(1.0, 1.0, 1.0));
        assert_eq!(cones[0].direction, Vector::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn recoil_electron_then_new_track() {
        let photoelectron = InteractionStep {
            pre_position: Point::new(1.0, 1.0, 5.0),
            ..step(1, (4, 1), 2.0, 0.110)
        };
        let steps = [recoil_electron(1), photoelectron, step(1, (1, 0), 3.0, 0.0)];
        let (cones, stats) = build_truth_cones(&steps, E0);
        assert_eq!(stats.rejected.len(), 0);
        // Points from the second interaction back to the apex
        assert_eq!(cones[0].direction, Vector::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn partial_absorption_is_rejected() {
        let mut steps = tracked_scatter(1);
        steps[1].energy_deposited = 0.050;
        let (cones, stats) = build_truth_cones(&steps, E0);
        assert!(cones.is_empty());
        assert_eq!(stats.n_rejected(Rejection::NotFullEnergy), 1);
    }

    #[test]
    fn events_without_primary_are_rejected() {
        let steps = [step(1, (5, 3), 0.0, 0.140)];
        let (_, stats) = build_truth_cones(&steps, E0);
        assert_eq!(stats.n_rejected(Rejection::NoPrimary), 1);
    }

    #[test]
    fn unrecognized_first_interaction() {
        let steps = [step(1, (3, 1), 0.0, 0.030), step(1, (1, 0), 1.0, 0.110)];
        let (_, stats) = build_truth_cones(&steps, E0);
        assert_eq!(stats.n_rejected(Rejection::UnknownTopology), 1);
    }

    #[test]
    fn photoabsorbed_at_once() {
        let (cones, stats) = build_truth_cones(&[step(1, (1, 0), 1.0, 0.140)], E0);
        assert!(cones.is_empty());
        assert_eq!(stats.n_rejected(Rejection::UnknownTopology), 1);
    }

    #[rstest(/**/ creator,
             case(Process::Photoelectric),
             case(Process::Ionisation),
             case(Process::Other),
    )]
    fn first_secondary_must_be_compton_recoil(creator: Process) {
        let electron = InteractionStep { creator, ..recoil_electron(1) };
        let steps = [electron, step(1, (1, 0), 2.0, 0.110)];
        let (cones, stats) = build_truth_cones(&steps, E0);
        assert!(cones.is_empty());
        assert_eq!(stats.n_rejected(Rejection::UnknownTopology), 1);
    }

    #[test]
    fn primary_without_deposit_cannot_open_an_event() {
        let steps = [step(1, (1, 0), 0.5, 0.0), recoil_electron(1), step(1, (3, 2), 2.0, 0.110)];
        let (_, stats) = build_truth_cones(&steps, E0);
        assert_eq!(stats.n_rejected(Rejection::UnknownTopology), 1);
    }

    #[test]
    fn scattered_photon_found_after_descendants() {
        let steps = [step(1, (3, 2), 2.0, 0.110), step(1, (1, 0), 5.0, 0.0), recoil_electron(1)];
        let (cones, _) = build_truth_cones(&steps, E0);
        assert_eq!(cones.len(), 1);
        assert_eq!(cones[0].direction, Vector::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn events_are_separated_and_sorted() {
        let mut steps = tracked_scatter(9);
        steps.extend(tracked_scatter(4));
        steps.reverse();
        let (cones, stats) = build_truth_cones(&steps, E0);
        assert_eq!(cones.iter().map(|c| c.event_id).collect::<Vec<_>>(), vec![4, 9]);
        assert_eq!(stats.n_events, 2);
    }

    #[test]
    fn deep_descendant_chains() {
        const DEPTH: TrackId = 20_000;
        let mut steps = vec![recoil_electron(1)];
        for track in 3..DEPTH {
            steps.push(step(1, (track, track - 1), 1.0 + track as f32 * 1e-4, 0.0));
        }
        steps.push(InteractionStep {
            pre_direction: Vector::new(0.0, 1.0, 0.0),
            ..step(1, (1, 0), 10.0, 0.110)
        });
        let (cones, _) = build_truth_cones(&steps, E0);
        assert_eq!(cones[0].direction, Vector::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn descendant_map() {
        let steps = [
            step(1, (2, 1), 0.0, 0.0),
            step(1, (3, 2), 0.0, 0.0),
            step(1, (4, 3), 0.0, 0.0),
            step(1, (5, 1), 0.0, 0.0),
            step(1, (6, 5), 0.0, 0.0),
        ];
        let refs: Vec<_> = steps.iter().collect();
        assert_eq!(descendants(&refs, 2), HashSet::from([2, 3, 4]));
        assert_eq!(descendants(&refs, 5), HashSet::from([5, 6]));
        assert_eq!(descendants(&refs, 4), HashSet::from([4]));
    }
}
