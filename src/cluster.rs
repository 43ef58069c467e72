//! Grouping of pixel hits into clusters, each representing a single energy
//! deposition spread over neighbouring pixels.
//!
//! A single greedy pass over the time-ordered hits: one cluster is open at any
//! time, and a hit joins it only if it arrives within `window` of the
//! cluster's *first* hit and touches (Chebyshev distance ≤ 1) at least one of
//! its members. Any other hit closes the open cluster and opens a new one.
//! Closed clusters are never reopened, and clusters are never merged.

use std::fmt;

use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::Deserialize;

use units::{ns, Time};

use crate::{Error, Result};
use crate::hits::{PixelCluster, PixelHit};

/// How the members of a closed cluster are summarized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Aggregation {
    /// Energy-weighted centroid of the member pixels
    #[default]
    Centroid,
    /// Pixel of the earliest member
    FirstHit,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterStats {
    pub n_hits: usize,
    pub n_clusters: usize,
    /// Clusters whose members carry no energy, placed at the origin
    pub n_zero_energy: usize,
    pub empty_input: bool,
}

impl fmt::Display for ClusterStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use crate::utils::group_digits as g;
        if self.empty_input { return write!(f, "no pixel hits to cluster") }
        write!(f, "{} hits -> {} clusters", g(self.n_hits), g(self.n_clusters))?;
        if self.n_zero_energy > 0 {
            write!(f, " ({} with zero energy)", g(self.n_zero_energy))?;
        }
        Ok(())
    }
}

/// Group `hits` into clusters.
///
/// The hits need not be sorted or grouped by event. Every hit must lie on a
/// sensor with `pixel_count` pixels per side. Empty input is not an error: it
/// yields no clusters and is flagged in the returned statistics.
pub fn cluster(
    hits: &[PixelHit],
    pixel_count: usize,
    window: Time,
    aggregation: Aggregation,
) -> Result<(Vec<PixelCluster>, ClusterStats)> {
    if hits.is_empty() {
        return Ok((vec![], ClusterStats { empty_input: true, ..Default::default() }))
    }
    if pixel_count == 0 {
        return Err(Error::geometry("sensor has no pixels"))
    }
    if let Some(h) = hits.iter().find(|h| !h.on_sensor(pixel_count)) {
        return Err(Error::geometry(format!(
            "hit in event {} at pixel ({}, {}) lies outside the {pixel_count}×{pixel_count} sensor",
            h.event_id, h.x, h.y)))
    }

    let mut stats = ClusterStats { n_hits: hits.len(), ..Default::default() };
    let clusters: Vec<_> = group_hits(hits, window)
        .iter()
        .map(|members| {
            let (cluster, zero_energy) = aggregate(members, aggregation);
            if zero_energy { stats.n_zero_energy += 1 }
            cluster
        })
        .collect();
    stats.n_clusters = clusters.len();
    Ok((clusters, stats))
}

/// The greedy pass itself: the members of each cluster, in order of closing.
pub(crate) fn group_hits(hits: &[PixelHit], window: Time) -> Vec<Vec<PixelHit>> {
    // Stable: simultaneous hits keep their input order
    let mut sorted = hits.iter().copied().sorted_by_key(|h| OrderedFloat(h.toa));
    let Some(first) = sorted.next() else { return vec![] };

    let mut closed = vec![];
    let mut open = vec![first];
    let mut window_start = ns(first.toa);

    for hit in sorted {
        let in_window = ns(hit.toa) - window_start <= window;
        if in_window && open.iter().any(|member| member.is_adjacent(&hit)) {
            open.push(hit);
        } else {
            closed.push(std::mem::replace(&mut open, vec![hit]));
            window_start = ns(hit.toa);
        }
    }
    closed.push(open);
    closed
}

/// Summarize the (non-empty, time-ordered) members of a cluster. The flag is
/// set when the members carry no energy, in which case a centroid is
/// undefined and is placed at the origin.
fn aggregate(members: &[PixelHit], aggregation: Aggregation) -> (PixelCluster, bool) {
    let earliest = members[0];
    let energy: f32 = members.iter().map(|h| h.energy).sum();
    let event_id = members.iter().map(|h| h.event_id).min().unwrap_or(earliest.event_id);
    let toa = members.iter().map(|h| h.toa).fold(f32::INFINITY, f32::min);
    let n_hits = members.len() as u32;

    let zero_energy = energy == 0.0;
    let (x, y) = match aggregation {
        Aggregation::FirstHit => (earliest.x as f32, earliest.y as f32),
        Aggregation::Centroid if zero_energy => (0.0, 0.0),
        Aggregation::Centroid => {
            let (mut xx, mut yy) = (0.0, 0.0);
            for &PixelHit { x, y, energy: e, .. } in members {
                xx += x as f32 * e;
                yy += y as f32 * e;
            }
            (xx / energy, yy / energy)
        },
    };
    (PixelCluster { event_id, x, y, energy, toa, n_hits }, zero_energy)
}
