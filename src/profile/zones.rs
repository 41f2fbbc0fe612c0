//! HVN/LVN zone extraction
//!
//! Picks the highest/lowest-volume bins of a profile and merges near-adjacent
//! picks into contiguous price zones scored by their combined volume.

use serde::{Deserialize, Serialize};

use super::builder::VolumeProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    Hvn,
    Lvn,
}

/// Contiguous price interval used as a decision region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub low: f64,
    pub high: f64,
    /// Sum of member bin volumes
    pub score: f64,
}

/// Extract `(hvn, lvn)` zones from a profile.
///
/// The top `hvn_top_bins` bins by volume seed the HVN zones, the bottom
/// `lvn_bottom_bins` the LVN zones. Selected bins merge into one zone while
/// the gap between consecutive picks is at most `merge_gap_bins` bins; each
/// zone spans from its first bin's low edge to its last bin's high edge.
/// Both lists come back sorted by descending score.
pub fn extract_zones(
    profile: &VolumeProfile,
    hvn_top_bins: usize,
    lvn_bottom_bins: usize,
    merge_gap_bins: i64,
) -> (Vec<Zone>, Vec<Zone>) {
    if profile.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut by_volume: Vec<(i64, f64)> = profile.indexed_bins().collect();
    // Stable sort keeps ascending price order among equal volumes
    by_volume.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let hvn_bins: Vec<(i64, f64)> = by_volume.iter().take(hvn_top_bins).copied().collect();

    let mut by_volume_asc: Vec<(i64, f64)> = profile.indexed_bins().collect();
    by_volume_asc.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let lvn_bins: Vec<(i64, f64)> = by_volume_asc.iter().take(lvn_bottom_bins).copied().collect();

    let mut hvn = merge_bins_to_zones(profile, hvn_bins, merge_gap_bins, ZoneKind::Hvn);
    let mut lvn = merge_bins_to_zones(profile, lvn_bins, merge_gap_bins, ZoneKind::Lvn);

    hvn.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    lvn.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    (hvn, lvn)
}

fn merge_bins_to_zones(
    profile: &VolumeProfile,
    mut picks: Vec<(i64, f64)>,
    merge_gap_bins: i64,
    kind: ZoneKind,
) -> Vec<Zone> {
    if picks.is_empty() {
        return Vec::new();
    }
    picks.sort_by_key(|(idx, _)| *idx);

    let bin_size = profile.bin_size();
    let mut zones = Vec::new();

    let (mut cur_low, mut cur_score) = (picks[0].0, picks[0].1);
    let mut cur_high = cur_low;

    for &(idx, vol) in &picks[1..] {
        if idx <= cur_high + merge_gap_bins {
            cur_high = idx;
            cur_score += vol;
        } else {
            zones.push(Zone {
                kind,
                low: profile.price_of_index(cur_low),
                high: profile.price_of_index(cur_high) + bin_size,
                score: cur_score,
            });
            cur_low = idx;
            cur_high = idx;
            cur_score = vol;
        }
    }
    zones.push(Zone {
        kind,
        low: profile.price_of_index(cur_low),
        high: profile.price_of_index(cur_high) + bin_size,
        score: cur_score,
    });
    zones
}
