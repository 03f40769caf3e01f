//! Grouped place assignment: the shared ranking primitive.
//!
//! Callers hand in (group, score, destination) triples where a higher
//! score is a better result and a negative score marks an ineligible
//! entry. Within each group, ties share a place and the next strictly
//! worse score receives `count of at-or-better entries + 1` (skip
//! ranking, not dense ranking). Members of an invalid group (for
//! example a voided class) rank unplaced regardless of score.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// A competitive place. `0` means unplaced or ineligible.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Place(pub u32);

impl Place {
    pub const NONE: Place = Place(0);

    pub fn is_placed(self) -> bool {
        self.0 > 0
    }
}

/// One ranking input: group id, score (higher is better, negative is
/// ineligible), and an opaque destination index echoed back with the
/// assigned place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankEntry {
    pub group: u64,
    pub score: i64,
    pub dest: usize,
}

/// Assign places to all entries. Returns `(dest, place)` pairs in no
/// particular order.
///
/// Contract:
/// - score < 0 or invalid group => place 0;
/// - equal scores in a group => equal places;
/// - a strictly higher score never gets a worse place;
/// - the entry after a tie block gets `count at-or-better + 1`.
pub fn assign_places(
    entries: &mut [RankEntry],
    is_group_invalid: impl Fn(u64) -> bool,
) -> Vec<(usize, Place)> {
    // Stable sort: best score first within each group.
    entries.sort_by_key(|e| (e.group, Reverse(e.score)));

    let mut out = Vec::with_capacity(entries.len());
    let mut group = None;
    let mut count_seen = 0u32;
    let mut best_place = 0u32;
    let mut last_score = None;
    let mut group_invalid = false;

    for e in entries.iter() {
        if group != Some(e.group) {
            group = Some(e.group);
            count_seen = 0;
            best_place = 0;
            last_score = None;
            group_invalid = is_group_invalid(e.group);
        }
        if group_invalid || e.score < 0 {
            out.push((e.dest, Place::NONE));
            continue;
        }
        count_seen += 1;
        if last_score != Some(e.score) {
            best_place = count_seen;
            last_score = Some(e.score);
        }
        out.push((e.dest, Place(best_place)));
    }
    out
}
