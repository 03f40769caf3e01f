//! Split-time standings: per-control placements for the runners of one
//! class leg, reconstructed from punched cards.
//!
//! Cards are matched against the runner's course in sequence order, so
//! a course visiting the same control twice attributes each punch to
//! the right visit. Standings carry one row per reached course position
//! plus a synthetic finish row, each ranked with the shared tie rules
//! (equal times share a place, the next strictly slower time skips).
//!
//! The engine caches one standings table per (class, leg), stamped with
//! the revision it was computed at; a table is rebuilt only when its
//! class's data revision has moved past the stamp.

use crate::event::EventState;
use crate::id::{ClassId, ControlId, RunnerId};
use crate::punch::{finish_punch_time, start_punch_time};
use crate::rank::Place;
use crate::revision::Versioned;
use crate::runner::Runner;
use crate::time::{NO_TIME, TimeSecs, elapsed};
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Reconstruction
// ---------------------------------------------------------------------------

/// One reached control on a runner's course: course position, control
/// code, and elapsed time from the effective start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitTime {
    pub index: usize,
    pub control: ControlId,
    pub time: TimeSecs,
}

fn effective_start(state: &EventState, runner: &Runner) -> TimeSecs {
    let free_start = runner
        .class
        .and_then(|c| state.class(c))
        .is_some_and(|c| c.free_start);
    if free_start {
        let punched = start_punch_time(&runner.punches);
        if punched > NO_TIME {
            return punched;
        }
    }
    runner.start_time
}

/// Reconstruct a runner's split times by matching the card against the
/// course in order. Each punch is consumed at most once; an unreached
/// control simply yields no entry, later controls can still match.
pub fn runner_split_times(state: &EventState, id: RunnerId) -> Vec<SplitTime> {
    let Some(runner) = state.runner(id) else {
        return Vec::new();
    };
    let Some(course) = runner.course.and_then(|c| state.course(c)) else {
        return Vec::new();
    };
    let start = effective_start(state, runner);
    let mut out = Vec::new();
    let mut cursor = 0usize;
    for (index, &control) in course.controls.iter().enumerate() {
        // Timing pseudo punches never satisfy a course control, even
        // when a legacy course reuses one of the low codes.
        let matched = runner.punches[cursor..]
            .iter()
            .position(|p| !p.is_pseudo() && p.control == control && p.time > NO_TIME);
        if let Some(offset) = matched {
            let punch = runner.punches[cursor + offset];
            cursor += offset + 1;
            out.push(SplitTime {
                index,
                control,
                time: elapsed(start, punch.time),
            });
        }
    }
    out
}

/// A live-standing key for a runner still on course: a later relay leg
/// always beats any progress on an earlier one, further along the
/// course beats any time at an earlier control, and at the same
/// position a lower elapsed time is better. Ordered so the maximum is
/// the best standing; punching another control never decreases the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveKey {
    pub leg: usize,
    pub reached: usize,
    pub time: TimeSecs,
}

impl Ord for LiveKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.leg
            .cmp(&other.leg)
            .then(self.reached.cmp(&other.reached))
            .then(other.time.cmp(&self.time))
    }
}

impl PartialOrd for LiveKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Current live key for a runner: leg index, reached control count, and
/// elapsed time at the last reached control.
pub fn live_key(state: &EventState, id: RunnerId) -> LiveKey {
    let splits = runner_split_times(state, id);
    LiveKey {
        leg: state.runner(id).map_or(0, |r| r.leg),
        reached: splits.len(),
        time: splits.last().map_or(NO_TIME, |s| s.time),
    }
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

/// Where a standings row sits on the course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SplitPoint {
    /// A course control at a given position (forked courses can put
    /// different controls at the same position).
    Control { index: usize, control: ControlId },
    /// The synthetic finish row.
    Finish,
}

/// One runner's entry in a standings row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlacement {
    pub runner: RunnerId,
    pub time: TimeSecs,
    pub place: Place,
    /// Gap to the row leader.
    pub behind: TimeSecs,
}

/// A ranked standings row at one split point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlStandings {
    pub point: SplitPoint,
    /// Sorted best first.
    pub results: Vec<SplitPlacement>,
}

/// The full standings table for one class leg.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegSplits {
    pub rows: Vec<ControlStandings>,
}

impl LegSplits {
    pub fn row(&self, point: SplitPoint) -> Option<&ControlStandings> {
        self.rows.iter().find(|r| r.point == point)
    }
}

fn rank_row(point: SplitPoint, mut times: Vec<(RunnerId, TimeSecs)>) -> ControlStandings {
    times.sort_by_key(|(_, t)| *t);
    let leader = times.first().map_or(NO_TIME, |(_, t)| *t);
    let mut results = Vec::with_capacity(times.len());
    let mut place = 0u32;
    let mut last_time = None;
    for (i, (runner, time)) in times.iter().enumerate() {
        if last_time != Some(*time) {
            place = i as u32 + 1;
            last_time = Some(*time);
        }
        results.push(SplitPlacement {
            runner: *runner,
            time: *time,
            place: Place(place),
            behind: *time - leader,
        });
    }
    ControlStandings { point, results }
}

fn compute_leg_splits(state: &EventState, class_id: ClassId, leg: usize) -> LegSplits {
    let mut rows: BTreeMap<(usize, ControlId), Vec<(RunnerId, TimeSecs)>> = BTreeMap::new();
    let mut finish: Vec<(RunnerId, TimeSecs)> = Vec::new();
    for id in state.class_runners(class_id) {
        let Some(runner) = state.runner(id) else {
            continue;
        };
        if runner.leg != leg {
            continue;
        }
        for split in runner_split_times(state, id) {
            rows.entry((split.index, split.control))
                .or_default()
                .push((id, split.time));
        }
        // A radio finish punch counts until the manual finish time lands.
        let finish_at = if runner.has_finished() {
            runner.finish_time
        } else {
            finish_punch_time(&runner.punches)
        };
        if finish_at > NO_TIME {
            let time = elapsed(effective_start(state, runner), finish_at);
            if time > NO_TIME {
                finish.push((id, time));
            }
        }
    }
    let mut out = LegSplits {
        rows: rows
            .into_iter()
            .map(|((index, control), times)| {
                rank_row(SplitPoint::Control { index, control }, times)
            })
            .collect(),
    };
    out.rows.push(rank_row(SplitPoint::Finish, finish));
    out
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Revision-cached split standings, one table per (class, leg).
#[derive(Debug, Default)]
pub struct SplitResultEngine {
    cache: HashMap<(ClassId, usize), Versioned<LegSplits>>,
}

impl SplitResultEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standings table for a class leg, rebuilt only if the class
    /// has been mutated since the cached table was computed.
    pub fn leg_splits(&mut self, state: &EventState, class: ClassId, leg: usize) -> &LegSplits {
        let required = state.class_data_revision(class);
        let entry = self
            .cache
            .entry((class, leg))
            .or_insert_with(|| Versioned::new(LegSplits::default()));
        if entry.is_stale(required) {
            log::debug!("rebuilding split standings for class {class:?} leg {leg}");
            entry.set(compute_leg_splits(state, class, leg), state.revision());
        }
        entry.value_unchecked()
    }

    /// One standings row, if any runner has reached that point.
    pub fn row(
        &mut self,
        state: &EventState,
        class: ClassId,
        leg: usize,
        point: SplitPoint,
    ) -> Option<&ControlStandings> {
        self.leg_splits(state, class, leg).row(point)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
