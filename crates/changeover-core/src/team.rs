//! Relay teams and the per-leg computed result cache.

use crate::id::{ClassId, ClubId, RunnerId};
use crate::rank::Place;
use crate::revision::Versioned;
use crate::status::RunStatus;
use crate::time::{NO_TIME, TimeSecs};
use serde::{Deserialize, Serialize};

/// One leg's settled result within a team: the authoritative cross-leg
/// cache. `time` is the team's cumulative time through this leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedLegResult {
    pub status: RunStatus,
    pub start_time: TimeSecs,
    pub time: TimeSecs,
}

/// The full sweep output for a team, stamped as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLegResults {
    pub legs: Vec<ComputedLegResult>,
    /// Number of legs started from the restart (rope) time.
    pub restarts: u32,
}

impl TeamLegResults {
    /// The team's final cumulative time, or `NO_TIME` with no legs.
    pub fn total_time(&self) -> TimeSecs {
        self.legs.last().map_or(NO_TIME, |l| l.time)
    }

    /// The team's final status.
    pub fn total_status(&self) -> RunStatus {
        self.legs.last().map_or(RunStatus::Unknown, |l| l.status)
    }
}

/// A relay team: one runner slot per leg of its class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub class: Option<ClassId>,
    pub club: Option<ClubId>,
    /// One entry per leg; `None` for unfilled/optional legs. Invariant:
    /// length equals the class's leg count (`EventState` maintains it).
    pub runners: Vec<Option<RunnerId>>,
    /// Team base start time (mass start), used when leg 0 has no
    /// runner-level start.
    pub start_time: TimeSecs,
    /// Manually set team status; applied to the final leg, always
    /// overriding the cascade.
    pub status_override: Option<RunStatus>,
    /// Externally computed per-leg times for `Group` legs, supplied by
    /// result modules. One entry per leg.
    pub group_times: Vec<Option<TimeSecs>>,
    #[serde(default)]
    pub computed: TeamComputed,
}

impl Team {
    pub fn new(name: impl Into<String>, n_legs: usize) -> Self {
        Self {
            name: name.into(),
            class: None,
            club: None,
            runners: vec![None; n_legs],
            start_time: NO_TIME,
            status_override: None,
            group_times: vec![None; n_legs],
            computed: TeamComputed::default(),
        }
    }

    /// Resize the runner and group-time arrays to a new leg count,
    /// keeping existing assignments where they still fit.
    pub fn resize_legs(&mut self, n_legs: usize) {
        self.runners.resize(n_legs, None);
        self.group_times.resize(n_legs, None);
    }
}

/// Computed, revision-stamped result fields of a team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamComputed {
    pub legs: Versioned<TeamLegResults>,
    pub place_class: Versioned<Place>,
    pub place_total: Versioned<Place>,
}
