//! Runner entities and their versioned computed fields.

use crate::id::{CardNumber, ClassId, ClubId, CourseId, RunnerId, TeamId};
use crate::punch::Punch;
use crate::rank::Place;
use crate::revision::Versioned;
use crate::status::RunStatus;
use crate::time::{NO_TIME, TimeSecs, elapsed};
use serde::{Deserialize, Serialize};

/// An individual competitor: one person running one leg (or an
/// individual race, which is a single-leg class).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    pub name: String,
    pub class: Option<ClassId>,
    pub club: Option<ClubId>,
    pub course: Option<CourseId>,
    pub card: Option<CardNumber>,
    /// Owning team, when this runner fills a relay leg.
    pub team: Option<TeamId>,
    /// Leg index within the team/class.
    pub leg: usize,
    /// Duplicate discriminator: runners on the same leg position rank
    /// against each other, not against other legs.
    pub leg_dup: u32,
    pub start_time: TimeSecs,
    pub finish_time: TimeSecs,
    pub status: RunStatus,
    /// Rogaining points collected on the course.
    pub points: i32,
    /// Ordered punch list read from the card.
    pub punches: Vec<Punch>,
    /// Carry-in from earlier stages of a multi-stage event.
    pub input_time: TimeSecs,
    pub input_status: RunStatus,
    pub input_points: i32,
    #[serde(default)]
    pub computed: RunnerComputed,
}

impl Runner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: None,
            club: None,
            course: None,
            card: None,
            team: None,
            leg: 0,
            leg_dup: 0,
            start_time: NO_TIME,
            finish_time: NO_TIME,
            status: RunStatus::Unknown,
            points: 0,
            punches: Vec::new(),
            input_time: NO_TIME,
            input_status: RunStatus::Ok,
            input_points: 0,
            computed: RunnerComputed::default(),
        }
    }

    /// Raw running time from the runner's own recorded start and finish.
    pub fn running_time(&self) -> TimeSecs {
        elapsed(self.start_time, self.finish_time)
    }

    /// Whether a finish has been recorded (time or punch).
    pub fn has_finished(&self) -> bool {
        self.finish_time > NO_TIME
    }
}

/// Computed, revision-stamped result fields of a runner. Populated
/// lazily by the result engine; never mutated by entity edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerComputed {
    pub time: Versioned<TimeSecs>,
    pub status: Versioned<RunStatus>,
    pub points: Versioned<i32>,
    pub place_class: Versioned<Place>,
    pub place_total: Versioned<Place>,
    pub place_course: Versioned<Place>,
    pub place_class_course: Versioned<Place>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_time_from_own_times() {
        let mut r = Runner::new("A");
        r.start_time = 600;
        r.finish_time = 2100;
        assert_eq!(r.running_time(), 1500);
    }

    #[test]
    fn running_time_missing_finish() {
        let mut r = Runner::new("A");
        r.start_time = 600;
        assert_eq!(r.running_time(), NO_TIME);
        assert!(!r.has_finished());
    }

    #[test]
    fn input_status_defaults_ok() {
        // A first-stage runner has nothing to carry in, which counts as OK.
        assert_eq!(Runner::new("A").input_status, RunStatus::Ok);
    }
}
