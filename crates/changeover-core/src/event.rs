//! Entity storage with revision-bumping mutation discipline.
//!
//! `EventState` owns all runners, teams, classes, and courses, plus the
//! global [`RevisionClock`]. Every mutating operation bumps the clock
//! and records the new revision on the affected class, so lazily
//! computed results can tell exactly which ranking groups went stale.
//! Read accessors never mutate; missing references degrade to `None`
//! instead of aborting a computation.
//!
//! Computed (`Versioned`) fields are not entity data: the engines write
//! them through the `*_computed_mut` accessors, which deliberately do
//! not bump the clock.

use crate::class::{Class, LegSpec, TopologyError};
use crate::course::Course;
use crate::id::{ClassId, CourseId, RunnerId, TeamId};
use crate::punch::Punch;
use crate::revision::{Revision, RevisionClock};
use crate::runner::{Runner, RunnerComputed};
use crate::status::RunStatus;
use crate::team::{Team, TeamComputed};
use crate::time::TimeSecs;
use slotmap::SlotMap;

/// The single shared mutable resource: the entity set plus the
/// revision counter.
#[derive(Debug, Default)]
pub struct EventState {
    clock: RevisionClock,
    runners: SlotMap<RunnerId, Runner>,
    teams: SlotMap<TeamId, Team>,
    classes: SlotMap<ClassId, Class>,
    courses: SlotMap<CourseId, Course>,
}

impl EventState {
    pub fn new() -> Self {
        Self {
            clock: RevisionClock::new(),
            runners: SlotMap::with_key(),
            teams: SlotMap::with_key(),
            classes: SlotMap::with_key(),
            courses: SlotMap::with_key(),
        }
    }

    /// Current global revision.
    pub fn revision(&self) -> Revision {
        self.clock.current()
    }

    /// Revision of the most recent mutation inside a class. Computed
    /// fields of the class's members are fresh iff stamped at or after
    /// this. An unknown class reads as up to date (nothing to recompute).
    pub fn class_data_revision(&self, class: ClassId) -> Revision {
        self.classes
            .get(class)
            .map_or(Revision::NONE, |c| c.data_revision())
    }

    fn touch_class(&mut self, class: Option<ClassId>) {
        let rev = self.clock.bump();
        if let Some(class) = class.and_then(|c| self.classes.get_mut(c)) {
            class.data_revision = rev;
        }
    }

    // -----------------------------------------------------------------------
    // Classes
    // -----------------------------------------------------------------------

    pub fn add_class(&mut self, mut class: Class) -> ClassId {
        class.data_revision = self.clock.bump();
        self.classes.insert(class)
    }

    pub fn class(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(id)
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &Class)> {
        self.classes.iter()
    }

    /// Apply a new leg topology. Validation runs on every apply; on
    /// success, every member team's slot arrays are resized to match.
    pub fn set_class_legs(&mut self, id: ClassId, legs: Vec<LegSpec>) -> Result<(), TopologyError> {
        let n_legs = legs.len();
        match self.classes.get_mut(id) {
            Some(class) => class.set_legs(legs)?,
            None => return Ok(()),
        }
        for (_, team) in self.teams.iter_mut() {
            if team.class == Some(id) {
                team.resize_legs(n_legs);
            }
        }
        self.touch_class(Some(id));
        Ok(())
    }

    pub fn set_class_invalid(&mut self, id: ClassId, invalid: bool) {
        if let Some(class) = self.classes.get_mut(id) {
            class.invalid = invalid;
            self.touch_class(Some(id));
        }
    }

    pub fn set_class_result_module(&mut self, id: ClassId, tag: Option<String>) {
        if let Some(class) = self.classes.get_mut(id) {
            class.result_module = tag;
            self.touch_class(Some(id));
        }
    }

    // -----------------------------------------------------------------------
    // Courses
    // -----------------------------------------------------------------------

    pub fn add_course(&mut self, course: Course) -> CourseId {
        self.clock.bump();
        self.courses.insert(course)
    }

    pub fn course(&self, id: CourseId) -> Option<&Course> {
        self.courses.get(id)
    }

    // -----------------------------------------------------------------------
    // Runners
    // -----------------------------------------------------------------------

    pub fn add_runner(&mut self, runner: Runner) -> RunnerId {
        let class = runner.class;
        let id = self.runners.insert(runner);
        self.touch_class(class);
        id
    }

    pub fn runner(&self, id: RunnerId) -> Option<&Runner> {
        self.runners.get(id)
    }

    pub fn runners(&self) -> impl Iterator<Item = (RunnerId, &Runner)> {
        self.runners.iter()
    }

    /// Members of a class, in stable storage order.
    pub fn class_runners(&self, class: ClassId) -> Vec<RunnerId> {
        self.runners
            .iter()
            .filter(|(_, r)| r.class == Some(class))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn set_runner_start(&mut self, id: RunnerId, start: TimeSecs) {
        if let Some(r) = self.runners.get_mut(id) {
            r.start_time = start;
            let class = r.class;
            self.touch_class(class);
        }
    }

    pub fn set_runner_finish(&mut self, id: RunnerId, finish: TimeSecs) {
        if let Some(r) = self.runners.get_mut(id) {
            r.finish_time = finish;
            let class = r.class;
            self.touch_class(class);
        }
    }

    pub fn set_runner_status(&mut self, id: RunnerId, status: RunStatus) {
        if let Some(r) = self.runners.get_mut(id) {
            r.status = status;
            let class = r.class;
            self.touch_class(class);
        }
    }

    pub fn set_runner_course(&mut self, id: RunnerId, course: Option<CourseId>) {
        if let Some(r) = self.runners.get_mut(id) {
            r.course = course;
            let class = r.class;
            self.touch_class(class);
        }
    }

    pub fn set_runner_points(&mut self, id: RunnerId, points: i32) {
        if let Some(r) = self.runners.get_mut(id) {
            r.points = points;
            let class = r.class;
            self.touch_class(class);
        }
    }

    /// Carry-in from earlier stages of a multi-stage event.
    pub fn set_runner_input(
        &mut self,
        id: RunnerId,
        time: TimeSecs,
        status: RunStatus,
        points: i32,
    ) {
        if let Some(r) = self.runners.get_mut(id) {
            r.input_time = time;
            r.input_status = status;
            r.input_points = points;
            let class = r.class;
            self.touch_class(class);
        }
    }

    /// Register an incoming punch on a runner's card.
    pub fn add_punch(&mut self, id: RunnerId, punch: Punch) {
        if let Some(r) = self.runners.get_mut(id) {
            r.punches.push(punch);
            let class = r.class;
            self.touch_class(class);
        }
    }

    /// Remove a runner, clearing the team slot it occupied.
    pub fn remove_runner(&mut self, id: RunnerId) {
        if let Some(runner) = self.runners.remove(id) {
            if let Some(team) = runner.team.and_then(|t| self.teams.get_mut(t))
                && let Some(slot) = team.runners.get_mut(runner.leg)
                && *slot == Some(id)
            {
                *slot = None;
            }
            self.touch_class(runner.class);
        }
    }

    /// Mutable access to a runner's computed fields. Does not bump the
    /// revision: computed fields are outputs, not entity mutations.
    pub fn runner_computed_mut(&mut self, id: RunnerId) -> Option<&mut RunnerComputed> {
        self.runners.get_mut(id).map(|r| &mut r.computed)
    }

    // -----------------------------------------------------------------------
    // Teams
    // -----------------------------------------------------------------------

    /// Insert a team. Its slot arrays are resized to the class leg count.
    pub fn add_team(&mut self, mut team: Team) -> TeamId {
        if let Some(n_legs) = team.class.and_then(|c| self.classes.get(c)).map(Class::n_legs) {
            team.resize_legs(n_legs);
        }
        let class = team.class;
        let id = self.teams.insert(team);
        self.touch_class(class);
        id
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.get(id)
    }

    pub fn teams(&self) -> impl Iterator<Item = (TeamId, &Team)> {
        self.teams.iter()
    }

    pub fn class_teams(&self, class: ClassId) -> Vec<TeamId> {
        self.teams
            .iter()
            .filter(|(_, t)| t.class == Some(class))
            .map(|(id, _)| id)
            .collect()
    }

    /// Assign (or clear) the runner filling a team leg, keeping the
    /// runner's back-reference and leg index in sync.
    pub fn set_team_member(&mut self, team_id: TeamId, leg: usize, runner: Option<RunnerId>) {
        let Some(team) = self.teams.get_mut(team_id) else {
            return;
        };
        if leg >= team.runners.len() {
            return;
        }
        let class = team.class;
        if let Some(old) = team.runners[leg]
            && let Some(r) = self.runners.get_mut(old)
        {
            r.team = None;
        }
        team.runners[leg] = runner;
        if let Some(new) = runner
            && let Some(r) = self.runners.get_mut(new)
        {
            r.team = Some(team_id);
            r.leg = leg;
        }
        self.touch_class(class);
    }

    pub fn set_team_start(&mut self, id: TeamId, start: TimeSecs) {
        if let Some(t) = self.teams.get_mut(id) {
            t.start_time = start;
            let class = t.class;
            self.touch_class(class);
        }
    }

    pub fn set_team_status_override(&mut self, id: TeamId, status: Option<RunStatus>) {
        if let Some(t) = self.teams.get_mut(id) {
            t.status_override = status;
            let class = t.class;
            self.touch_class(class);
        }
    }

    /// Store an externally computed `Group` leg time (result modules).
    pub fn set_team_group_time(&mut self, id: TeamId, leg: usize, time: Option<TimeSecs>) {
        if let Some(t) = self.teams.get_mut(id) {
            if leg < t.group_times.len() {
                t.group_times[leg] = time;
            }
            let class = t.class;
            self.touch_class(class);
        }
    }

    /// Remove a team, clearing its members' back-references.
    pub fn remove_team(&mut self, id: TeamId) {
        if let Some(team) = self.teams.remove(id) {
            for &member in team.runners.iter().flatten() {
                if let Some(r) = self.runners.get_mut(member) {
                    r.team = None;
                }
            }
            self.touch_class(team.class);
        }
    }

    /// Mutable access to a team's computed fields. Does not bump the
    /// revision.
    pub fn team_computed_mut(&mut self, id: TeamId) -> Option<&mut TeamComputed> {
        self.teams.get_mut(id).map(|t| &mut t.computed)
    }
}
