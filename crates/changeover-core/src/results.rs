//! The lazy result engine: scoring, ranking, and revision-checked
//! caching for individual and team results.
//!
//! Reads go through the engine: each accessor checks the requested
//! computed field against the owning ranking group's data revision and
//! triggers a recompute of the whole group only when stale. A recompute
//! either runs the built-in formula or is routed to an externally
//! registered [`ResultModule`] when the class carries a module tag.
//! The `*Default` result categories always use the built-in formula,
//! giving modules a non-reentrant way to obtain the standard
//! computation as their starting point.

use crate::class::Class;
use crate::event::EventState;
use crate::id::{ClassId, CourseId, RunnerId, TeamId};
use crate::module::{ModuleError, ResultContext, ResultModule, ResultModuleRegistry};
use crate::punch::start_punch_time;
use crate::rank::{Place, RankEntry, assign_places};
use crate::revision::Revision;
use crate::runner::Runner;
use crate::status::RunStatus;
use crate::team::TeamLegResults;
use crate::time::{NO_TIME, RANK_BASE, TimeSecs, WEEK_SECS, elapsed};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

// ---------------------------------------------------------------------------
// Result categories
// ---------------------------------------------------------------------------

/// Which ranking a place is requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    /// Within the class, this stage only.
    Class,
    /// Within the class, carry-in from earlier stages included.
    Total,
    /// Among everyone running the same course, across classes.
    Course,
    /// Among same-course runners within the class.
    ClassCourse,
    /// Like `Class`, but always the built-in formula, never a module.
    ClassDefault,
    /// Like `Total`, but always the built-in formula, never a module.
    TotalDefault,
}

impl ResultType {
    /// Categories that bypass result modules unconditionally.
    pub fn is_default(self) -> bool {
        matches!(self, ResultType::ClassDefault | ResultType::TotalDefault)
    }

    /// Whether carry-in from earlier stages participates.
    fn is_total(self) -> bool {
        matches!(self, ResultType::Total | ResultType::TotalDefault)
    }

    /// Course-scoped categories rank across classes, so their freshness
    /// is checked against the global revision.
    fn is_course_scoped(self) -> bool {
        matches!(self, ResultType::Course | ResultType::ClassCourse)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from result computation. An unknown module tag is fatal: the
/// class explicitly asks for a formula that is not registered, and a
/// silent fallback would publish wrong results.
#[derive(Debug, thiserror::Error)]
pub enum ResultError {
    #[error("no result module registered for tag `{0}`")]
    UnknownModule(String),
    #[error(transparent)]
    Module(#[from] ModuleError),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns the module registry and serves revision-checked result reads.
#[derive(Debug, Default)]
pub struct ResultEngine {
    registry: ResultModuleRegistry,
    in_progress: bool,
}

impl ResultEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_module(&mut self, module: Box<dyn ResultModule>) {
        self.registry.register(module);
    }

    /// A runner's place in the requested category, recomputing the
    /// ranking group if stale. Unknown runners read as unplaced.
    pub fn runner_place(
        &mut self,
        state: &mut EventState,
        id: RunnerId,
        result_type: ResultType,
    ) -> Result<Place, ResultError> {
        let Some(runner) = state.runner(id) else {
            return Ok(Place::NONE);
        };
        let class = runner.class;
        let required = required_revision(state, class, result_type);
        if let Some(place) = runner_place_field(runner, result_type).get(required) {
            return Ok(*place);
        }
        self.compute(state, class, result_type)?;
        Ok(state
            .runner(id)
            .map_or(Place::NONE, |r| {
                *runner_place_field(r, result_type).value_unchecked()
            }))
    }

    /// A runner's computed running time. Class-scoped freshness.
    pub fn runner_time(
        &mut self,
        state: &mut EventState,
        id: RunnerId,
    ) -> Result<TimeSecs, ResultError> {
        let Some(runner) = state.runner(id) else {
            return Ok(NO_TIME);
        };
        let class = runner.class;
        let required = required_revision(state, class, ResultType::Class);
        if let Some(time) = runner.computed.time.get(required) {
            return Ok(*time);
        }
        self.compute(state, class, ResultType::Class)?;
        Ok(state
            .runner(id)
            .map_or(NO_TIME, |r| *r.computed.time.value_unchecked()))
    }

    /// A runner's computed status.
    pub fn runner_status(
        &mut self,
        state: &mut EventState,
        id: RunnerId,
    ) -> Result<RunStatus, ResultError> {
        let Some(runner) = state.runner(id) else {
            return Ok(RunStatus::Unknown);
        };
        let class = runner.class;
        let required = required_revision(state, class, ResultType::Class);
        if let Some(status) = runner.computed.status.get(required) {
            return Ok(*status);
        }
        self.compute(state, class, ResultType::Class)?;
        Ok(state
            .runner(id)
            .map_or(RunStatus::Unknown, |r| *r.computed.status.value_unchecked()))
    }

    /// A runner's computed rogaining points.
    pub fn runner_points(
        &mut self,
        state: &mut EventState,
        id: RunnerId,
    ) -> Result<i32, ResultError> {
        let Some(runner) = state.runner(id) else {
            return Ok(0);
        };
        let class = runner.class;
        let required = required_revision(state, class, ResultType::Class);
        if let Some(points) = runner.computed.points.get(required) {
            return Ok(*points);
        }
        self.compute(state, class, ResultType::Class)?;
        Ok(state
            .runner(id)
            .map_or(0, |r| *r.computed.points.value_unchecked()))
    }

    /// A team's place in the requested category. Course categories do
    /// not apply to teams and read as unplaced.
    pub fn team_place(
        &mut self,
        state: &mut EventState,
        id: TeamId,
        result_type: ResultType,
    ) -> Result<Place, ResultError> {
        if result_type.is_course_scoped() {
            return Ok(Place::NONE);
        }
        let Some(team) = state.team(id) else {
            return Ok(Place::NONE);
        };
        let class = team.class;
        let total = result_type.is_total();
        let required = required_revision(state, class, result_type);
        let field = if total {
            &team.computed.place_total
        } else {
            &team.computed.place_class
        };
        if let Some(place) = field.get(required) {
            return Ok(*place);
        }
        self.compute(state, class, result_type)?;
        Ok(state.team(id).map_or(Place::NONE, |t| {
            if total {
                *t.computed.place_total.value_unchecked()
            } else {
                *t.computed.place_class.value_unchecked()
            }
        }))
    }

    /// A team's full per-leg results, recomputed if stale.
    pub fn team_results(
        &mut self,
        state: &mut EventState,
        id: TeamId,
    ) -> Result<TeamLegResults, ResultError> {
        let Some(team) = state.team(id) else {
            return Ok(TeamLegResults::default());
        };
        let class = team.class;
        let required = required_revision(state, class, ResultType::Class);
        if let Some(legs) = team.computed.legs.get(required) {
            return Ok(legs.clone());
        }
        self.compute(state, class, ResultType::Class)?;
        Ok(state
            .team(id)
            .map_or_else(TeamLegResults::default, |t| {
                t.computed.legs.value_unchecked().clone()
            }))
    }

    /// Recompute one ranking group for the given category.
    fn compute(
        &mut self,
        state: &mut EventState,
        class: Option<ClassId>,
        result_type: ResultType,
    ) -> Result<(), ResultError> {
        if result_type.is_course_scoped() {
            compute_course_places(state, result_type);
            return Ok(());
        }
        let Some(class_id) = class else {
            return Ok(());
        };
        if result_type.is_default() {
            compute_class_default(state, class_id, result_type);
            return Ok(());
        }
        let tag = state.class(class_id).and_then(|c| c.result_module.clone());
        let Some(tag) = tag else {
            compute_class_default(state, class_id, result_type);
            return Ok(());
        };

        // Module-routed computation must not re-enter itself; modules
        // wanting the standard results use the *Default categories.
        assert!(
            !self.in_progress,
            "module-routed result computation re-entered (class tag `{tag}`)"
        );
        self.in_progress = true;
        let ctx = ResultContext {
            result_type,
            revision: state.revision(),
        };
        let runners = state.class_runners(class_id);
        let teams = state.class_teams(class_id);
        let outcome = match self.registry.get(&tag) {
            None => Err(ResultError::UnknownModule(tag.clone())),
            Some(module) => {
                log::debug!("routing class results to module `{tag}`");
                module
                    .individual_results(state, class_id, &runners, &ctx)
                    .and_then(|()| module.team_results(state, class_id, &teams, &ctx))
                    .map_err(ResultError::from)
            }
        };
        self.in_progress = false;
        outcome
    }
}

fn runner_place_field(runner: &Runner, result_type: ResultType) -> &crate::revision::Versioned<Place> {
    match result_type {
        ResultType::Class | ResultType::ClassDefault => &runner.computed.place_class,
        ResultType::Total | ResultType::TotalDefault => &runner.computed.place_total,
        ResultType::Course => &runner.computed.place_course,
        ResultType::ClassCourse => &runner.computed.place_class_course,
    }
}

fn required_revision(
    state: &EventState,
    class: Option<ClassId>,
    result_type: ResultType,
) -> Revision {
    if result_type.is_course_scoped() {
        state.revision()
    } else {
        class.map_or(Revision::NONE, |c| state.class_data_revision(c))
    }
}

// ---------------------------------------------------------------------------
// Built-in formula
// ---------------------------------------------------------------------------

/// Running time for one runner, honoring free starts.
fn class_time(class: Option<&Class>, runner: &Runner) -> TimeSecs {
    let mut start = runner.start_time;
    if class.is_some_and(|c| c.free_start) {
        let punched = start_punch_time(&runner.punches);
        if punched > NO_TIME {
            start = punched;
        }
    }
    elapsed(start, runner.finish_time)
}

fn eligible(class: &Class, status: RunStatus, finished: bool) -> bool {
    status.is_ok() || (class.allow_preliminary && status == RunStatus::Unknown && finished)
}

/// Ranking score: higher is better, negative is ineligible.
///
/// Rogaining ranks by points first, time second; `WEEK_SECS` dominates
/// any in-bounds running time, so one extra point always beats any time
/// difference. Otherwise the score is time subtracted from a constant
/// large enough that any valid time stays positive.
fn score(class: &Class, eligible: bool, points: i32, time: TimeSecs) -> i64 {
    if !eligible || time <= NO_TIME {
        return -1;
    }
    if class.rogaining {
        i64::from(WEEK_SECS) * (i64::from(points) + 1) - i64::from(time)
    } else {
        RANK_BASE - i64::from(time)
    }
}

/// Interns arbitrary group keys to the dense ids the ranking primitive
/// expects. Ids are meaningless outside one ranking pass.
#[derive(Debug, Default)]
struct GroupInterner<K> {
    map: HashMap<K, u64>,
}

impl<K: Eq + Hash> GroupInterner<K> {
    fn intern(&mut self, key: K) -> u64 {
        let next = self.map.len() as u64;
        *self.map.entry(key).or_insert(next)
    }
}

/// Built-in results for one class: times, statuses, points, team leg
/// sweeps, and places, all stamped at the current revision.
///
/// Public so result modules can obtain the standard computation without
/// going back through the engine.
pub fn compute_class_default(
    state: &mut EventState,
    class_id: ClassId,
    result_type: ResultType,
) {
    let revision = state.revision();
    let Some(class) = state.class(class_id).cloned() else {
        return;
    };
    let total = result_type.is_total();
    log::debug!(
        "recomputing {} results for class `{}` at revision {:?}",
        if total { "total" } else { "stage" },
        class.name,
        revision
    );

    // ---- individuals ----
    struct Row {
        id: RunnerId,
        time: TimeSecs,
        status: RunStatus,
        points: i32,
    }
    let members = state.class_runners(class_id);
    let mut rows = Vec::with_capacity(members.len());
    let mut entries = Vec::with_capacity(members.len());
    let mut groups: GroupInterner<(usize, u32)> = GroupInterner::default();
    for &id in &members {
        let Some(runner) = state.runner(id) else {
            continue;
        };
        let time = class_time(Some(&class), runner);
        let ok = eligible(&class, runner.status, runner.has_finished());
        let (score_time, score_points, score_ok) = if total {
            (
                runner.input_time.max(NO_TIME) + time,
                runner.points + runner.input_points,
                ok && runner.input_status.is_ok(),
            )
        } else {
            (time, runner.points, ok)
        };
        entries.push(RankEntry {
            group: groups.intern((runner.leg, runner.leg_dup)),
            score: score(&class, score_ok, score_points, score_time),
            dest: rows.len(),
        });
        rows.push(Row {
            id,
            time,
            status: runner.status,
            points: runner.points,
        });
    }
    for row in &rows {
        if let Some(computed) = state.runner_computed_mut(row.id) {
            computed.time.set(row.time, revision);
            computed.status.set(row.status, revision);
            computed.points.set(row.points, revision);
        }
    }
    let invalid = class.invalid;
    for (dest, place) in assign_places(&mut entries, |_| invalid) {
        if let Some(computed) = state.runner_computed_mut(rows[dest].id) {
            if total {
                computed.place_total.set(place, revision);
            } else {
                computed.place_class.set(place, revision);
            }
        }
    }

    // ---- teams ----
    let team_ids = state.class_teams(class_id);
    let mut team_entries = Vec::with_capacity(team_ids.len());
    let mut sweeps = Vec::with_capacity(team_ids.len());
    for (idx, &team_id) in team_ids.iter().enumerate() {
        let legs = crate::relay::compute_team_legs(state, team_id);
        let team_time = legs.total_time();
        let team_status = legs.total_status();
        let points: i32 = state
            .team(team_id)
            .map(|t| {
                t.runners
                    .iter()
                    .flatten()
                    .filter_map(|&r| state.runner(r))
                    .map(|r| r.points)
                    .sum()
            })
            .unwrap_or(0);
        let ok = eligible(&class, team_status, team_time > NO_TIME);
        team_entries.push(RankEntry {
            group: 0,
            score: score(&class, ok, points, team_time),
            dest: idx,
        });
        sweeps.push(legs);
    }
    for (&team_id, legs) in team_ids.iter().zip(sweeps) {
        if let Some(computed) = state.team_computed_mut(team_id) {
            computed.legs.set(legs, revision);
        }
    }
    for (dest, place) in assign_places(&mut team_entries, |_| invalid) {
        if let Some(computed) = state.team_computed_mut(team_ids[dest]) {
            if total {
                computed.place_total.set(place, revision);
            } else {
                computed.place_class.set(place, revision);
            }
        }
    }
}

/// Course-scoped places across every class, stamped at the current
/// global revision. `Course` ranks everyone on the same course
/// together; `ClassCourse` additionally partitions by class.
pub fn compute_course_places(state: &mut EventState, result_type: ResultType) {
    let revision = state.revision();
    let by_class = result_type == ResultType::ClassCourse;
    log::debug!("recomputing course places at revision {revision:?}");

    let mut ids: Vec<RunnerId> = Vec::new();
    let mut entries: Vec<RankEntry> = Vec::new();
    let mut unranked: Vec<RunnerId> = Vec::new();
    let mut groups: GroupInterner<(Option<ClassId>, CourseId)> = GroupInterner::default();
    for (id, runner) in state.runners() {
        let Some(course) = runner.course else {
            unranked.push(id);
            continue;
        };
        let class = runner.class.and_then(|c| state.class(c));
        let time = class_time(class, runner);
        let ok = match class {
            Some(c) => eligible(c, runner.status, runner.has_finished()),
            None => {
                runner.status.is_ok()
                    || (runner.status == RunStatus::Unknown && runner.has_finished())
            }
        };
        let voided = class.is_some_and(|c| c.invalid);
        let score = if voided || !ok || time <= NO_TIME {
            -1
        } else {
            RANK_BASE - i64::from(time)
        };
        entries.push(RankEntry {
            group: groups.intern((by_class.then_some(runner.class).flatten(), course)),
            score,
            dest: ids.len(),
        });
        ids.push(id);
    }
    for (dest, place) in assign_places(&mut entries, |_| false) {
        if let Some(computed) = state.runner_computed_mut(ids[dest]) {
            if by_class {
                computed.place_class_course.set(place, revision);
            } else {
                computed.place_course.set(place, revision);
            }
        }
    }
    for id in unranked {
        if let Some(computed) = state.runner_computed_mut(id) {
            if by_class {
                computed.place_class_course.set(Place::NONE, revision);
            } else {
                computed.place_course.set(Place::NONE, revision);
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
