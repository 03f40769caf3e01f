//! Shared fixture builders for unit and integration tests.
//!
//! Enabled in-crate for `#[cfg(test)]` and exported behind the
//! `test-utils` feature for downstream test suites.

use crate::class::{Class, LegSpec, LegType, StartType};
use crate::course::Course;
use crate::event::EventState;
use crate::id::{ClassId, ControlId, CourseId, RunnerId, TeamId};
use crate::punch::Punch;
use crate::runner::Runner;
use crate::status::RunStatus;
use crate::team::Team;
use crate::time::TimeSecs;

/// Add a single-leg individual class.
pub fn add_individual_class(state: &mut EventState, name: &str) -> ClassId {
    state.add_class(Class::individual(name))
}

/// Add a plain sequential relay: a drawn first leg followed by
/// changeover legs.
pub fn add_relay_class(state: &mut EventState, n_legs: usize) -> ClassId {
    add_class_with(state, |legs| {
        legs.push(LegSpec::new(LegType::Normal, StartType::Drawn));
        for _ in 1..n_legs {
            legs.push(LegSpec::new(LegType::Normal, StartType::Change));
        }
    })
}

/// Add a relay class with a caller-built topology.
pub fn add_class_with(state: &mut EventState, build: impl FnOnce(&mut Vec<LegSpec>)) -> ClassId {
    add_class_with_opts(state, |_| {}, build)
}

/// Add a relay class with a caller-built topology and class tweaks.
pub fn add_class_with_opts(
    state: &mut EventState,
    configure: impl FnOnce(&mut Class),
    build: impl FnOnce(&mut Vec<LegSpec>),
) -> ClassId {
    let mut legs = Vec::new();
    build(&mut legs);
    let mut class = Class::relay("Relay", legs).expect("test topology must be valid");
    configure(&mut class);
    state.add_class(class)
}

/// Add an empty team to a class.
pub fn add_team(state: &mut EventState, class: ClassId, name: &str) -> TeamId {
    let mut team = Team::new(name, 0);
    team.class = Some(class);
    state.add_team(team)
}

/// Add a runner with recorded times and status, assigned to a team leg.
pub fn fill_leg(
    state: &mut EventState,
    team: TeamId,
    leg: usize,
    name: &str,
    start: TimeSecs,
    finish: TimeSecs,
    status: RunStatus,
) -> RunnerId {
    let class = state.team(team).and_then(|t| t.class);
    let id = add_runner_in(state, class, name, start, finish, status);
    state.set_team_member(team, leg, Some(id));
    id
}

/// Add an individual runner with recorded times and status.
pub fn add_runner_with(
    state: &mut EventState,
    class: ClassId,
    name: &str,
    start: TimeSecs,
    finish: TimeSecs,
    status: RunStatus,
) -> RunnerId {
    add_runner_in(state, Some(class), name, start, finish, status)
}

fn add_runner_in(
    state: &mut EventState,
    class: Option<ClassId>,
    name: &str,
    start: TimeSecs,
    finish: TimeSecs,
    status: RunStatus,
) -> RunnerId {
    let mut runner = Runner::new(name);
    runner.class = class;
    runner.start_time = start;
    runner.finish_time = finish;
    runner.status = status;
    state.add_runner(runner)
}

/// Add a course from bare control codes.
pub fn add_course(state: &mut EventState, name: &str, controls: &[u32]) -> CourseId {
    state.add_course(Course::new(
        name,
        controls.iter().map(|c| ControlId(*c)).collect(),
    ))
}

/// Record a punched card as (control code, time) pairs.
pub fn punch_card(state: &mut EventState, runner: RunnerId, punches: &[(u32, TimeSecs)]) {
    for (control, time) in punches {
        state.add_punch(runner, Punch::new(ControlId(*control), *time));
    }
}
