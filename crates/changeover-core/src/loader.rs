//! JSON event loader (behind the `data-loader` feature).
//!
//! Reads a complete event description -- classes, courses, runners,
//! teams -- from a single JSON document, resolving cross-references by
//! name. Intended for test fixtures and offline tooling, not as a wire
//! format.

use crate::class::{Class, LegSpec, TopologyError};
use crate::course::Course;
use crate::event::EventState;
use crate::id::{CardNumber, ClassId, ClubId, ControlId, CourseId};
use crate::punch::Punch;
use crate::runner::Runner;
use crate::status::RunStatus;
use crate::team::Team;
use crate::time::{NO_TIME, TimeSecs};
use serde::Deserialize;
use std::collections::HashMap;

/// Errors raised while loading an event description.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("malformed event description: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown class `{0}`")]
    UnknownClass(String),
    #[error("unknown course `{0}`")]
    UnknownCourse(String),
    #[error("unknown runner `{0}`")]
    UnknownRunner(String),
    #[error("class `{class}`: {source}")]
    Topology {
        class: String,
        source: TopologyError,
    },
}

fn default_true() -> bool {
    true
}

fn no_time() -> TimeSecs {
    NO_TIME
}

#[derive(Debug, Deserialize)]
struct EventFile {
    #[serde(default)]
    classes: Vec<ClassDef>,
    #[serde(default)]
    courses: Vec<CourseDef>,
    #[serde(default)]
    runners: Vec<RunnerDef>,
    #[serde(default)]
    teams: Vec<TeamDef>,
}

#[derive(Debug, Deserialize)]
struct ClassDef {
    name: String,
    /// Empty means a single-leg individual class.
    #[serde(default)]
    legs: Vec<LegSpec>,
    #[serde(default)]
    rogaining: bool,
    #[serde(default)]
    result_module: Option<String>,
    #[serde(default)]
    free_start: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default = "default_true")]
    allow_preliminary: bool,
}

#[derive(Debug, Deserialize)]
struct CourseDef {
    name: String,
    controls: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct RunnerDef {
    name: String,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    course: Option<String>,
    #[serde(default)]
    club: Option<u32>,
    #[serde(default)]
    card: Option<u32>,
    #[serde(default = "no_time")]
    start: TimeSecs,
    #[serde(default = "no_time")]
    finish: TimeSecs,
    #[serde(default)]
    status: RunStatus,
    #[serde(default)]
    points: i32,
    /// (control code, absolute time) pairs in card order.
    #[serde(default)]
    punches: Vec<(u32, TimeSecs)>,
    #[serde(default = "no_time")]
    input_time: TimeSecs,
    #[serde(default = "input_status_ok")]
    input_status: RunStatus,
    #[serde(default)]
    input_points: i32,
}

fn input_status_ok() -> RunStatus {
    RunStatus::Ok
}

#[derive(Debug, Deserialize)]
struct TeamDef {
    name: String,
    class: String,
    #[serde(default = "no_time")]
    start: TimeSecs,
    /// One entry per leg; `null` leaves the slot unfilled.
    #[serde(default)]
    members: Vec<Option<String>>,
    #[serde(default)]
    status_override: Option<RunStatus>,
}

/// Load a full event from a JSON document.
pub fn load_event(json: &str) -> Result<EventState, LoadError> {
    let file: EventFile = serde_json::from_str(json)?;
    let mut state = EventState::new();

    let mut classes: HashMap<String, ClassId> = HashMap::new();
    for def in file.classes {
        let mut class = Class::individual(def.name.clone());
        if !def.legs.is_empty() {
            class.set_legs(def.legs).map_err(|source| LoadError::Topology {
                class: def.name.clone(),
                source,
            })?;
        }
        class.rogaining = def.rogaining;
        class.result_module = def.result_module;
        class.free_start = def.free_start;
        class.invalid = def.invalid;
        class.allow_preliminary = def.allow_preliminary;
        let id = state.add_class(class);
        classes.insert(def.name, id);
    }

    let mut courses: HashMap<String, CourseId> = HashMap::new();
    for def in file.courses {
        let controls = def.controls.into_iter().map(ControlId).collect();
        let id = state.add_course(Course::new(def.name.clone(), controls));
        courses.insert(def.name, id);
    }

    let mut runners: HashMap<String, crate::id::RunnerId> = HashMap::new();
    for def in file.runners {
        let mut runner = Runner::new(def.name.clone());
        runner.class = def
            .class
            .map(|name| {
                classes
                    .get(&name)
                    .copied()
                    .ok_or(LoadError::UnknownClass(name))
            })
            .transpose()?;
        runner.course = def
            .course
            .map(|name| {
                courses
                    .get(&name)
                    .copied()
                    .ok_or(LoadError::UnknownCourse(name))
            })
            .transpose()?;
        runner.club = def.club.map(ClubId);
        runner.card = def.card.map(CardNumber);
        runner.start_time = def.start;
        runner.finish_time = def.finish;
        runner.status = def.status;
        runner.points = def.points;
        runner.punches = def
            .punches
            .into_iter()
            .map(|(control, time)| Punch::new(ControlId(control), time))
            .collect();
        runner.input_time = def.input_time;
        runner.input_status = def.input_status;
        runner.input_points = def.input_points;
        let id = state.add_runner(runner);
        runners.insert(def.name, id);
    }

    for def in file.teams {
        let class_id = classes
            .get(&def.class)
            .copied()
            .ok_or(LoadError::UnknownClass(def.class))?;
        let mut team = Team::new(def.name, 0);
        team.class = Some(class_id);
        team.start_time = def.start;
        team.status_override = def.status_override;
        let team_id = state.add_team(team);
        for (leg, member) in def.members.into_iter().enumerate() {
            let Some(name) = member else {
                continue;
            };
            let runner_id = runners
                .get(&name)
                .copied()
                .ok_or(LoadError::UnknownRunner(name))?;
            state.set_team_member(team_id, leg, Some(runner_id));
        }
    }

    log::info!(
        "loaded event: {} classes, {} runners",
        classes.len(),
        runners.len()
    );
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::Place;
    use crate::results::{ResultEngine, ResultType};

    const FIXTURE: &str = r#"{
        "classes": [
            {"name": "M21"},
            {"name": "Relay", "legs": [
                {"leg_type": "normal", "start_type": "drawn"},
                {"leg_type": "normal", "start_type": "change"}
            ]}
        ],
        "courses": [
            {"name": "Long", "controls": [31, 32, 33]}
        ],
        "runners": [
            {"name": "Asta", "class": "M21", "course": "Long",
             "start": 0, "finish": 1500, "status": "ok",
             "punches": [[31, 400], [32, 900], [33, 1300]]},
            {"name": "Brita", "class": "M21", "start": 0, "finish": 1600, "status": "ok"},
            {"name": "Carl", "class": "Relay", "start": 0, "finish": 1000, "status": "ok"},
            {"name": "Dora", "class": "Relay", "finish": 2200, "status": "ok"}
        ],
        "teams": [
            {"name": "OK Linne 1", "class": "Relay", "start": 0,
             "members": ["Carl", "Dora"]}
        ]
    }"#;

    #[test]
    fn loads_and_resolves_names() {
        let state = load_event(FIXTURE).unwrap();
        assert_eq!(state.classes().count(), 2);
        assert_eq!(state.runners().count(), 4);
        let (_, team) = state.teams().next().unwrap();
        assert_eq!(team.runners.len(), 2);
        assert!(team.runners.iter().all(Option::is_some));
    }

    #[test]
    fn loaded_event_computes_results() {
        let mut state = load_event(FIXTURE).unwrap();
        let (asta, _) = state
            .runners()
            .find(|(_, r)| r.name == "Asta")
            .unwrap();
        let mut engine = ResultEngine::new();
        assert_eq!(
            engine
                .runner_place(&mut state, asta, ResultType::Class)
                .unwrap(),
            Place(1)
        );

        let (team_id, _) = state.teams().next().unwrap();
        let results = engine.team_results(&mut state, team_id).unwrap();
        assert_eq!(results.total_time(), 2200);
    }

    #[test]
    fn unknown_class_reference_fails() {
        let err = load_event(r#"{"runners": [{"name": "X", "class": "Ghost"}]}"#).unwrap_err();
        assert!(matches!(err, LoadError::UnknownClass(name) if name == "Ghost"));
    }

    #[test]
    fn unknown_team_member_fails() {
        let err = load_event(
            r#"{
                "classes": [{"name": "R", "legs": [
                    {"leg_type": "normal", "start_type": "drawn"}
                ]}],
                "teams": [{"name": "T", "class": "R", "members": ["Ghost"]}]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::UnknownRunner(name) if name == "Ghost"));
    }

    #[test]
    fn invalid_topology_is_reported_with_class_name() {
        let err = load_event(
            r#"{
                "classes": [{"name": "Bad", "legs": [
                    {"leg_type": "parallel", "start_type": "change"}
                ]}]
            }"#,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Bad"), "got: {msg}");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            load_event("{ not json").unwrap_err(),
            LoadError::Parse(_)
        ));
    }

    #[test]
    fn defaults_apply_to_sparse_runners() {
        let state = load_event(r#"{"runners": [{"name": "X"}]}"#).unwrap();
        let (_, runner) = state.runners().next().unwrap();
        assert_eq!(runner.start_time, NO_TIME);
        assert_eq!(runner.status, RunStatus::Unknown);
        assert_eq!(runner.input_status, RunStatus::Ok);
    }
}
