//! Rogaining scoring and multi-stage total results, including the
//! league-points module from the companion crate.

use changeover_core::event::EventState;
use changeover_core::rank::Place;
use changeover_core::results::{ResultEngine, ResultType};
use changeover_core::status::RunStatus;
use changeover_core::test_utils::*;
use changeover_points::{PointsLeagueModule, TAG};

fn rogaining_class(state: &mut EventState) -> changeover_core::id::ClassId {
    let mut class = changeover_core::class::Class::individual("24h");
    class.rogaining = true;
    state.add_class(class)
}

#[test]
fn rogaining_ranks_points_then_time() {
    let mut state = EventState::new();
    let class = rogaining_class(&mut state);
    let rows = [
        ("A", 80, 21_000),
        ("B", 80, 20_000),
        ("C", 95, 23_000),
        ("D", 60, 10_000),
    ];
    let ids: Vec<_> = rows
        .iter()
        .map(|(name, points, finish)| {
            let id = add_runner_with(&mut state, class, name, 0, *finish, RunStatus::Ok);
            state.set_runner_points(id, *points);
            id
        })
        .collect();

    let mut engine = ResultEngine::new();
    let mut places = Vec::new();
    for &id in &ids {
        places.push(engine.runner_place(&mut state, id, ResultType::Class).unwrap());
    }
    // C (most points) first; B beats A on time at equal points; D last.
    assert_eq!(places, vec![Place(3), Place(2), Place(1), Place(4)]);
}

#[test]
fn rogaining_total_accumulates_stage_points() {
    let mut state = EventState::new();
    let class = rogaining_class(&mut state);
    // A stronger today, B carries more points in from stage one.
    let a = add_runner_with(&mut state, class, "A", 0, 20_000, RunStatus::Ok);
    state.set_runner_points(a, 90);
    state.set_runner_input(a, 19_000, RunStatus::Ok, 40);
    let b = add_runner_with(&mut state, class, "B", 0, 21_000, RunStatus::Ok);
    state.set_runner_points(b, 70);
    state.set_runner_input(b, 18_000, RunStatus::Ok, 70);

    let mut engine = ResultEngine::new();
    assert_eq!(
        engine.runner_place(&mut state, a, ResultType::Class).unwrap(),
        Place(1)
    );
    // 130 vs 140 in total: B leads overall.
    assert_eq!(
        engine.runner_place(&mut state, b, ResultType::Total).unwrap(),
        Place(1)
    );
    assert_eq!(
        engine.runner_place(&mut state, a, ResultType::Total).unwrap(),
        Place(2)
    );
}

#[test]
fn disqualified_stage_one_blocks_the_total_only() {
    let mut state = EventState::new();
    let class = add_individual_class(&mut state, "M21");
    let a = add_runner_with(&mut state, class, "A", 0, 1500, RunStatus::Ok);
    state.set_runner_input(a, 2000, RunStatus::Disqualified, 0);

    let mut engine = ResultEngine::new();
    assert_eq!(
        engine.runner_place(&mut state, a, ResultType::Class).unwrap(),
        Place(1)
    );
    assert_eq!(
        engine.runner_place(&mut state, a, ResultType::Total).unwrap(),
        Place::NONE
    );
}

#[test]
fn league_module_feeds_team_standings() {
    let mut state = EventState::new();
    let class = add_individual_class(&mut state, "League");
    state.set_class_result_module(class, Some(TAG.into()));
    let a = add_runner_with(&mut state, class, "A", 0, 1400, RunStatus::Ok);
    let b = add_runner_with(&mut state, class, "B", 0, 1500, RunStatus::Ok);
    let c = add_runner_with(&mut state, class, "C", 0, 1600, RunStatus::Ok);

    let mut engine = ResultEngine::new();
    engine.register_module(Box::new(PointsLeagueModule::new()));
    assert_eq!(engine.runner_points(&mut state, a).unwrap(), 25);
    assert_eq!(engine.runner_points(&mut state, b).unwrap(), 20);
    assert_eq!(engine.runner_points(&mut state, c).unwrap(), 16);

    // A correction reshuffles both places and points on next read.
    state.set_runner_finish(a, 1700);
    assert_eq!(engine.runner_points(&mut state, b).unwrap(), 25);
    assert_eq!(engine.runner_points(&mut state, a).unwrap(), 16);
}
