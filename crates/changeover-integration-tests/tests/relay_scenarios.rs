//! End-to-end relay scenarios driven through the result engine.

use changeover_core::class::{LegSpec, LegType, StartType};
use changeover_core::event::EventState;
use changeover_core::rank::Place;
use changeover_core::relay;
use changeover_core::results::{ResultEngine, ResultType};
use changeover_core::status::RunStatus;
use changeover_core::test_utils::*;

#[test]
fn three_leg_relay_ranks_by_final_time() {
    let mut state = EventState::new();
    let class = add_relay_class(&mut state, 3);

    let red = add_team(&mut state, class, "Red");
    fill_leg(&mut state, red, 0, "R1", 0, 1000, RunStatus::Ok);
    fill_leg(&mut state, red, 1, "R2", 0, 2100, RunStatus::Ok);
    fill_leg(&mut state, red, 2, "R3", 0, 3300, RunStatus::Ok);

    let blue = add_team(&mut state, class, "Blue");
    fill_leg(&mut state, blue, 0, "B1", 0, 1100, RunStatus::Ok);
    fill_leg(&mut state, blue, 1, "B2", 0, 2050, RunStatus::Ok);
    fill_leg(&mut state, blue, 2, "B3", 0, 3200, RunStatus::Ok);

    let mut engine = ResultEngine::new();
    // Blue overtakes on the final leg.
    assert_eq!(
        engine.team_place(&mut state, blue, ResultType::Class).unwrap(),
        Place(1)
    );
    assert_eq!(
        engine.team_place(&mut state, red, ResultType::Class).unwrap(),
        Place(2)
    );

    let red_legs = engine.team_results(&mut state, red).unwrap();
    assert_eq!(red_legs.legs[0].time, 1000);
    assert_eq!(red_legs.legs[1].time, 2100);
    assert_eq!(red_legs.total_time(), 3300);
    // Each changeover happens at the previous runner's finish.
    assert_eq!(red_legs.legs[1].start_time, 1000);
    assert_eq!(red_legs.legs[2].start_time, 2100);
}

#[test]
fn mass_start_relay_uses_fixed_first_leg() {
    let mut state = EventState::new();
    let class = add_class_with(&mut state, |legs| {
        legs.push(LegSpec::new(LegType::Normal, StartType::Time).with_start_data(3600));
        legs.push(LegSpec::new(LegType::Normal, StartType::Change));
    });
    let team = add_team(&mut state, class, "T1");
    fill_leg(&mut state, team, 0, "A", 0, 5000, RunStatus::Ok);
    fill_leg(&mut state, team, 1, "B", 0, 6200, RunStatus::Ok);

    let mut engine = ResultEngine::new();
    let legs = engine.team_results(&mut state, team).unwrap();
    assert_eq!(legs.legs[0].start_time, 3600);
    assert_eq!(legs.legs[0].time, 1400);
    assert_eq!(legs.total_time(), 2600);
}

#[test]
fn parallel_pair_waits_for_slower_branch() {
    let mut state = EventState::new();
    let class = add_class_with(&mut state, |legs| {
        legs.push(LegSpec::new(LegType::Normal, StartType::Drawn));
        legs.push(LegSpec::new(LegType::Parallel, StartType::Change));
        legs.push(LegSpec::new(LegType::Normal, StartType::Change));
    });
    let team = add_team(&mut state, class, "T1");
    fill_leg(&mut state, team, 0, "A", 0, 900, RunStatus::Ok);
    fill_leg(&mut state, team, 1, "B", 0, 1400, RunStatus::Ok);
    fill_leg(&mut state, team, 2, "C", 0, 2000, RunStatus::Ok);

    let mut engine = ResultEngine::new();
    let legs = engine.team_results(&mut state, team).unwrap();
    // The anchor starts when the slower parallel runner arrives.
    assert_eq!(legs.legs[2].start_time, 1400);
    assert_eq!(legs.total_time(), 2000);
}

#[test]
fn rope_restart_is_counted_and_timed() {
    let mut state = EventState::new();
    let class = add_class_with(&mut state, |legs| {
        legs.push(LegSpec::new(LegType::Normal, StartType::Drawn));
        legs.push(LegSpec::new(LegType::Normal, StartType::Change).with_restart(7200, 5400));
    });
    let team = add_team(&mut state, class, "Late");
    fill_leg(&mut state, team, 0, "A", 0, 6000, RunStatus::Ok);
    fill_leg(&mut state, team, 1, "B", 0, 8400, RunStatus::Ok);

    let mut engine = ResultEngine::new();
    let legs = engine.team_results(&mut state, team).unwrap();
    assert_eq!(legs.legs[1].start_time, 7200);
    assert_eq!(legs.restarts, 1);
}

#[test]
fn mispunched_leg_fails_the_team_but_not_the_class() {
    let mut state = EventState::new();
    let class = add_relay_class(&mut state, 2);
    let ok = add_team(&mut state, class, "Clean");
    fill_leg(&mut state, ok, 0, "A", 0, 1000, RunStatus::Ok);
    fill_leg(&mut state, ok, 1, "B", 0, 2500, RunStatus::Ok);
    let bad = add_team(&mut state, class, "Dirty");
    fill_leg(&mut state, bad, 0, "C", 0, 900, RunStatus::MisPunch);
    fill_leg(&mut state, bad, 1, "D", 0, 2100, RunStatus::Ok);

    let mut engine = ResultEngine::new();
    assert_eq!(
        engine.team_results(&mut state, bad).unwrap().total_status(),
        RunStatus::MisPunch
    );
    assert_eq!(
        engine.team_place(&mut state, bad, ResultType::Class).unwrap(),
        Place::NONE
    );
    assert_eq!(
        engine.team_place(&mut state, ok, ResultType::Class).unwrap(),
        Place(1)
    );
}

#[test]
fn status_override_wins_but_disagreement_is_reported() {
    let mut state = EventState::new();
    let class = add_relay_class(&mut state, 2);
    let team = add_team(&mut state, class, "T1");
    fill_leg(&mut state, team, 0, "A", 0, 1000, RunStatus::Ok);
    fill_leg(&mut state, team, 1, "B", 0, 2500, RunStatus::Ok);
    state.set_team_status_override(team, Some(RunStatus::Disqualified));

    let mut engine = ResultEngine::new();
    assert_eq!(
        engine.team_results(&mut state, team).unwrap().total_status(),
        RunStatus::Disqualified
    );
    assert_eq!(
        engine.team_place(&mut state, team, ResultType::Class).unwrap(),
        Place::NONE
    );
    let err = relay::validate_status(&state, team).unwrap_err();
    assert_eq!(err.manual, RunStatus::Disqualified);
    assert_eq!(err.computed, RunStatus::Ok);
}

#[test]
fn pursuit_second_leg_preserves_first_leg_gaps() {
    let mut state = EventState::new();
    let class = add_class_with(&mut state, |legs| {
        legs.push(LegSpec::new(LegType::Normal, StartType::Drawn));
        legs.push(LegSpec::new(LegType::Normal, StartType::Pursuit).with_start_data(10000));
    });

    let leader = add_team(&mut state, class, "Leader");
    fill_leg(&mut state, leader, 0, "L1", 0, 2000, RunStatus::Ok);
    fill_leg(&mut state, leader, 1, "L2", 0, 13000, RunStatus::Ok);

    let chaser = add_team(&mut state, class, "Chaser");
    fill_leg(&mut state, chaser, 0, "C1", 0, 2450, RunStatus::Ok);
    fill_leg(&mut state, chaser, 1, "C2", 0, 13200, RunStatus::Ok);

    let mut engine = ResultEngine::new();
    let leader_legs = engine.team_results(&mut state, leader).unwrap();
    let chaser_legs = engine.team_results(&mut state, chaser).unwrap();
    assert_eq!(leader_legs.legs[1].start_time, 10000);
    // 450 behind after leg one, so 450 later out of the pursuit start.
    assert_eq!(chaser_legs.legs[1].start_time, 10450);
    // Leg-two finish order decides: the chaser crossed later.
    assert_eq!(
        engine.team_place(&mut state, leader, ResultType::Class).unwrap(),
        Place(1)
    );
    assert_eq!(
        engine.team_place(&mut state, chaser, ResultType::Class).unwrap(),
        Place(2)
    );
}

#[test]
fn edit_to_early_leg_reflows_downstream_results() {
    let mut state = EventState::new();
    let class = add_relay_class(&mut state, 2);
    let team = add_team(&mut state, class, "T1");
    let first = fill_leg(&mut state, team, 0, "A", 0, 1000, RunStatus::Ok);
    fill_leg(&mut state, team, 1, "B", 0, 2500, RunStatus::Ok);

    let mut engine = ResultEngine::new();
    assert_eq!(engine.team_results(&mut state, team).unwrap().total_time(), 2500);

    // The first runner's time is corrected afterwards.
    state.set_runner_finish(first, 1200);
    let legs = engine.team_results(&mut state, team).unwrap();
    assert_eq!(legs.legs[1].start_time, 1200);
    assert_eq!(legs.total_time(), 2500);
}
