//! The relay leg state machine: start time, running time, and status
//! propagation along a team's legs.
//!
//! The sweep is a single iterative left-to-right pass (bounded by the
//! leg count), producing one [`ComputedLegResult`] per leg. Start times
//! follow the leg's [`StartType`]; cumulative times follow the leg's
//! [`LegType`]; statuses cascade worst-wins, short-circuiting at the
//! first not-yet-run leg.
//!
//! An ordered pool of pending start times threads across the sweep to
//! support fan-out (one leg feeding several parallel legs) and fan-in
//! (several parallel legs feeding one): finishes are pushed as legs
//! complete, the largest is popped for pursuit starts at fan-in, and
//! the pool collapses back to the single latest finish when a
//! single-runner leg is reached.

use crate::class::{Class, LegSpec, LegType, StartType};
use crate::event::EventState;
use crate::id::{ClassId, TeamId};
use crate::punch::start_punch_time;
use crate::runner::Runner;
use crate::status::RunStatus;
use crate::team::{ComputedLegResult, Team, TeamLegResults};
use crate::time::{NO_TIME, TimeSecs, elapsed};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A manually set team status that disagrees with the cascade computed
/// from its legs. User-actionable: the override still wins in outputs,
/// but the disagreement must be surfaced, never silently overwritten.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("team status set to {manual:?} but legs compute {computed:?}")]
pub struct StatusMismatch {
    pub manual: RunStatus,
    pub computed: RunStatus,
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Run the leg sweep for one team. Missing runners, courses, or punches
/// degrade to zero/unplaced results; the sweep itself never fails.
pub fn compute_team_legs(state: &EventState, team_id: TeamId) -> TeamLegResults {
    sweep(state, team_id).map_or_else(TeamLegResults::default, |s| s.results)
}

/// Check a team's manual status override against the cascade recomputed
/// from its legs.
pub fn validate_status(state: &EventState, team_id: TeamId) -> Result<(), StatusMismatch> {
    let Some(team) = state.team(team_id) else {
        return Ok(());
    };
    let Some(manual) = team.status_override else {
        return Ok(());
    };
    let computed = sweep(state, team_id).map_or(RunStatus::Unknown, |s| s.cascade);
    if manual == computed {
        Ok(())
    } else {
        Err(StatusMismatch { manual, computed })
    }
}

/// Best naive cumulative time per leg across a class's teams, used as
/// the pursuit reference ("the class leader's time for that leg").
///
/// Computed from raw runner times without pursuit offsets, so the
/// reference does not depend on the very starts being derived from it.
pub fn class_leader_times(state: &EventState, class_id: ClassId) -> Vec<TimeSecs> {
    let Some(class) = state.class(class_id) else {
        return Vec::new();
    };
    let n = class.n_legs();
    let mut best = vec![NO_TIME; n];
    for team_id in state.class_teams(class_id) {
        let Some(team) = state.team(team_id) else {
            continue;
        };
        let cums = naive_cumulative(state, class, team);
        for (slot, cum) in best.iter_mut().zip(cums) {
            if cum > NO_TIME && (*slot == NO_TIME || cum < *slot) {
                *slot = cum;
            }
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Sweep state
// ---------------------------------------------------------------------------

struct SweepOutcome {
    results: TeamLegResults,
    /// Final cascade status before any manual override.
    cascade: RunStatus,
}

fn sweep(state: &EventState, team_id: TeamId) -> Option<SweepOutcome> {
    let team = state.team(team_id)?;
    let class = state.class(team.class?)?;
    let n = class.n_legs();

    let needs_leader = class
        .legs()
        .iter()
        .any(|l| l.start_type == StartType::Pursuit);
    let leader = if needs_leader {
        class_leader_times(state, team.class?)
    } else {
        Vec::new()
    };

    let runner_at = |i: usize| {
        team.runners
            .get(i)
            .copied()
            .flatten()
            .and_then(|id| state.runner(id))
    };

    let mut legs: Vec<ComputedLegResult> = Vec::with_capacity(n);
    let mut starts = vec![NO_TIME; n];
    let mut resting: TimeSecs = 0;
    let mut pool: Vec<TimeSecs> = Vec::new();
    let mut restarts = 0u32;
    let mut cascade = RunStatus::Unknown;
    let mut blocked = false;

    let mut i = 0;
    while i < n {
        let spec = class.leg(i).copied()?;

        if spec.leg_type == LegType::Extra {
            // Contiguous extra run sharing the previous leg as base.
            let mut j = i;
            while j < n && class.leg(j).is_some_and(|s| s.leg_type == LegType::Extra) {
                j += 1;
            }
            // Topology validation guarantees a base leg exists (i > 0).
            let base_cum = legs.last().map_or(NO_TIME, |l| l.time);
            let block_start = runner_at(i - 1).map_or(NO_TIME, |r| r.finish_time).max(NO_TIME);
            let best = (i..j)
                .filter_map(|k| runner_at(k))
                .filter(|r| r.has_finished())
                .min_by_key(|r| r.finish_time);
            let cum = match best {
                Some(r) => {
                    // Status follows the runner with the best finish,
                    // even when a sibling has a worse status.
                    if !blocked {
                        cascade = cascade.worst(r.status);
                    }
                    let start = if block_start > NO_TIME {
                        block_start
                    } else {
                        r.start_time
                    };
                    base_cum + elapsed(start, r.finish_time)
                }
                None => base_cum,
            };
            for _ in i..j {
                legs.push(ComputedLegResult {
                    status: cascade,
                    start_time: block_start,
                    time: cum,
                });
            }
            i = j;
            continue;
        }

        let runner = runner_at(i);
        let prev_cum = legs.last().map_or(NO_TIME, |l| l.time);
        let parallel = spec.leg_type.is_parallel();
        let transparent = spec.leg_type.is_chain_transparent();

        // ---- start time -------------------------------------------------
        let start = match spec.start_type {
            StartType::Drawn => {
                if parallel && i > 0 {
                    starts[i - 1]
                } else {
                    runner
                        .map(|r| r.start_time)
                        .filter(|t| *t > NO_TIME)
                        .unwrap_or(team.start_time)
                }
            }
            StartType::Time => {
                let mut t = spec.start_data.max(0);
                if class.free_start
                    && let Some(r) = runner
                {
                    let punched = start_punch_time(&r.punches);
                    if punched > NO_TIME {
                        t = punched;
                    }
                }
                t
            }
            StartType::Change => {
                let natural = if spec.start_data < 0 {
                    probe_finish(state, team, class, i, (-spec.start_data) as usize)
                } else if parallel && i > 0 {
                    // Parallel siblings share the changeover moment.
                    starts[i - 1]
                } else {
                    pool.iter().copied().max().unwrap_or(NO_TIME)
                };
                apply_restart(&spec, natural, &mut restarts)
            }
            StartType::Pursuit => {
                let natural = pop_largest(&mut pool);
                if restart_due(&spec, natural) {
                    restarts += 1;
                    spec.restart_time.unwrap_or(NO_TIME)
                } else {
                    let behind = if i > 0 {
                        (prev_cum - leader.get(i - 1).copied().unwrap_or(NO_TIME)).max(0)
                    } else {
                        0
                    };
                    let start = spec.start_data + behind;
                    if natural > NO_TIME && start > natural {
                        // Sanctioned waiting: does not count against the team.
                        resting += start - natural;
                    }
                    start.max(natural)
                }
            }
        };
        starts[i] = start;
        let base = starts[0];

        // ---- cumulative running time ------------------------------------
        let finish = runner.map_or(NO_TIME, |r| r.finish_time);
        let own = elapsed(start, finish);
        let prelim_ok = runner.is_some_and(|r| {
            r.status.is_ok() || (r.status == RunStatus::Unknown && r.has_finished())
        });
        let wall = if finish > NO_TIME {
            finish - (base + resting)
        } else {
            NO_TIME
        };

        let cum = match spec.leg_type {
            LegType::Normal => {
                if prelim_ok && finish > NO_TIME {
                    (prev_cum + own).max(wall)
                } else {
                    NO_TIME
                }
            }
            LegType::Parallel | LegType::ParallelOptional => {
                // Never extends the team beyond the slower branch.
                wall.max(prev_cum)
            }
            LegType::Sum => {
                if prev_cum == NO_TIME || !prelim_ok {
                    NO_TIME
                } else {
                    own + prev_cum
                }
            }
            LegType::Ignore => prev_cum,
            LegType::Group => {
                prev_cum
                    + team
                        .group_times
                        .get(i)
                        .copied()
                        .flatten()
                        .unwrap_or(NO_TIME)
            }
            LegType::Extra => unreachable!("extra legs handled as a block"),
        };

        // ---- status cascade ---------------------------------------------
        if !blocked && !transparent {
            match runner {
                None => {
                    if spec.leg_type != LegType::ParallelOptional {
                        blocked = true;
                    }
                }
                Some(r) => {
                    let not_yet_run = r.status == RunStatus::Unknown && !r.has_finished();
                    if not_yet_run {
                        blocked = true;
                    } else {
                        cascade = cascade.worst(r.status);
                    }
                }
            }
        }

        legs.push(ComputedLegResult {
            status: cascade,
            start_time: start,
            time: cum,
        });

        // ---- pending start pool -----------------------------------------
        if !transparent {
            if !parallel {
                pool.clear();
            }
            if finish > NO_TIME {
                pool.push(finish);
            }
        }

        i += 1;
    }

    // A manual team status on the final leg always overrides the cascade.
    if let (Some(last), Some(manual)) = (legs.last_mut(), team.status_override) {
        last.status = manual;
    }

    Some(SweepOutcome {
        results: TeamLegResults { legs, restarts },
        cascade,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn pop_largest(pool: &mut Vec<TimeSecs>) -> TimeSecs {
    let Some((idx, _)) = pool
        .iter()
        .enumerate()
        .max_by_key(|(_, t)| **t)
    else {
        return NO_TIME;
    };
    pool.swap_remove(idx)
}

fn restart_due(spec: &LegSpec, natural: TimeSecs) -> bool {
    match (spec.restart_time, spec.rope_time) {
        (Some(_), Some(rope)) => natural == NO_TIME || natural > rope,
        _ => false,
    }
}

fn apply_restart(spec: &LegSpec, natural: TimeSecs, restarts: &mut u32) -> TimeSecs {
    if restart_due(spec, natural) {
        *restarts += 1;
        spec.restart_time.unwrap_or(NO_TIME)
    } else {
        natural
    }
}

/// Finish time of the runner `offset` changeover legs before `leg`,
/// skipping chain-transparent legs (Ignore, Extra, Group).
fn probe_finish(
    state: &EventState,
    team: &Team,
    class: &Class,
    leg: usize,
    offset: usize,
) -> TimeSecs {
    let mut remaining = offset;
    let mut i = leg;
    while i > 0 {
        i -= 1;
        let Some(spec) = class.leg(i) else {
            return NO_TIME;
        };
        if spec.leg_type.is_chain_transparent() {
            continue;
        }
        remaining -= 1;
        if remaining == 0 {
            return team
                .runners
                .get(i)
                .copied()
                .flatten()
                .and_then(|id| state.runner(id))
                .map_or(NO_TIME, |r| r.finish_time);
        }
    }
    NO_TIME
}

/// Per-team cumulative times computed from raw runner times only (no
/// pursuit starts, no pool), used for the pursuit leader reference.
/// A team drops out of the reference at its first unusable leg.
fn naive_cumulative(state: &EventState, class: &Class, team: &Team) -> Vec<TimeSecs> {
    let n = class.n_legs();
    let mut cums = vec![NO_TIME; n];
    let mut cum = NO_TIME;
    // Cumulative time at the start of the current parallel block.
    let mut anchor = NO_TIME;
    let mut dead = false;
    for i in 0..n {
        let Some(spec) = class.leg(i) else {
            break;
        };
        let runner = team
            .runners
            .get(i)
            .copied()
            .flatten()
            .and_then(|id| state.runner(id));
        let own = runner.map_or(NO_TIME, |r| r.running_time());
        let usable = runner.is_some_and(|r| {
            (r.status.is_ok() || r.status == RunStatus::Unknown) && r.has_finished()
        });
        match spec.leg_type {
            LegType::Normal | LegType::Sum => {
                if usable && !dead {
                    anchor = cum;
                    cum += own;
                } else {
                    dead = true;
                }
            }
            LegType::Parallel | LegType::ParallelOptional => {
                if usable && !dead {
                    cum = cum.max(anchor + own);
                }
            }
            LegType::Ignore | LegType::Extra | LegType::Group => {}
        }
        cums[i] = if dead { NO_TIME } else { cum };
    }
    cums
}

// ===========================================================================
// Tests
// ===========================================================================
