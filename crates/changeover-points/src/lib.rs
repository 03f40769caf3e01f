//! League scoring as a pluggable result module.
//!
//! Classes tagged `points-league` award league points from the standard
//! finishing order (winner 25, runner-up 20, and so on down the table)
//! and rank teams by the sum of their members' points. The standard
//! computation is obtained through the default result categories, then
//! overlaid with the league scoring.

use changeover_core::event::EventState;
use changeover_core::id::{ClassId, RunnerId, TeamId};
use changeover_core::module::{ModuleError, ResultContext, ResultModule};
use changeover_core::rank::{Place, RankEntry, assign_places};
use changeover_core::results::{ResultType, compute_class_default};

/// The module tag classes use to opt in.
pub const TAG: &str = "points-league";

/// Points for places 1..=10; anything placed below the table scores
/// the tail value, unplaced scores zero.
const POINTS_TABLE: [i32; 10] = [25, 20, 16, 13, 11, 10, 9, 8, 7, 6];

fn league_points(place: Place) -> i32 {
    if !place.is_placed() {
        return 0;
    }
    let index = place.0 as usize - 1;
    POINTS_TABLE
        .get(index)
        .copied()
        .unwrap_or(POINTS_TABLE[POINTS_TABLE.len() - 1])
}

/// Awards league points from standard class places.
#[derive(Debug, Default)]
pub struct PointsLeagueModule;

impl PointsLeagueModule {
    pub fn new() -> Self {
        Self
    }
}

impl ResultModule for PointsLeagueModule {
    fn tag(&self) -> &str {
        TAG
    }

    fn individual_results(
        &self,
        state: &mut EventState,
        class: ClassId,
        runners: &[RunnerId],
        ctx: &ResultContext,
    ) -> Result<(), ModuleError> {
        let default_type = if ctx.result_type == ResultType::Total {
            ResultType::TotalDefault
        } else {
            ResultType::ClassDefault
        };
        compute_class_default(state, class, default_type);

        for &id in runners {
            let Some(runner) = state.runner(id) else {
                continue;
            };
            let place = if default_type == ResultType::TotalDefault {
                *runner.computed.place_total.value_unchecked()
            } else {
                *runner.computed.place_class.value_unchecked()
            };
            let points = league_points(place);
            log::trace!("league points for `{}`: {points}", runner.name);
            if let Some(computed) = state.runner_computed_mut(id) {
                computed.points.set(points, ctx.revision);
            }
        }
        Ok(())
    }

    fn team_results(
        &self,
        state: &mut EventState,
        _class: ClassId,
        teams: &[TeamId],
        ctx: &ResultContext,
    ) -> Result<(), ModuleError> {
        let mut entries = Vec::with_capacity(teams.len());
        for (idx, &team_id) in teams.iter().enumerate() {
            let Some(team) = state.team(team_id) else {
                continue;
            };
            let points: i32 = team
                .runners
                .iter()
                .flatten()
                .filter_map(|&r| state.runner(r))
                .map(|r| *r.computed.points.value_unchecked())
                .sum();
            entries.push(RankEntry {
                group: 0,
                score: i64::from(points),
                dest: idx,
            });
        }
        for (dest, place) in assign_places(&mut entries, |_| false) {
            if let Some(computed) = state.team_computed_mut(teams[dest]) {
                if ctx.result_type == ResultType::Total {
                    computed.place_total.set(place, ctx.revision);
                } else {
                    computed.place_class.set(place, ctx.revision);
                }
            }
        }
        Ok(())
    }
}
