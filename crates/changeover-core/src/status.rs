//! Run statuses and worst-wins aggregation.
//!
//! The enum is declared in ascending severity so the derived `Ord` gives
//! "worst wins" via `max`: aggregating a team's statuses across legs is a
//! plain fold with [`RunStatus::worst`].

use serde::{Deserialize, Serialize};

/// Competitive status of a runner or team.
///
/// Totally ordered: a larger value is a worse outcome. `Unknown` is the
/// minimum so it never masks a real status during aggregation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No status recorded yet (still out, or not imported).
    #[default]
    Unknown,
    /// Finished with an approved result.
    Ok,
    /// Missing or wrong punch.
    MisPunch,
    /// Started but did not finish.
    DidNotFinish,
    /// Disqualified.
    Disqualified,
    /// Exceeded the maximum allowed time.
    OverMaxTime,
    /// Never started.
    DidNotStart,
    /// Entry cancelled.
    Cancelled,
}

impl RunStatus {
    /// Worst-wins aggregation: the more severe of the two statuses.
    pub fn worst(self, other: RunStatus) -> RunStatus {
        self.max(other)
    }

    /// An approved, rankable result.
    pub fn is_ok(self) -> bool {
        self == RunStatus::Ok
    }

    /// The competitor took the start (any status implying a run happened).
    pub fn started(self) -> bool {
        !matches!(
            self,
            RunStatus::Unknown | RunStatus::DidNotStart | RunStatus::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_picks_more_severe() {
        assert_eq!(
            RunStatus::Ok.worst(RunStatus::MisPunch),
            RunStatus::MisPunch
        );
        assert_eq!(RunStatus::Unknown.worst(RunStatus::Ok), RunStatus::Ok);
        assert_eq!(
            RunStatus::Disqualified.worst(RunStatus::DidNotFinish),
            RunStatus::Disqualified
        );
    }

    #[test]
    fn unknown_is_minimum() {
        for s in [
            RunStatus::Ok,
            RunStatus::MisPunch,
            RunStatus::DidNotFinish,
            RunStatus::Disqualified,
            RunStatus::OverMaxTime,
            RunStatus::DidNotStart,
            RunStatus::Cancelled,
        ] {
            assert!(RunStatus::Unknown < s);
        }
    }

    #[test]
    fn fold_over_legs_is_worst_wins() {
        let legs = [RunStatus::Ok, RunStatus::Ok, RunStatus::MisPunch, RunStatus::Ok];
        let total = legs
            .iter()
            .fold(RunStatus::Unknown, |acc, s| acc.worst(*s));
        assert_eq!(total, RunStatus::MisPunch);
    }

    #[test]
    fn started_predicate() {
        assert!(RunStatus::Ok.started());
        assert!(RunStatus::DidNotFinish.started());
        assert!(!RunStatus::DidNotStart.started());
        assert!(!RunStatus::Unknown.started());
    }

    #[test]
    fn default_is_unknown() {
        assert_eq!(RunStatus::default(), RunStatus::Unknown);
    }
}
