//! Punch records: one timestamped control registration on a card.

use crate::id::ControlId;
use crate::time::{NO_TIME, TimeSecs};
use serde::{Deserialize, Serialize};

/// Pseudo control code for the start punch.
pub const START_CONTROL: ControlId = ControlId(1);
/// Pseudo control code for the finish punch.
pub const FINISH_CONTROL: ControlId = ControlId(2);
/// Pseudo control code for the check punch (card cleared / checked).
pub const CHECK_CONTROL: ControlId = ControlId(3);

/// A single punch: control code plus absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Punch {
    pub control: ControlId,
    pub time: TimeSecs,
}

impl Punch {
    pub fn new(control: ControlId, time: TimeSecs) -> Self {
        Self { control, time }
    }

    /// Whether this punch is a timing pseudo control rather than an
    /// intermediate course control.
    pub fn is_pseudo(&self) -> bool {
        matches!(self.control, START_CONTROL | FINISH_CONTROL | CHECK_CONTROL)
    }
}

/// First punch matching `control` in a card, if any.
pub fn find_punch(card: &[Punch], control: ControlId) -> Option<&Punch> {
    card.iter().find(|p| p.control == control)
}

/// The start punch time on a card, or `NO_TIME`.
pub fn start_punch_time(card: &[Punch]) -> TimeSecs {
    find_punch(card, START_CONTROL).map_or(NO_TIME, |p| p.time)
}

/// The finish punch time on a card, or `NO_TIME`.
pub fn finish_punch_time(card: &[Punch]) -> TimeSecs {
    find_punch(card, FINISH_CONTROL).map_or(NO_TIME, |p| p.time)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Vec<Punch> {
        vec![
            Punch::new(START_CONTROL, 600),
            Punch::new(ControlId(31), 750),
            Punch::new(ControlId(32), 910),
            Punch::new(FINISH_CONTROL, 1100),
        ]
    }

    #[test]
    fn find_intermediate_punch() {
        let card = card();
        let p = find_punch(&card, ControlId(32)).unwrap();
        assert_eq!(p.time, 910);
    }

    #[test]
    fn find_missing_punch() {
        assert!(find_punch(&card(), ControlId(99)).is_none());
    }

    #[test]
    fn start_and_finish_times() {
        let card = card();
        assert_eq!(start_punch_time(&card), 600);
        assert_eq!(finish_punch_time(&card), 1100);
    }

    #[test]
    fn missing_start_is_no_time() {
        let card = vec![Punch::new(ControlId(31), 750)];
        assert_eq!(start_punch_time(&card), NO_TIME);
    }

    #[test]
    fn pseudo_controls() {
        assert!(Punch::new(START_CONTROL, 1).is_pseudo());
        assert!(Punch::new(FINISH_CONTROL, 1).is_pseudo());
        assert!(!Punch::new(ControlId(31), 1).is_pseudo());
    }
}
