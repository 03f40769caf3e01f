//! Competition classes and relay leg topology.
//!
//! A class carries one [`LegSpec`] per leg. The spec's leg type decides
//! how the leg's time relates to its neighbours (sequential, parallel,
//! cumulative, ignored, grouped); the start type decides how the leg's
//! start time is determined. Topology can be edited interactively, so
//! [`Class::set_legs`] validates on every apply and never leaves an
//! invalid topology in place.

use crate::revision::Revision;
use crate::time::TimeSecs;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Leg classification
// ---------------------------------------------------------------------------

/// How a leg's timing relates to neighbouring legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegType {
    /// Ordinary sequential leg.
    Normal,
    /// Own running time added to the previous cumulative time.
    Sum,
    /// Runs in parallel with the previous leg; the team waits for the
    /// slower branch.
    Parallel,
    /// Parallel leg that may be left unfilled.
    ParallelOptional,
    /// Alternate runner for a stage; the best finish among the
    /// contiguous extra run counts.
    Extra,
    /// Does not affect the team's time at all.
    Ignore,
    /// Leg time is supplied externally by a result module.
    Group,
}

impl LegType {
    /// Parallel with the preceding leg.
    pub fn is_parallel(self) -> bool {
        matches!(self, LegType::Parallel | LegType::ParallelOptional)
    }

    /// Skipped when walking the changeover chain (these legs neither
    /// feed nor consume a changeover).
    pub fn is_chain_transparent(self) -> bool {
        matches!(self, LegType::Ignore | LegType::Extra | LegType::Group)
    }

    /// Requires a preceding leg to attach to; invalid at index 0.
    pub fn needs_predecessor(self) -> bool {
        self.is_parallel() || self == LegType::Extra
    }
}

/// How a leg's start time is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartType {
    /// Externally fixed (drawn start list).
    Drawn,
    /// Fixed configured time, or the start punch when free starts are
    /// enabled.
    Time,
    /// Changeover: starts when an earlier leg's runner finishes.
    Change,
    /// Handicap start offset by the time behind the class leader.
    Pursuit,
}

// ---------------------------------------------------------------------------
// Leg specification
// ---------------------------------------------------------------------------

/// Per-leg configuration within a class.
///
/// `start_data` is overloaded the way start types need it:
/// - `Time`: the fixed start time.
/// - `Pursuit`: the pursuit base time.
/// - `Change`: when negative, `-k` means "probe the finish `k` legs
///   earlier" (chain-transparent legs skipped); otherwise the implicit
///   offset 1 applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegSpec {
    pub leg_type: LegType,
    pub start_type: StartType,
    #[serde(default)]
    pub start_data: i32,
    /// Catch-up start applied when the natural start would exceed the
    /// rope time (mass restart).
    #[serde(default)]
    pub restart_time: Option<TimeSecs>,
    /// Cutoff: a natural finish later than this (or missing) triggers
    /// the restart.
    #[serde(default)]
    pub rope_time: Option<TimeSecs>,
}

impl LegSpec {
    pub fn new(leg_type: LegType, start_type: StartType) -> Self {
        Self {
            leg_type,
            start_type,
            start_data: 0,
            restart_time: None,
            rope_time: None,
        }
    }

    pub fn with_start_data(mut self, start_data: i32) -> Self {
        self.start_data = start_data;
        self
    }

    pub fn with_restart(mut self, restart: TimeSecs, rope: TimeSecs) -> Self {
        self.restart_time = Some(restart);
        self.rope_time = Some(rope);
        self
    }
}

// ---------------------------------------------------------------------------
// Class
// ---------------------------------------------------------------------------

/// A competition class: leg topology plus scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    legs: Vec<LegSpec>,
    /// Rank by accumulated points first, time second.
    pub rogaining: bool,
    /// Tag of an external result module overriding the built-in formula.
    pub result_module: Option<String>,
    /// A start punch overrides the configured time on `Time` legs.
    pub free_start: bool,
    /// Whole class voided: every member ranks unplaced.
    pub invalid: bool,
    /// Rank unfinished-status runners with a recorded finish (live
    /// preliminary results).
    pub allow_preliminary: bool,
    /// Revision of the most recent mutation touching this class or any
    /// of its members. Maintained by `EventState`.
    pub(crate) data_revision: Revision,
}

/// Invalid leg topology. Fatal and user-facing: reported at the moment
/// the topology is applied, before anything is stored.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("leg 1 cannot be {0:?}: it requires a preceding leg")]
    LeadingDependentLeg(LegType),
    #[error("a class must have at least one leg")]
    Empty,
}

impl Class {
    /// New individual class: a single drawn-start leg.
    pub fn individual(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            legs: vec![LegSpec::new(LegType::Normal, StartType::Drawn)],
            rogaining: false,
            result_module: None,
            free_start: false,
            invalid: false,
            allow_preliminary: true,
            data_revision: Revision::NONE,
        }
    }

    /// New relay class with the given topology.
    pub fn relay(name: impl Into<String>, legs: Vec<LegSpec>) -> Result<Self, TopologyError> {
        let mut class = Self::individual(name);
        class.set_legs(legs)?;
        Ok(class)
    }

    /// Apply a new leg topology, validating it first. Runs on every
    /// apply; an invalid topology is rejected and the previous one kept.
    pub fn set_legs(&mut self, legs: Vec<LegSpec>) -> Result<(), TopologyError> {
        validate_legs(&legs)?;
        self.legs = legs;
        Ok(())
    }

    pub fn legs(&self) -> &[LegSpec] {
        &self.legs
    }

    pub fn leg(&self, index: usize) -> Option<&LegSpec> {
        self.legs.get(index)
    }

    /// Number of legs (stages).
    pub fn n_legs(&self) -> usize {
        self.legs.len()
    }

    /// Revision of the most recent mutation inside this class.
    pub fn data_revision(&self) -> Revision {
        self.data_revision
    }
}

fn validate_legs(legs: &[LegSpec]) -> Result<(), TopologyError> {
    match legs.first() {
        None => Err(TopologyError::Empty),
        Some(spec) if spec.leg_type.needs_predecessor() => {
            Err(TopologyError::LeadingDependentLeg(spec.leg_type))
        }
        Some(_) => Ok(()),
    }
}
