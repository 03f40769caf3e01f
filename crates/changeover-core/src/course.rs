//! Courses: the ordered control sequence a runner is expected to punch.

use crate::id::ControlId;
use serde::{Deserialize, Serialize};

/// A course definition. The control list excludes the start and finish
/// pseudo controls; those are implicit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    pub controls: Vec<ControlId>,
}

impl Course {
    pub fn new(name: impl Into<String>, controls: Vec<ControlId>) -> Self {
        Self {
            name: name.into(),
            controls,
        }
    }
}
