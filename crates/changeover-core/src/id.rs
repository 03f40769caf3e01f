use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies an individual runner (one competitor on one leg).
    pub struct RunnerId;

    /// Identifies a relay team.
    pub struct TeamId;

    /// Identifies a competition class (category with a leg topology).
    pub struct ClassId;

    /// Identifies a course (ordered control sequence).
    pub struct CourseId;
}

/// Identifies a club. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClubId(pub u32);

/// Identifies a timing control (punch unit code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ControlId(pub u32);

/// An electronic punch card number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardNumber(pub u32);
