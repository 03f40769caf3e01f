//! Revision clock and versioned computed fields.
//!
//! Every mutation to a runner, team, punch, or class bumps the global
//! [`RevisionClock`]. Computed fields are wrapped in [`Versioned`] and
//! stamped with the revision at which they were computed; a field is
//! stale when its stamp falls behind the data revision of its ranking
//! group. There is no targeted invalidation: staleness is purely a
//! revision comparison, and a recompute always covers the whole group.

use serde::{Deserialize, Serialize};

/// A point on the global mutation timeline.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Revision(pub u64);

impl Revision {
    /// Sentinel for "never computed". The clock starts above this.
    pub const NONE: Revision = Revision(0);
}

/// Process-wide monotonically increasing counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionClock {
    current: Revision,
}

impl Default for RevisionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionClock {
    /// Create a clock one tick past [`Revision::NONE`], so freshly
    /// constructed `Versioned` fields are always stale.
    pub fn new() -> Self {
        Self {
            current: Revision(1),
        }
    }

    /// The current revision.
    pub fn current(&self) -> Revision {
        self.current
    }

    /// Advance the clock. Returns the new revision.
    pub fn bump(&mut self) -> Revision {
        self.current.0 += 1;
        self.current
    }
}

/// A computed value stamped with the revision at which it was computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    value: T,
    revision: Revision,
}

impl<T> Versioned<T> {
    /// Wrap an initial value, stamped as never computed.
    pub fn new(value: T) -> Self {
        Self {
            value,
            revision: Revision::NONE,
        }
    }

    /// The value if it was computed at or after `required`, else `None`.
    pub fn get(&self, required: Revision) -> Option<&T> {
        if self.is_stale(required) {
            None
        } else {
            Some(&self.value)
        }
    }

    /// Whether the stamp falls behind `required` (or was never set).
    pub fn is_stale(&self, required: Revision) -> bool {
        self.revision == Revision::NONE || self.revision < required
    }

    /// Store a recomputed value with its stamp.
    pub fn set(&mut self, value: T, computed_at: Revision) {
        self.value = value;
        self.revision = computed_at;
    }

    /// The stamp itself. `Revision::NONE` means never computed.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// The raw value, regardless of staleness. For display paths that
    /// prefer an outdated value over nothing.
    pub fn value_unchecked(&self) -> &T {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_past_none() {
        let clock = RevisionClock::new();
        assert!(clock.current() > Revision::NONE);
    }

    #[test]
    fn bump_is_monotonic() {
        let mut clock = RevisionClock::new();
        let a = clock.current();
        let b = clock.bump();
        let c = clock.bump();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn fresh_value_is_stale() {
        let v: Versioned<i32> = Versioned::new(0);
        assert!(v.is_stale(Revision(1)));
        assert!(v.get(Revision(1)).is_none());
    }

    #[test]
    fn set_then_get_at_same_revision() {
        let mut v = Versioned::new(0);
        v.set(42, Revision(5));
        assert_eq!(v.get(Revision(5)), Some(&42));
        assert_eq!(v.get(Revision(3)), Some(&42));
    }

    #[test]
    fn stale_after_newer_requirement() {
        let mut v = Versioned::new(0);
        v.set(42, Revision(5));
        assert!(v.is_stale(Revision(6)));
        assert!(v.get(Revision(6)).is_none());
    }

    #[test]
    fn value_unchecked_ignores_staleness() {
        let mut v = Versioned::new(0);
        v.set(7, Revision(2));
        assert_eq!(*v.value_unchecked(), 7);
        assert!(v.is_stale(Revision(100)));
        assert_eq!(*v.value_unchecked(), 7);
    }

    #[test]
    fn stamp_unchanged_without_recompute() {
        let mut v = Versioned::new(0);
        v.set(42, Revision(5));
        let stamp = v.revision();
        // Reading must not move the stamp.
        let _ = v.get(Revision(5));
        let _ = v.is_stale(Revision(9));
        assert_eq!(v.revision(), stamp);
    }
}
