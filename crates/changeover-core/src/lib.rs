//! Changeover Core -- the result and ranking engine for timed events.
//!
//! This crate computes competitive places, running times, statuses, and
//! point scores for individual runners and relay teams, across several
//! result categories (per-class, multi-stage total, per-course) and relay
//! leg topologies (sequential, parallel, cumulative, ignored, grouped).
//! It also produces preliminary intermediate-control standings from punch
//! data for live displays.
//!
//! # Revision-Cached Computation
//!
//! Every mutation to a runner, team, punch, or class bumps a global
//! revision counter ([`revision::RevisionClock`]) and records the new
//! revision on the affected class. Computed fields are wrapped in
//! [`revision::Versioned`] and lazily recomputed on read when their stamp
//! falls behind the class's data revision. Recomputation always covers a
//! whole ranking group, never a single entity.
//!
//! # Key Types
//!
//! - [`event::EventState`] -- Entity storage (runners, teams, classes,
//!   courses) with a revision-bumping mutation API.
//! - [`rank`] -- Grouped skip-ranking: ties share a place, the next
//!   strictly worse score gets `count of at-or-better + 1`.
//! - [`results::ResultEngine`] -- Per-runner and per-team result
//!   computation, with pluggable per-class scoring via [`module::ResultModule`].
//! - [`relay`] -- The leg-type/start-type state machine that propagates
//!   start times, running times, and statuses along a team's legs.
//! - [`splits::SplitResultEngine`] -- Incremental per-control standings
//!   for live/preliminary results.

pub mod class;
pub mod course;
pub mod event;
pub mod id;
#[cfg(feature = "data-loader")]
pub mod loader;
pub mod module;
pub mod punch;
pub mod rank;
pub mod relay;
pub mod results;
pub mod revision;
pub mod runner;
pub mod splits;
pub mod status;
pub mod team;
pub mod time;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
