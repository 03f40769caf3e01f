//! Pluggable per-class scoring formulas ("result modules").
//!
//! Classes carrying a result-module tag route their members to an
//! externally registered [`ResultModule`] instead of the built-in
//! formula. Modules receive mutable entity state and are expected to
//! fill in the members' computed fields, stamped at the context
//! revision. A module that needs the standard computation as a starting
//! point must use the non-reentrant default entry points in
//! [`crate::results`]; re-entering the module-routed path is a
//! programming error.

use crate::event::EventState;
use crate::id::{ClassId, RunnerId, TeamId};
use crate::results::ResultType;
use crate::revision::Revision;

// ---------------------------------------------------------------------------
// ResultContext
// ---------------------------------------------------------------------------

/// Context passed to result modules for one recompute pass.
#[derive(Debug, Clone, Copy)]
pub struct ResultContext {
    /// The result category being computed.
    pub result_type: ResultType,
    /// Revision to stamp computed fields with.
    pub revision: Revision,
}

// ---------------------------------------------------------------------------
// ResultModule trait
// ---------------------------------------------------------------------------

/// An externally defined, tag-addressable scoring formula.
///
/// Both methods default to "nothing to do", so a module only overrides
/// the direction it cares about.
pub trait ResultModule: std::fmt::Debug {
    /// The tag classes use to select this module.
    fn tag(&self) -> &str;

    /// Compute individual results for the given class members, writing
    /// computed fields (time/status/points/place) stamped at
    /// `ctx.revision`.
    fn individual_results(
        &self,
        state: &mut EventState,
        class: ClassId,
        runners: &[RunnerId],
        ctx: &ResultContext,
    ) -> Result<(), ModuleError> {
        let _ = (state, class, runners, ctx);
        Ok(())
    }

    /// Compute team results for the given class members.
    fn team_results(
        &self,
        state: &mut EventState,
        class: ClassId,
        teams: &[TeamId],
        ctx: &ResultContext,
    ) -> Result<(), ModuleError> {
        let _ = (state, class, teams, ctx);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registered result modules, resolved by tag once per recompute pass.
#[derive(Debug, Default)]
pub struct ResultModuleRegistry {
    modules: Vec<Box<dyn ResultModule>>,
}

impl ResultModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. A later registration with the same tag wins.
    pub fn register(&mut self, module: Box<dyn ResultModule>) {
        self.modules.push(module);
    }

    /// Resolve a tag. `None` is a fatal lookup error at the call site.
    pub fn get(&self, tag: &str) -> Option<&dyn ResultModule> {
        self.modules
            .iter()
            .rev()
            .find(|m| m.tag() == tag)
            .map(|m| m.as_ref())
    }
}

// ---------------------------------------------------------------------------
// ModuleError
// ---------------------------------------------------------------------------

/// Errors surfaced by result modules.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// The module's own computation failed.
    #[error("result module failed: {0}")]
    Failed(String),
    /// The module needs entity data that is absent.
    #[error("missing data: {0}")]
    MissingData(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NoopModule {
        tag: &'static str,
    }

    impl ResultModule for NoopModule {
        fn tag(&self) -> &str {
            self.tag
        }
    }

    #[test]
    fn registry_lookup_by_tag() {
        let mut registry = ResultModuleRegistry::new();
        registry.register(Box::new(NoopModule { tag: "league" }));
        registry.register(Box::new(NoopModule { tag: "knockout" }));

        assert!(registry.get("league").is_some());
        assert!(registry.get("knockout").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn later_registration_wins() {
        #[derive(Debug)]
        struct Tagged(&'static str, u32);
        impl ResultModule for Tagged {
            fn tag(&self) -> &str {
                self.0
            }
        }
        let mut registry = ResultModuleRegistry::new();
        registry.register(Box::new(Tagged("league", 1)));
        registry.register(Box::new(Tagged("league", 2)));
        let found = registry.get("league").unwrap();
        assert!(format!("{found:?}").contains('2'));
    }

    #[test]
    fn default_methods_are_noops() {
        let module = NoopModule { tag: "noop" };
        let mut state = EventState::new();
        let ctx = ResultContext {
            result_type: ResultType::ClassDefault,
            revision: Revision(1),
        };
        assert!(
            module
                .individual_results(&mut state, ClassId::default(), &[], &ctx)
                .is_ok()
        );
        assert!(
            module
                .team_results(&mut state, ClassId::default(), &[], &ctx)
                .is_ok()
        );
    }

    #[test]
    fn module_error_messages() {
        let msg = format!("{}", ModuleError::Failed("bad table".into()));
        assert!(msg.contains("result module failed"), "got: {msg}");
        let msg = format!("{}", ModuleError::MissingData("no course".into()));
        assert!(msg.contains("missing data"), "got: {msg}");
    }
}
