//! Checking and resolution of classes, objects and object sets

mod class;
mod object;
mod object_set;
mod resolve;

use crate::{
    diagnostic::Diagnostics,
    ios::{AssignmentKind, ModuleId, Store, SubParser},
};

/// Opaque, totally ordered stamp issued by the caller for each check pass.
/// A node checked at a timestamp is not checked again at the same or an
/// earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompilationTimestamp(u64);

impl CompilationTimestamp {
    /// Later than any timestamp a caller can issue
    pub(crate) const MAX: Self = Self(u64::MAX);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The timestamp after this one
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Data used and produced by checking the information object system
#[derive(Debug)]
pub struct AnalysisContext<'a> {
    pub(crate) store: &'a mut Store,

    /// Parser for token blocks kept by the store
    pub(crate) parser: &'a dyn SubParser,

    pub diagnostics: &'a mut Diagnostics,
}

impl<'a> AnalysisContext<'a> {
    pub(crate) fn new(
        store: &'a mut Store,
        parser: &'a dyn SubParser,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            store,
            parser,
            diagnostics,
        }
    }

    /// Check every class, object and object set assigned in every module
    pub fn check_all(&mut self, timestamp: CompilationTimestamp) {
        self.diagnostics.begin_pass();

        let modules: Vec<ModuleId> = self.store.modules().map(|(id, _)| id).collect();
        for module in modules {
            log::debug!("checking module `{}`", self.store.module(module).name);

            let count = self.store.module(module).assignments.len();
            for idx in 0..count {
                match self.store.module(module).assignments[idx].kind {
                    AssignmentKind::ObjectClass(id) => self.check_class(id, timestamp),
                    AssignmentKind::Object(id) => self.check_object(id, timestamp),
                    AssignmentKind::ObjectSet(id) => self.check_object_set(id, timestamp),
                    AssignmentKind::Type(_)
                    | AssignmentKind::Value { .. }
                    | AssignmentKind::ValueSet { .. } => {}
                }
            }
        }
    }

    /// The node store being checked
    pub fn store(&self) -> &Store {
        self.store
    }
}
