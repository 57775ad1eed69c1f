//! Following references to classes, objects and object sets through the
//! assignments of the store.

use std::fmt::Display;

use crate::{
    diagnostic::Location,
    ios::{
        AssignmentKind, ModuleId, NodeId, Object, ObjectClass, ObjectClassId, ObjectId,
        ObjectSet, ObjectSetId, Reference, ReferenceChain,
    },
};

use super::{AnalysisContext, CompilationTimestamp};

/// The kind of assignment a reference should name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expected {
    Class,
    Object,
    ObjectSet,
}

impl Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Class => write!(f, "an object class"),
            Expected::Object => write!(f, "an object"),
            Expected::ObjectSet => write!(f, "an object set"),
        }
    }
}

impl AnalysisContext<'_> {
    /// Find the node an assignment reference names, reporting a missing name
    /// or an assignment of the wrong kind.
    fn lookup_node(
        &mut self,
        scope: ModuleId,
        reference: &Reference,
        expected: Expected,
    ) -> Option<NodeId> {
        let Some(assignment) = self.store.lookup(scope, reference) else {
            self.diagnostics.report_singular_error(
                "E401",
                &reference.location,
                format!("there is no assignment named `{reference}`"),
            );
            return None;
        };

        match (&assignment.kind, expected) {
            (AssignmentKind::ObjectClass(id), Expected::Class) => Some(NodeId::Class(*id)),
            (AssignmentKind::Object(id), Expected::Object) => Some(NodeId::Object(*id)),
            (AssignmentKind::ObjectSet(id), Expected::ObjectSet) => Some(NodeId::ObjectSet(*id)),
            _ => {
                self.diagnostics.report_singular_error(
                    "E403",
                    &reference.location,
                    format!("`{reference}` does not name {expected}"),
                );
                None
            }
        }
    }

    /// Report a circular reference found at `location`, if this chain has not
    /// reported one yet.
    pub(super) fn report_circular(
        &mut self,
        location: &Location,
        name: &str,
        chain: &mut ReferenceChain,
    ) {
        if chain.should_report() {
            self.diagnostics.report_error(
                "E402",
                location,
                format!("circular reference to `{name}`"),
            );
        }
    }

    /// Follow a class through any references to its definition.  Broken
    /// references resolve to the erroneous class.  The definition itself is
    /// not checked.
    pub fn resolve_class(
        &mut self,
        id: ObjectClassId,
        timestamp: CompilationTimestamp,
        chain: &mut ReferenceChain,
    ) -> ObjectClassId {
        let ObjectClass::Referenced(class) = self.store.class(id) else {
            return id;
        };
        if let Some((resolved, at)) = class.resolved {
            if at >= timestamp {
                return resolved;
            }
        }
        let (reference, scope) = (class.reference.clone(), class.scope);

        let mark = chain.mark();
        if !chain.add(NodeId::Class(id)) {
            self.report_circular(&reference.location, &reference.name, chain);
            return ObjectClassId::ERRONEOUS;
        }

        let resolved = match self.lookup_node(scope, &reference, Expected::Class) {
            Some(NodeId::Class(target)) => self.resolve_class(target, timestamp, chain),
            _ => ObjectClassId::ERRONEOUS,
        };
        chain.release(mark);

        log::trace!("class `{reference}` resolved to {resolved:?}");
        if let ObjectClass::Referenced(class) = self.store.class_mut(id) {
            class.resolved = Some((resolved, timestamp));
        }

        resolved
    }

    /// Follow an object through any references to its definition and check
    /// the definition.  A referenced object of a different class than the
    /// reference expects resolves to the erroneous object.
    pub fn resolve_object(
        &mut self,
        id: ObjectId,
        timestamp: CompilationTimestamp,
        chain: &mut ReferenceChain,
    ) -> ObjectId {
        let object = match self.store.object(id) {
            Object::Definition(_) => {
                self.check_object_definition(id, timestamp, chain);
                return id;
            }
            Object::Referenced(object) => object,
        };
        if let Some((resolved, at)) = object.resolved {
            if at >= timestamp {
                return resolved;
            }
        }
        let (reference, scope, expected) =
            (object.reference.clone(), object.scope, object.governing_class);

        let mark = chain.mark();
        if !chain.add(NodeId::Object(id)) {
            self.report_circular(&reference.location, &reference.name, chain);
            return ObjectId::ERRONEOUS;
        }

        let mut resolved = match self.lookup_node(scope, &reference, Expected::Object) {
            Some(NodeId::Object(target)) => self.resolve_object(target, timestamp, chain),
            _ => ObjectId::ERRONEOUS,
        };

        if resolved != ObjectId::ERRONEOUS {
            let actual = self.store.object(resolved).governing_class();
            if !self.same_class(expected, actual, timestamp, chain) {
                self.report_class_mismatch(
                    "E404",
                    &reference.location,
                    expected,
                    actual,
                    &reference.to_string(),
                    "object",
                );
                resolved = ObjectId::ERRONEOUS;
            }
        }
        chain.release(mark);

        if let Object::Referenced(object) = self.store.object_mut(id) {
            object.resolved = Some((resolved, timestamp));
        }

        resolved
    }

    /// Follow an object set through any references to its definition and
    /// check the definition.  A referenced set of a different class than the
    /// reference expects resolves to the erroneous set.
    pub fn resolve_object_set(
        &mut self,
        id: ObjectSetId,
        timestamp: CompilationTimestamp,
        chain: &mut ReferenceChain,
    ) -> ObjectSetId {
        let set = match self.store.object_set(id) {
            ObjectSet::Definition(_) => {
                self.check_object_set_definition(id, timestamp, chain);
                return id;
            }
            ObjectSet::Referenced(set) => set,
        };
        if let Some((resolved, at)) = set.resolved {
            if at >= timestamp {
                return resolved;
            }
        }
        let (reference, scope, expected) = (set.reference.clone(), set.scope, set.governing_class);

        let mark = chain.mark();
        if !chain.add(NodeId::ObjectSet(id)) {
            self.report_circular(&reference.location, &reference.name, chain);
            return ObjectSetId::ERRONEOUS;
        }

        let mut resolved = match self.lookup_node(scope, &reference, Expected::ObjectSet) {
            Some(NodeId::ObjectSet(target)) => self.resolve_object_set(target, timestamp, chain),
            _ => ObjectSetId::ERRONEOUS,
        };

        if resolved != ObjectSetId::ERRONEOUS {
            let actual = self.store.object_set(resolved).governing_class();
            if !self.same_class(expected, actual, timestamp, chain) {
                self.report_class_mismatch(
                    "E405",
                    &reference.location,
                    expected,
                    actual,
                    &reference.to_string(),
                    "object set",
                );
                resolved = ObjectSetId::ERRONEOUS;
            }
        }
        chain.release(mark);

        if let ObjectSet::Referenced(set) = self.store.object_set_mut(id) {
            set.resolved = Some((resolved, timestamp));
        }

        resolved
    }

    /// Do two classes resolve to the same definition.  Erroneous classes
    /// match anything, their errors have already been reported.
    pub(super) fn same_class(
        &mut self,
        expected: ObjectClassId,
        actual: ObjectClassId,
        timestamp: CompilationTimestamp,
        chain: &mut ReferenceChain,
    ) -> bool {
        let expected = self.resolve_class(expected, timestamp, chain);
        let actual = self.resolve_class(actual, timestamp, chain);

        expected == actual
            || self.store.class(expected).is_erroneous()
            || self.store.class(actual).is_erroneous()
    }

    /// Report a node of one class being used where another class is expected
    pub(super) fn report_class_mismatch(
        &mut self,
        code: &str,
        location: &Location,
        expected: ObjectClassId,
        actual: ObjectClassId,
        name: &str,
        what: &str,
    ) {
        let expected = self.resolved_class(expected);
        let actual = self.resolved_class(actual);
        let message = format!(
            "{what}s of objectclass `{}` expected; `{name}` is {what} of class `{}`",
            self.store.class(expected).name(),
            self.store.class(actual).name()
        );
        self.diagnostics.report_error(code, location, message);
    }

    /// The definition a class resolved to in the last check, without
    /// resolving anything new.
    pub fn resolved_class(&self, mut id: ObjectClassId) -> ObjectClassId {
        // a chain of cached references never loops, cycles resolve to the
        // erroneous class
        while let ObjectClass::Referenced(class) = self.store.class(id) {
            match class.resolved {
                Some((target, _)) => id = target,
                None => return ObjectClassId::ERRONEOUS,
            }
        }
        id
    }

    /// The definition an object resolved to in the last check
    pub fn resolved_object(&self, mut id: ObjectId) -> ObjectId {
        while let Object::Referenced(object) = self.store.object(id) {
            match object.resolved {
                Some((target, _)) => id = target,
                None => return ObjectId::ERRONEOUS,
            }
        }
        id
    }

    /// The definition an object set resolved to in the last check
    pub fn resolved_object_set(&self, mut id: ObjectSetId) -> ObjectSetId {
        while let ObjectSet::Referenced(set) = self.store.object_set(id) {
            match set.resolved {
                Some((target, _)) => id = target,
                None => return ObjectSetId::ERRONEOUS,
            }
        }
        id
    }
}
