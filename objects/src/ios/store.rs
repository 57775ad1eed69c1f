//! Arena holding every class, object, object set and module known to the
//! compiler.

use std::collections::HashMap;

use crate::diagnostic::{Diagnostic, Label, Location};

use super::{
    class::ObjectClass,
    object::Object,
    object_set::ObjectSet,
    types::{Reference, Type, Value},
};

/// Reference to an object class in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectClassId(usize);

/// Reference to an object in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(usize);

/// Reference to an object set in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectSetId(usize);

/// Reference to a module in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ModuleId(usize);

/// Any node that can take part in a reference chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Class(ObjectClassId),
    Object(ObjectId),
    ObjectSet(ObjectSetId),
}

impl ObjectClassId {
    /// The shared erroneous class, an empty definition that never checks
    pub const ERRONEOUS: Self = Self(0);
}

impl ObjectId {
    /// The shared erroneous object
    pub const ERRONEOUS: Self = Self(0);
}

impl ObjectSetId {
    /// The shared erroneous object set, always empty
    pub const ERRONEOUS: Self = Self(0);
}

/// Destination for nodes created while parsing.  Parsers hand every class,
/// object and object set they create to a sink and keep the returned id.
pub trait NodeSink {
    fn add_class(&mut self, class: ObjectClass) -> ObjectClassId;

    fn add_object(&mut self, object: Object) -> ObjectId;

    fn add_object_set(&mut self, set: ObjectSet) -> ObjectSetId;
}

/// What an assignment defines
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentKind {
    ObjectClass(ObjectClassId),
    Object(ObjectId),
    ObjectSet(ObjectSetId),
    Type(Type),
    Value { ty: Type, value: Value },
    ValueSet { ty: Type, value: Value },
}

/// A single `name ... ::= ...` assignment in a module
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,

    /// Location of the assigned name
    pub location: Location,

    pub kind: AssignmentKind,
}

/// A single ASN.1 module
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub name: String,

    /// Location of the module name
    pub location: Location,

    /// Assignments in source order
    pub assignments: Vec<Assignment>,

    /// Assignment name to index into `assignments`
    names: HashMap<String, usize>,

    /// Imported symbol to the module it is imported from
    imports: HashMap<String, String>,
}

/// Storage for all nodes of the information object system
#[derive(Debug, Clone)]
pub struct Store {
    classes: Vec<ObjectClass>,
    objects: Vec<Object>,
    object_sets: Vec<ObjectSet>,
    modules: Vec<Module>,

    /// Module name to id, the first module with a name wins
    module_names: HashMap<String, ModuleId>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create a store containing only the erroneous sentinels
    pub fn new() -> Self {
        Store {
            classes: vec![ObjectClass::erroneous()],
            objects: vec![Object::erroneous()],
            object_sets: vec![ObjectSet::erroneous()],
            modules: vec![],
            module_names: HashMap::new(),
        }
    }

    pub fn class(&self, id: ObjectClassId) -> &ObjectClass {
        &self.classes[id.0]
    }

    pub fn class_mut(&mut self, id: ObjectClassId) -> &mut ObjectClass {
        &mut self.classes[id.0]
    }

    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.0]
    }

    pub fn object_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.0]
    }

    pub fn object_set(&self, id: ObjectSetId) -> &ObjectSet {
        &self.object_sets[id.0]
    }

    pub fn object_set_mut(&mut self, id: ObjectSetId) -> &mut ObjectSet {
        &mut self.object_sets[id.0]
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    /// Iterate over every module in the order they were added
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(idx, module)| (ModuleId(idx), module))
    }

    /// Find a module by its name
    pub fn module_by_name(&self, name: &str) -> Option<ModuleId> {
        self.module_names.get(name).copied()
    }

    /// Start a new module.  A second module with an existing name is still
    /// stored, but cannot be found by name, an error is returned describing
    /// the clash.
    pub(crate) fn add_module(
        &mut self,
        name: String,
        location: Location,
    ) -> (ModuleId, Option<Diagnostic>) {
        let id = ModuleId(self.modules.len());

        let error = match self.module_names.get(&name) {
            Some(&first) => Some(
                Diagnostic::error("E112")
                    .name(format!("duplicate definition of module `{name}`"))
                    .label(Label::at(&self.module(first).location).message("first defined here"))
                    .label(Label::at(&location).message("defined again here")),
            ),
            None => {
                self.module_names.insert(name.clone(), id);
                None
            }
        };

        self.modules.push(Module {
            name,
            location,
            ..Default::default()
        });

        (id, error)
    }

    /// Add an assignment to a module, returning an error if the name was
    /// already assigned in that module.  The first assignment keeps the name.
    pub(crate) fn add_assignment(
        &mut self,
        module: ModuleId,
        assignment: Assignment,
    ) -> Option<Diagnostic> {
        let module = &mut self.modules[module.0];

        if let Some(&first) = module.names.get(&assignment.name) {
            let first = &module.assignments[first];
            return Some(
                Diagnostic::error("E112")
                    .name(format!("duplicate assignment to `{}`", assignment.name))
                    .label(Label::at(&first.location).message("first assigned here"))
                    .label(Label::at(&assignment.location).message("assigned again here")),
            );
        }

        module
            .names
            .insert(assignment.name.clone(), module.assignments.len());
        module.assignments.push(assignment);

        None
    }

    /// Record that `symbol` is imported into `module` from `from`
    pub(crate) fn add_import(&mut self, module: ModuleId, symbol: String, from: String) {
        self.modules[module.0].imports.entry(symbol).or_insert(from);
    }

    /// Find the assignment a reference written inside `scope` names.  Names
    /// are looked up in the module itself, then in the module they are
    /// imported from; qualified references go straight to the named module.
    pub fn lookup(&self, scope: ModuleId, reference: &Reference) -> Option<&Assignment> {
        let module = match &reference.module {
            Some(name) => self.module(self.module_by_name(name)?),
            None => self.module(scope),
        };

        if let Some(assignment) = module.get(&reference.name) {
            return Some(assignment);
        }

        if reference.module.is_some() {
            return None;
        }

        let from = module.imports.get(&reference.name)?;
        log::trace!("`{}` imported from `{from}`", reference.name);
        self.module(self.module_by_name(from)?).get(&reference.name)
    }
}

impl Module {
    /// Get an assignment of this module by name
    pub fn get(&self, name: &str) -> Option<&Assignment> {
        self.names.get(name).map(|&idx| &self.assignments[idx])
    }
}

impl NodeSink for Store {
    fn add_class(&mut self, class: ObjectClass) -> ObjectClassId {
        self.classes.push(class);
        ObjectClassId(self.classes.len() - 1)
    }

    fn add_object(&mut self, object: Object) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    fn add_object_set(&mut self, set: ObjectSet) -> ObjectSetId {
        self.object_sets.push(set);
        ObjectSetId(self.object_sets.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::{compiler::SourceId, ios::types::TypeKind, ios::BuiltinType};

    use super::*;

    fn loc(start: usize) -> Location {
        Location::new(SourceId::new(0), start..start + 1)
    }

    fn type_assignment(name: &str, start: usize) -> Assignment {
        Assignment {
            name: name.to_string(),
            location: loc(start),
            kind: AssignmentKind::Type(Type {
                kind: TypeKind::Builtin(BuiltinType::Boolean),
                location: loc(start),
                constraint: None,
            }),
        }
    }

    fn reference(module: Option<&str>, name: &str) -> Reference {
        Reference {
            module: module.map(str::to_string),
            name: name.to_string(),
            location: loc(0),
        }
    }

    #[test]
    fn sentinels_are_erroneous() {
        let store = Store::new();
        assert!(store.class(ObjectClassId::ERRONEOUS).is_erroneous());
        assert!(store.object(ObjectId::ERRONEOUS).is_erroneous());
        assert!(store.object_set(ObjectSetId::ERRONEOUS).is_erroneous());
    }

    #[test]
    fn duplicate_assignment_keeps_first() {
        let mut store = Store::new();
        let (module, _) = store.add_module("M".into(), loc(0));
        assert!(store.add_assignment(module, type_assignment("T", 1)).is_none());

        let error = store.add_assignment(module, type_assignment("T", 5));
        let error = error.unwrap();
        assert_eq!(error.error_code, "E112");
        assert_eq!(error.labels.len(), 2);

        let found = store.lookup(module, &reference(None, "T")).unwrap();
        assert_eq!(found.location, loc(1));
    }

    #[test]
    fn lookup_follows_imports_and_qualified_names() {
        let mut store = Store::new();
        let (a, _) = store.add_module("A".into(), loc(0));
        let (b, _) = store.add_module("B".into(), loc(0));
        store.add_assignment(a, type_assignment("T", 1));
        store.add_import(b, "T".into(), "A".into());

        assert!(store.lookup(b, &reference(None, "T")).is_some());
        assert!(store.lookup(b, &reference(Some("A"), "T")).is_some());
        assert!(store.lookup(a, &reference(Some("B"), "T")).is_none());
        assert!(store.lookup(b, &reference(None, "U")).is_none());
    }
}
