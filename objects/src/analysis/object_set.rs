use std::collections::{HashMap, HashSet};

use crate::{
    diagnostic::{Diagnostic, Label},
    ios::{
        NodeId, ObjectClassId, ObjectId, ObjectSetElement, ObjectSetId, ReferenceChain, Setting,
    },
};

use super::{AnalysisContext, CompilationTimestamp};

/// Objects gathered while flattening one object set
#[derive(Debug, Default)]
struct Collector {
    objects: Vec<ObjectId>,
    seen: HashSet<ObjectId>,
}

impl AnalysisContext<'_> {
    /// Check an object set and flatten it, following references to its
    /// definition.  A set already flattened keeps its list.
    pub fn check_object_set(&mut self, id: ObjectSetId, timestamp: CompilationTimestamp) {
        let mut chain = ReferenceChain::new();
        self.resolve_object_set(id, timestamp, &mut chain);
    }

    /// Check an object set and flatten it again, even if it has already been
    /// flattened.
    pub fn refresh_object_set(&mut self, id: ObjectSetId, timestamp: CompilationTimestamp) {
        let mut chain = ReferenceChain::new();
        let set = self.resolve_object_set(id, timestamp, &mut chain);
        self.collect(set, timestamp, &mut chain, true);
    }

    pub(super) fn check_object_set_definition(
        &mut self,
        id: ObjectSetId,
        timestamp: CompilationTimestamp,
        chain: &mut ReferenceChain,
    ) {
        let Some(def) = self.store.object_set_mut(id).as_definition_mut() else {
            return;
        };
        if def.last_checked.is_some_and(|last| last >= timestamp) {
            return;
        }
        def.last_checked = Some(timestamp);
        def.erroneous = false;
        log::debug!("checking object set `{}`", def.name);

        self.collect(id, timestamp, chain, false);
    }

    /// Parse the body of a set definition the first time it is needed
    fn parse_object_set_elements(&mut self, id: ObjectSetId) {
        let Some(def) = self.store.object_set_mut(id).as_definition_mut() else {
            return;
        };
        if def.elements.is_some() {
            return;
        }
        let governor = def.governing_class;
        let Some(block) = def.block.take() else {
            def.elements = Some(vec![]);
            return;
        };

        let parsed = self
            .parser
            .parse_object_set_elements(&mut *self.store, &block, governor);
        self.diagnostics.extend(parsed.errors);

        let (elements, extensible) = parsed.value.unwrap_or_default();
        if let Some(def) = self.store.object_set_mut(id).as_definition_mut() {
            def.elements = Some(elements);
            def.extensible = extensible;
        }
    }

    /// Flatten a set definition into the objects it contains, following
    /// nested sets, dropping repeated and erroneous objects and objects of
    /// the wrong class.
    fn collect(
        &mut self,
        id: ObjectSetId,
        timestamp: CompilationTimestamp,
        chain: &mut ReferenceChain,
        force: bool,
    ) {
        let Some(def) = self.store.object_set(id).as_definition() else {
            return;
        };
        if def.flattened.is_some() && !force {
            return;
        }
        let (name, location, governor) =
            (def.name.clone(), def.location.clone(), def.governing_class);

        let mark = chain.mark();
        if !chain.add(NodeId::ObjectSet(id)) {
            self.report_circular(&location, &name, chain);
            return;
        }

        let governor = self.check_class_in(governor, timestamp, chain);
        if self.store.class(governor).is_erroneous() {
            if let Some(def) = self.store.object_set_mut(id).as_definition_mut() {
                def.flattened = Some(vec![]);
                def.erroneous = true;
            }
            chain.release(mark);
            return;
        }

        self.parse_object_set_elements(id);
        let elements = self
            .store
            .object_set(id)
            .as_definition()
            .and_then(|def| def.elements.clone())
            .unwrap_or_default();

        let mut collector = Collector::default();
        for element in elements {
            match element {
                ObjectSetElement::Object(object) => {
                    let object = self.resolve_object(object, timestamp, chain);
                    self.collect_object(object, governor, &mut collector, timestamp, chain);
                }
                ObjectSetElement::Reference(set) => {
                    let set = self.resolve_object_set(set, timestamp, chain);
                    if set == ObjectSetId::ERRONEOUS {
                        continue;
                    }
                    if chain.contains(NodeId::ObjectSet(set)) {
                        let location = self.store.object_set(set).location().clone();
                        let name = self.store.object_set(set).name().to_string();
                        self.report_circular(&location, &name, chain);
                        continue;
                    }

                    let nested = self
                        .store
                        .object_set(set)
                        .as_definition()
                        .and_then(|def| def.flattened.clone())
                        .unwrap_or_default();
                    for object in nested {
                        self.collect_object(object, governor, &mut collector, timestamp, chain);
                    }
                }
            }
        }

        log::debug!("object set `{name}` has {} objects", collector.objects.len());
        if let Some(def) = self.store.object_set_mut(id).as_definition_mut() {
            def.flattened = Some(collector.objects);
        }
        chain.release(mark);

        self.check_unique_fields(id, governor);
    }

    /// Add one resolved object to a flattened set
    fn collect_object(
        &mut self,
        object: ObjectId,
        governor: ObjectClassId,
        collector: &mut Collector,
        timestamp: CompilationTimestamp,
        chain: &mut ReferenceChain,
    ) {
        if object == ObjectId::ERRONEOUS || self.store.object(object).is_erroneous() {
            return;
        }
        if collector.seen.contains(&object) {
            return;
        }

        let class = self.store.object(object).governing_class();
        if !self.same_class(governor, class, timestamp, chain) {
            let location = self.store.object(object).location().clone();
            let name = self.store.object(object).name().to_string();
            self.report_class_mismatch("E501", &location, governor, class, &name, "object");
            return;
        }

        collector.seen.insert(object);
        collector.objects.push(object);
    }

    /// Report objects of a flattened set that share a value for a `UNIQUE`
    /// field of the class.
    fn check_unique_fields(&mut self, id: ObjectSetId, governor: ObjectClassId) {
        let Some(objects) = self
            .store
            .object_set(id)
            .as_definition()
            .and_then(|def| def.flattened.as_ref())
        else {
            return;
        };
        let Some(class) = self.store.class(governor).as_definition() else {
            return;
        };

        for field in class.fields.iter().filter(|f| f.is_unique()) {
            let name = &field.identifier.name;
            let mut values = HashMap::new();

            for &object in objects {
                let Some(setting) = self
                    .store
                    .object(object)
                    .as_definition()
                    .and_then(|def| def.setting(name))
                else {
                    continue;
                };
                let Setting::Value(value) = &setting.setting else {
                    continue;
                };

                let text = value.text();
                match values.get(&text) {
                    Some(first) => self.diagnostics.report(
                        Diagnostic::error("E502")
                            .name(format!("duplicate value `{text}` for UNIQUE field `{name}`"))
                            .label(Label::at(first).message("first used here"))
                            .label(Label::at(&value.location).message("used again here")),
                    ),
                    None => {
                        values.insert(text, value.location.clone());
                    }
                }
            }
        }
    }

    /// Number of objects in a flattened object set, after following
    /// references.
    pub fn object_set_len(&self, set: ObjectSetId) -> usize {
        self.flattened(set).len()
    }

    /// The object at a position of a flattened object set
    pub fn object_set_get(&self, set: ObjectSetId, index: usize) -> Option<ObjectId> {
        self.flattened(set).get(index).copied()
    }

    /// Every object of a flattened object set, empty if it has not been
    /// checked.
    pub fn flattened(&self, set: ObjectSetId) -> &[ObjectId] {
        let set = self.resolved_object_set(set);
        self.store
            .object_set(set)
            .as_definition()
            .and_then(|def| def.flattened.as_deref())
            .unwrap_or_default()
    }

    /// Does the body of an object set contain an extension marker
    pub fn is_extensible(&self, set: ObjectSetId) -> bool {
        let set = self.resolved_object_set(set);
        self.store
            .object_set(set)
            .as_definition()
            .is_some_and(|def| def.extensible)
    }
}
