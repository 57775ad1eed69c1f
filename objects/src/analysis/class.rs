use std::rc::Rc;

use crate::{
    diagnostic::Diagnostics,
    ios::{
        check_template, expand_version_brackets, FieldKind, FieldSpecifications, NodeId,
        ObjectClassId, ObjectId, ObjectSetId, ReferenceChain, Setting, SettingKind, SyntaxRoot,
    },
};

use super::{AnalysisContext, CompilationTimestamp};

/// Checks of a field that need the rest of the analysis context
#[derive(Debug, Clone, Copy)]
enum FieldWork {
    Object(ObjectClassId, Option<ObjectId>),
    ObjectSet(ObjectClassId, Option<ObjectSetId>),
}

impl AnalysisContext<'_> {
    /// Check an object class, following references to its definition
    pub fn check_class(&mut self, id: ObjectClassId, timestamp: CompilationTimestamp) {
        let mut chain = ReferenceChain::new();
        self.check_class_in(id, timestamp, &mut chain);
    }

    /// Resolve a class and check its definition, returning the definition
    pub(super) fn check_class_in(
        &mut self,
        id: ObjectClassId,
        timestamp: CompilationTimestamp,
        chain: &mut ReferenceChain,
    ) -> ObjectClassId {
        let definition = self.resolve_class(id, timestamp, chain);
        self.check_class_definition(definition, timestamp, chain);
        definition
    }

    fn check_class_definition(
        &mut self,
        id: ObjectClassId,
        timestamp: CompilationTimestamp,
        chain: &mut ReferenceChain,
    ) {
        let Some(def) = self.store.class_mut(id).as_definition_mut() else {
            return;
        };
        if def.last_checked.is_some_and(|last| last >= timestamp) {
            return;
        }
        def.last_checked = Some(timestamp);
        def.erroneous = def.parse_failed;
        log::debug!("checking object class `{}`", def.name);

        if let Some(block) = def.fields_block.take() {
            let (fields, errors) = self.parser.parse_field_spec_list(&mut *self.store, &block);
            let failed = !errors.is_empty();
            self.diagnostics.extend(errors);
            if let Some(def) = self.store.class_mut(id).as_definition_mut() {
                def.fields = fields;
                def.parse_failed = failed;
                def.erroneous = failed;
            }
        }

        let work = match self.store.class_mut(id).as_definition_mut() {
            Some(def) => {
                def.fields.check(timestamp, self.diagnostics);
                field_rules(&def.fields, self.diagnostics)
            }
            None => vec![],
        };

        // objects of this class may be parsed while checking the defaults
        self.build_syntax(id);

        for item in work {
            match item {
                FieldWork::Object(class, default) => {
                    self.resolve_class(class, timestamp, chain);
                    if let Some(default) = default {
                        self.resolve_object(default, timestamp, chain);
                    }
                }
                FieldWork::ObjectSet(class, default) => {
                    self.resolve_class(class, timestamp, chain);
                    if let Some(default) = default {
                        self.resolve_object_set(default, timestamp, chain);
                    }
                }
            }
        }
    }

    /// Build the object syntax of a class definition, once
    fn build_syntax(&mut self, id: ObjectClassId) {
        let Some(def) = self.store.class(id).as_definition() else {
            return;
        };
        if def.syntax.is_built {
            return;
        }

        let root = match &def.syntax_block {
            Some(block) => {
                let expanded = expand_version_brackets(block);
                let (nodes, errors) = self
                    .parser
                    .parse_object_class_syntax_fragment(&expanded, &def.fields);
                self.diagnostics.extend(errors);

                let root = SyntaxRoot::from_nodes(nodes);
                check_template(&root, &def.fields, &block.location, self.diagnostics);
                root
            }
            None => SyntaxRoot::default_syntax(&def.fields),
        };

        if let Some(def) = self.store.class_mut(id).as_definition_mut() {
            def.syntax = Rc::new(root);
        }
    }

    /// Check the settings of a parsed object against the fields of its
    /// class definition.
    pub(super) fn check_object_against_class(
        &mut self,
        object: ObjectId,
        class: ObjectClassId,
        timestamp: CompilationTimestamp,
        chain: &mut ReferenceChain,
    ) {
        let (Some(class_def), Some(object_def)) = (
            self.store.class(class).as_definition(),
            self.store.object(object).as_definition(),
        ) else {
            return;
        };

        let mut missing = false;
        let mut nested = vec![];
        for field in class_def.fields.iter() {
            let name = &field.identifier.name;
            match object_def.setting(name) {
                Some(setting) if !setting.setting.matches_kind(field.setting_kind()) => {
                    self.diagnostics.report_error(
                        "E306",
                        &setting.identifier.location,
                        format!(
                            "{} setting was expected for field `{name}`",
                            Setting::describe(field.setting_kind())
                        ),
                    );
                }
                Some(setting) => match setting.setting {
                    Setting::Object(id) => nested.push(NodeId::Object(id)),
                    Setting::ObjectSet(id) => nested.push(NodeId::ObjectSet(id)),
                    _ => {}
                },
                None if !field.may_be_omitted() => {
                    self.diagnostics.report_error(
                        "E305",
                        &object_def.block.location,
                        format!("missing setting for field `{name}`"),
                    );
                    missing = true;
                }
                None => {}
            }
        }

        for setting in object_def.settings.iter().flatten() {
            class_def.fields.lookup_by_id(
                &setting.identifier.name,
                &setting.identifier.location,
                self.diagnostics,
            );
        }

        if missing {
            if let Some(def) = self.store.object_mut(object).as_definition_mut() {
                def.erroneous = true;
            }
        }

        for node in nested {
            match node {
                NodeId::Object(id) => {
                    self.resolve_object(id, timestamp, chain);
                }
                NodeId::ObjectSet(id) => {
                    self.resolve_object_set(id, timestamp, chain);
                }
                NodeId::Class(_) => {}
            }
        }
    }

    /// The fields of a class, following references to its definition
    pub fn field_specifications(&self, class: ObjectClassId) -> &FieldSpecifications {
        let class = self.resolved_class(class);
        match self.store.class(class).as_definition() {
            Some(def) => &def.fields,
            None => unreachable!("classes always resolve to a definition"),
        }
    }

    /// The object syntax of a class, checking the class first
    pub fn syntax(&mut self, class: ObjectClassId, timestamp: CompilationTimestamp) -> Rc<SyntaxRoot> {
        let mut chain = ReferenceChain::new();
        let class = self.check_class_in(class, timestamp, &mut chain);
        match self.store.class(class).as_definition() {
            Some(def) => Rc::clone(&def.syntax),
            None => Rc::new(SyntaxRoot::from_nodes(vec![])),
        }
    }

    /// The kind of setting a field of a class takes, `None` for unknown fields
    pub fn field_setting_kind(&self, class: ObjectClassId, field: &str) -> Option<SettingKind> {
        self.field_specifications(class)
            .get(field)
            .map(|f| f.setting_kind())
    }
}

/// Report fields that break the rules of their kind, and collect the
/// checks that need to resolve other nodes.
fn field_rules(fields: &FieldSpecifications, diagnostics: &mut Diagnostics) -> Vec<FieldWork> {
    let mut work = vec![];

    for field in fields.iter() {
        match &field.kind {
            FieldKind::VariableTypeValue { type_field, .. }
            | FieldKind::VariableTypeValueSet { type_field, .. } => {
                let is_type = fields
                    .get(&type_field.name)
                    .is_some_and(|f| matches!(f.kind, FieldKind::Type { .. }));
                if !is_type {
                    diagnostics.report_error(
                        "E204",
                        &type_field.location,
                        format!("`{type_field}` is not a type field of this class"),
                    );
                }
            }
            FieldKind::FixedTypeValue {
                unique: true,
                default: Some(_),
                ..
            } => diagnostics.report_error(
                "E205",
                &field.identifier.location,
                format!(
                    "`{}` is UNIQUE and cannot have a default",
                    field.identifier
                ),
            ),
            FieldKind::Object { class, default } => {
                work.push(FieldWork::Object(*class, *default));
            }
            FieldKind::ObjectSet { class, default } => {
                work.push(FieldWork::ObjectSet(*class, *default));
            }
            _ => {}
        }
    }

    work
}
