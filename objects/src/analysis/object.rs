use std::rc::Rc;

use crate::ios::{
    FieldKind, FieldSetting, ObjectClassId, ObjectId, ObjectSyntaxParser, ReferenceChain, Setting,
};

use super::{AnalysisContext, CompilationTimestamp};

impl AnalysisContext<'_> {
    /// Check an object, following references to its definition
    pub fn check_object(&mut self, id: ObjectId, timestamp: CompilationTimestamp) {
        let mut chain = ReferenceChain::new();
        self.resolve_object(id, timestamp, &mut chain);
    }

    /// Check an object definition: resolve its class, parse its body the
    /// first time, then check its settings against the class.
    pub(super) fn check_object_definition(
        &mut self,
        id: ObjectId,
        timestamp: CompilationTimestamp,
        chain: &mut ReferenceChain,
    ) {
        let Some(def) = self.store.object_mut(id).as_definition_mut() else {
            return;
        };
        if def.last_checked.is_some_and(|last| last >= timestamp) {
            return;
        }
        def.last_checked = Some(timestamp);
        def.erroneous = false;
        let governor = def.governing_class;
        log::debug!("checking object `{}`", def.name);

        let class = self.check_class_in(governor, timestamp, chain);
        if self.store.class(class).is_erroneous() {
            self.mark_object_erroneous(id);
            return;
        }

        let needs_parse = self
            .store
            .object(id)
            .as_definition()
            .is_some_and(|def| def.settings.is_none());
        if needs_parse {
            self.parse_object(id, class);
        }

        let Some(def) = self.store.object_mut(id).as_definition_mut() else {
            return;
        };
        def.index_settings(self.diagnostics);
        if def.parse_failed {
            def.erroneous = true;
            return;
        }

        self.check_object_against_class(id, class, timestamp, chain);
    }

    /// Read the settings of an object from its body using the syntax of its
    /// class definition.
    fn parse_object(&mut self, id: ObjectId, class: ObjectClassId) {
        let (syntax, class_name) = match self.store.class(class).as_definition() {
            Some(def) => (Rc::clone(&def.syntax), def.name.clone()),
            None => return,
        };
        let Some(block) = self
            .store
            .object(id)
            .as_definition()
            .map(|def| def.block.clone())
        else {
            return;
        };

        let parsed =
            ObjectSyntaxParser::new(&block, self.parser, &mut *self.store).parse(&syntax, &class_name);
        log::trace!(
            "parsed {} settings for object {id:?}, success: {}",
            parsed.settings.len(),
            parsed.success
        );
        self.diagnostics.extend(parsed.errors);

        if let Some(def) = self.store.object_mut(id).as_definition_mut() {
            def.settings = Some(parsed.settings);
            def.parse_failed = !parsed.success;
        }
    }

    fn mark_object_erroneous(&mut self, id: ObjectId) {
        if let Some(def) = self.store.object_mut(id).as_definition_mut() {
            def.erroneous = true;
        }
    }

    /// Has the object, after following references, got a setting for a field
    pub fn has_setting(&self, object: ObjectId, field: &str) -> bool {
        self.setting(object, field).is_some()
    }

    /// The setting an object gives a field, after following references
    pub fn setting(&self, object: ObjectId, field: &str) -> Option<&Setting> {
        let object = self.resolved_object(object);
        let def = self.store.object(object).as_definition()?;
        def.setting(field).map(|s| &s.setting)
    }

    /// The setting an object gives a field, or the default declared for the
    /// field by the class of the object.
    pub fn setting_or_default(&self, object: ObjectId, field: &str) -> Option<Setting> {
        if let Some(setting) = self.setting(object, field) {
            return Some(setting.clone());
        }

        let object = self.resolved_object(object);
        let class = self.store.object(object).governing_class();
        let field = self.field_specifications(class).get(field)?;

        match &field.kind {
            FieldKind::Type { default } => default.clone().map(Setting::Type),
            FieldKind::FixedTypeValue { default, .. }
            | FieldKind::VariableTypeValue { default, .. } => default.clone().map(Setting::Value),
            FieldKind::FixedTypeValueSet { default, .. }
            | FieldKind::VariableTypeValueSet { default, .. } => {
                default.clone().map(Setting::ValueSet)
            }
            FieldKind::Object { default, .. } => default.map(Setting::Object),
            FieldKind::ObjectSet { default, .. } => default.map(Setting::ObjectSet),
            FieldKind::Erroneous => None,
        }
    }

    /// Every setting of an object in the order written, after following
    /// references.  Empty for objects that have not been parsed.
    pub fn settings(&self, object: ObjectId) -> &[FieldSetting] {
        let object = self.resolved_object(object);
        self.store
            .object(object)
            .as_definition()
            .and_then(|def| def.settings.as_deref())
            .unwrap_or_default()
    }

    /// Did the object, after following references, fail its check
    pub fn is_object_erroneous(&self, object: ObjectId) -> bool {
        self.store.object(self.resolved_object(object)).is_erroneous()
    }
}
