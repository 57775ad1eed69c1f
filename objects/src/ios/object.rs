use std::collections::HashMap;

use crate::{
    analysis::CompilationTimestamp,
    diagnostic::{Diagnostic, Diagnostics, Label, Location},
    token::TokenBlock,
};

use super::{
    field::SettingKind,
    store::{ModuleId, ObjectClassId, ObjectId, ObjectSetId},
    types::{Identifier, Reference, Type, Value},
};

/// An information object, written out or named through a reference
#[derive(Debug, Clone)]
pub enum Object {
    Definition(ObjectDefinition),
    Referenced(ObjectReference),
}

/// `{ ... }` written against a governing class
#[derive(Debug, Clone)]
pub struct ObjectDefinition {
    /// Assignment name, or the body text for objects written inline
    pub name: String,

    pub governing_class: ObjectClassId,

    /// The body tokens, parsed on the first check
    pub(crate) block: TokenBlock,

    /// Settings in the order they were written, `None` until parsed
    pub settings: Option<Vec<FieldSetting>>,

    /// Field name to position in `settings`
    index: HashMap<String, usize>,

    /// The body did not match the syntax of the class
    pub(crate) parse_failed: bool,

    pub erroneous: bool,

    pub(crate) last_checked: Option<CompilationTimestamp>,
}

/// An object written as the name of another object
#[derive(Debug, Clone)]
pub struct ObjectReference {
    /// Assignment name, or the reference text for inline references
    pub name: String,

    /// Class the referenced object is expected to have
    pub governing_class: ObjectClassId,

    pub reference: Reference,

    /// Module the reference was written in
    pub scope: ModuleId,

    pub(crate) resolved: Option<(ObjectId, CompilationTimestamp)>,
}

/// The setting of one field in one object
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSetting {
    /// Name of the field being set
    pub identifier: Identifier,

    pub setting: Setting,
}

/// What a field is set to
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    Type(Type),
    Value(Value),
    ValueSet(Value),
    Object(ObjectId),
    ObjectSet(ObjectSetId),
}

impl Object {
    /// The shared object returned whenever resolution fails
    pub(crate) fn erroneous() -> Self {
        let mut def = ObjectDefinition::new(
            "<erroneous>".to_string(),
            ObjectClassId::ERRONEOUS,
            TokenBlock::empty(Location::default(), ModuleId::default()),
        );
        def.settings = Some(vec![]);
        def.erroneous = true;
        def.last_checked = Some(CompilationTimestamp::MAX);
        Object::Definition(def)
    }

    /// An object defined by an unparsed body
    pub fn definition(name: String, governing_class: ObjectClassId, block: TokenBlock) -> Self {
        Object::Definition(ObjectDefinition::new(name, governing_class, block))
    }

    /// An object named by reference, resolved within `scope`
    pub fn reference(
        name: String,
        governing_class: ObjectClassId,
        reference: Reference,
        scope: ModuleId,
    ) -> Self {
        Object::Referenced(ObjectReference {
            name,
            governing_class,
            reference,
            scope,
            resolved: None,
        })
    }

    pub fn is_erroneous(&self) -> bool {
        matches!(self, Object::Definition(def) if def.erroneous)
    }

    pub fn name(&self) -> &str {
        match self {
            Object::Definition(def) => &def.name,
            Object::Referenced(r) => &r.name,
        }
    }

    pub fn governing_class(&self) -> ObjectClassId {
        match self {
            Object::Definition(def) => def.governing_class,
            Object::Referenced(r) => r.governing_class,
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            Object::Definition(def) => &def.block.location,
            Object::Referenced(r) => &r.reference.location,
        }
    }

    pub fn as_definition(&self) -> Option<&ObjectDefinition> {
        match self {
            Object::Definition(def) => Some(def),
            Object::Referenced(_) => None,
        }
    }

    pub fn as_definition_mut(&mut self) -> Option<&mut ObjectDefinition> {
        match self {
            Object::Definition(def) => Some(def),
            Object::Referenced(_) => None,
        }
    }
}

impl ObjectDefinition {
    fn new(name: String, governing_class: ObjectClassId, block: TokenBlock) -> Self {
        ObjectDefinition {
            name,
            governing_class,
            block,
            settings: None,
            index: HashMap::new(),
            parse_failed: false,
            erroneous: false,
            last_checked: None,
        }
    }

    /// Rebuild the field name index, reporting every field set more than
    /// once.  The first setting of a field keeps it.
    pub(crate) fn index_settings(&mut self, diagnostics: &mut Diagnostics) {
        self.index.clear();

        let Some(settings) = &self.settings else {
            return;
        };

        for (idx, setting) in settings.iter().enumerate() {
            let name = &setting.identifier.name;
            match self.index.get(name) {
                Some(&first) => diagnostics.report(
                    Diagnostic::error("E304")
                        .name(format!("duplicate setting for field `{name}`"))
                        .label(
                            Label::at(&settings[first].identifier.location)
                                .message("first set here"),
                        )
                        .label(Label::at(&setting.identifier.location).message("set again here")),
                ),
                None => {
                    self.index.insert(name.clone(), idx);
                }
            }
        }
    }

    /// The setting of a field, if the object has one
    pub fn setting(&self, name: &str) -> Option<&FieldSetting> {
        let settings = self.settings.as_ref()?;
        self.index.get(name).map(|&idx| &settings[idx])
    }

    pub fn has_setting(&self, name: &str) -> bool {
        self.setting(name).is_some()
    }
}

impl Setting {
    /// Does the setting fit a field expecting `kind`.  Object and object set
    /// classes are checked during resolution.
    pub fn matches_kind(&self, kind: SettingKind) -> bool {
        matches!(
            (self, kind),
            (Setting::Type(_), SettingKind::Type)
                | (Setting::Value(_), SettingKind::Value)
                | (Setting::ValueSet(_), SettingKind::ValueSet)
                | (Setting::Object(_), SettingKind::Object(_))
                | (Setting::ObjectSet(_), SettingKind::ObjectSet(_))
        )
    }

    /// Name of the setting kind for messages
    pub fn describe(kind: SettingKind) -> &'static str {
        match kind {
            SettingKind::Type => "type",
            SettingKind::Value => "value",
            SettingKind::ValueSet => "value set",
            SettingKind::Object(_) => "object",
            SettingKind::ObjectSet(_) => "object set",
            SettingKind::Erroneous => "erroneous",
        }
    }
}
