//! Field specifications, the declared shape of an object class.

use std::collections::HashMap;

use crate::{
    analysis::CompilationTimestamp,
    diagnostic::{Diagnostic, Diagnostics, Label, Location},
};

use super::{
    store::{ObjectClassId, ObjectId, ObjectSetId},
    types::{Identifier, Type, Value},
};

/// One declared field of an object class
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpecification {
    /// Name of the field, including the leading `&`
    pub identifier: Identifier,

    /// Was the field declared `OPTIONAL`
    pub optional: bool,

    pub kind: FieldKind,
}

/// The kind of a field and its kind specific data
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// `&Type`
    Type { default: Option<Type> },

    /// `&value INTEGER`
    FixedTypeValue {
        ty: Type,
        unique: bool,
        default: Option<Value>,
    },

    /// `&value &Type`
    VariableTypeValue {
        type_field: Identifier,
        default: Option<Value>,
    },

    /// `&Values INTEGER`
    FixedTypeValueSet { ty: Type, default: Option<Value> },

    /// `&Values &Type`
    VariableTypeValueSet {
        type_field: Identifier,
        default: Option<Value>,
    },

    /// `&object CLASS`
    Object {
        class: ObjectClassId,
        default: Option<ObjectId>,
    },

    /// `&Objects CLASS`
    ObjectSet {
        class: ObjectClassId,
        default: Option<ObjectSetId>,
    },

    /// A field that could not be understood
    Erroneous,
}

/// The kind of setting a field expects in an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKind {
    Type,
    Value,
    ValueSet,
    Object(ObjectClassId),
    ObjectSet(ObjectClassId),
    Erroneous,
}

impl FieldSpecification {
    /// Create the field returned by failed lookups
    pub fn erroneous() -> Self {
        FieldSpecification {
            identifier: Identifier {
                name: "<erroneous>".to_string(),
                location: Location::default(),
            },
            optional: false,
            kind: FieldKind::Erroneous,
        }
    }

    /// Does the field declare a default setting
    pub fn has_default(&self) -> bool {
        match &self.kind {
            FieldKind::Type { default } => default.is_some(),
            FieldKind::FixedTypeValue { default, .. }
            | FieldKind::VariableTypeValue { default, .. }
            | FieldKind::FixedTypeValueSet { default, .. }
            | FieldKind::VariableTypeValueSet { default, .. } => default.is_some(),
            FieldKind::Object { default, .. } => default.is_some(),
            FieldKind::ObjectSet { default, .. } => default.is_some(),
            FieldKind::Erroneous => false,
        }
    }

    /// Can an object leave this field out
    pub fn may_be_omitted(&self) -> bool {
        self.optional || self.has_default()
    }

    /// Kind of the setting an object gives for this field
    pub fn setting_kind(&self) -> SettingKind {
        match self.kind {
            FieldKind::Type { .. } => SettingKind::Type,
            FieldKind::FixedTypeValue { .. } | FieldKind::VariableTypeValue { .. } => {
                SettingKind::Value
            }
            FieldKind::FixedTypeValueSet { .. } | FieldKind::VariableTypeValueSet { .. } => {
                SettingKind::ValueSet
            }
            FieldKind::Object { class, .. } => SettingKind::Object(class),
            FieldKind::ObjectSet { class, .. } => SettingKind::ObjectSet(class),
            FieldKind::Erroneous => SettingKind::Erroneous,
        }
    }

    /// Is the field a value field declared `UNIQUE`
    pub fn is_unique(&self) -> bool {
        matches!(self.kind, FieldKind::FixedTypeValue { unique: true, .. })
    }
}

/// The ordered fields of an object class
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpecifications {
    fields: Vec<FieldSpecification>,

    /// Field name to position in `fields`, rebuilt by `check`
    index: HashMap<String, usize>,

    last_checked: Option<CompilationTimestamp>,

    /// Returned by lookups that fail
    erroneous: FieldSpecification,
}

impl Default for FieldSpecifications {
    fn default() -> Self {
        FieldSpecifications {
            fields: vec![],
            index: HashMap::new(),
            last_checked: None,
            erroneous: FieldSpecification::erroneous(),
        }
    }
}

impl FieldSpecifications {
    pub fn new() -> Self {
        Default::default()
    }

    /// Append a field.  Fields without a name are left out, they come from
    /// parses that already failed.
    pub fn add(&mut self, field: FieldSpecification) {
        if field.identifier.name.is_empty() {
            return;
        }
        self.fields.push(field);
    }

    /// Rebuild the name index, reporting every repeated name.  The first
    /// declaration of a name keeps it.
    pub fn check(&mut self, timestamp: CompilationTimestamp, diagnostics: &mut Diagnostics) {
        if self.last_checked.is_some_and(|last| last >= timestamp) {
            return;
        }
        self.last_checked = Some(timestamp);

        self.index.clear();
        for (idx, field) in self.fields.iter().enumerate() {
            let name = &field.identifier.name;
            match self.index.get(name) {
                Some(&first) => diagnostics.report(
                    Diagnostic::error("E201")
                        .name(format!("duplicate field specification `{name}`"))
                        .label(
                            Label::at(&self.fields[first].identifier.location)
                                .message("first declared here"),
                        )
                        .label(Label::at(&field.identifier.location).message("declared again here")),
                ),
                None => {
                    self.index.insert(name.clone(), idx);
                }
            }
        }
    }

    /// Find a field by name without reporting anything
    pub fn get(&self, name: &str) -> Option<&FieldSpecification> {
        self.index.get(name).map(|&idx| &self.fields[idx])
    }

    /// Find a field by name, reporting and returning the erroneous field if
    /// there is none.
    pub fn lookup_by_id(
        &self,
        name: &str,
        location: &Location,
        diagnostics: &mut Diagnostics,
    ) -> &FieldSpecification {
        match self.get(name) {
            Some(field) => field,
            None => {
                diagnostics.report_singular_error(
                    "E202",
                    location,
                    format!("no field specification named `{name}`"),
                );
                &self.erroneous
            }
        }
    }

    /// Find a field by position, reporting and returning the erroneous field
    /// if there is none.
    pub fn lookup_by_index(
        &self,
        index: usize,
        location: &Location,
        diagnostics: &mut Diagnostics,
    ) -> &FieldSpecification {
        match self.fields.get(index) {
            Some(field) => field,
            None => {
                diagnostics.report_singular_error(
                    "E203",
                    location,
                    format!("no field specification at index {index}"),
                );
                &self.erroneous
            }
        }
    }

    /// Iterate over the fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &FieldSpecification> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::SourceId;

    use super::*;

    fn type_field(name: &str, start: usize) -> FieldSpecification {
        FieldSpecification {
            identifier: Identifier {
                name: name.to_string(),
                location: Location::new(SourceId::new(0), start..start + name.len()),
            },
            optional: false,
            kind: FieldKind::Type { default: None },
        }
    }

    #[test]
    fn duplicates_are_reported_once_each() {
        let mut fields = FieldSpecifications::new();
        fields.add(type_field("&A", 0));
        fields.add(type_field("&B", 5));
        fields.add(type_field("&A", 10));
        fields.add(type_field("&A", 15));

        let mut diagnostics = Diagnostics::new();
        fields.check(CompilationTimestamp::new(1), &mut diagnostics);

        let errors: Vec<_> = diagnostics.with_code("E201").collect();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.labels.len() == 2));
        assert_eq!(
            fields.get("&A").map(|f| f.identifier.location.range.clone()),
            Some(0..2)
        );
    }

    #[test]
    fn check_is_skipped_when_fresh() {
        let mut fields = FieldSpecifications::new();
        fields.add(type_field("&A", 0));
        fields.add(type_field("&A", 3));

        let mut diagnostics = Diagnostics::new();
        fields.check(CompilationTimestamp::new(2), &mut diagnostics);
        fields.check(CompilationTimestamp::new(1), &mut diagnostics);
        fields.check(CompilationTimestamp::new(2), &mut diagnostics);
        assert_eq!(diagnostics.len(), 1);

        fields.check(CompilationTimestamp::new(3), &mut diagnostics);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn failed_lookups_return_the_erroneous_field() {
        let mut fields = FieldSpecifications::new();
        fields.add(type_field("&A", 0));
        fields.add(type_field("", 0));
        assert_eq!(fields.len(), 1);

        let mut diagnostics = Diagnostics::new();
        fields.check(CompilationTimestamp::new(1), &mut diagnostics);

        let location = Location::new(SourceId::new(0), 20..22);
        let missing = fields.lookup_by_id("&B", &location, &mut diagnostics);
        assert_eq!(missing.kind, FieldKind::Erroneous);
        let missing = fields.lookup_by_index(3, &location, &mut diagnostics);
        assert_eq!(missing.setting_kind(), SettingKind::Erroneous);

        assert_eq!(diagnostics.with_code("E202").count(), 1);
        assert_eq!(diagnostics.with_code("E203").count(), 1);
        assert_eq!(
            fields.lookup_by_id("&A", &location, &mut diagnostics).identifier.name,
            "&A"
        );
    }
}
