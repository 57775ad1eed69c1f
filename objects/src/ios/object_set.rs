use crate::{analysis::CompilationTimestamp, diagnostic::Location, token::TokenBlock};

use super::{
    store::{ModuleId, ObjectClassId, ObjectId, ObjectSetId},
    types::Reference,
};

/// A set of objects of one class, written out or named through a reference
#[derive(Debug, Clone)]
pub enum ObjectSet {
    Definition(ObjectSetDefinition),
    Referenced(ObjectSetReference),
}

/// One element written in an object set body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectSetElement {
    Object(ObjectId),
    Reference(ObjectSetId),
}

/// `{ a | b | OtherSet, ... }` written against a governing class
#[derive(Debug, Clone)]
pub struct ObjectSetDefinition {
    /// Assignment name, or the body text for inline sets
    pub name: String,

    pub governing_class: ObjectClassId,

    pub location: Location,

    /// The body tokens, taken when the elements are parsed
    pub(crate) block: Option<TokenBlock>,

    /// Elements as written, `None` until parsed
    pub elements: Option<Vec<ObjectSetElement>>,

    /// Does the body contain an extension marker `...`
    pub extensible: bool,

    /// Every object of the set, following nested sets, without repeats
    pub flattened: Option<Vec<ObjectId>>,

    pub erroneous: bool,

    pub(crate) last_checked: Option<CompilationTimestamp>,
}

/// An object set written as the name of another object set
#[derive(Debug, Clone)]
pub struct ObjectSetReference {
    pub name: String,

    /// Class the referenced set is expected to have
    pub governing_class: ObjectClassId,

    pub reference: Reference,

    /// Module the reference was written in
    pub scope: ModuleId,

    pub(crate) resolved: Option<(ObjectSetId, CompilationTimestamp)>,
}

impl ObjectSet {
    /// The shared, empty, object set returned whenever resolution fails
    pub(crate) fn erroneous() -> Self {
        let mut def = ObjectSetDefinition::from_elements(
            "<erroneous>".to_string(),
            ObjectClassId::ERRONEOUS,
            Location::default(),
            vec![],
            false,
        );
        def.flattened = Some(vec![]);
        def.erroneous = true;
        def.last_checked = Some(CompilationTimestamp::MAX);
        ObjectSet::Definition(def)
    }

    /// A set defined by an unparsed body
    pub fn definition(name: String, governing_class: ObjectClassId, block: TokenBlock) -> Self {
        ObjectSet::Definition(ObjectSetDefinition {
            name,
            governing_class,
            location: block.location.clone(),
            block: Some(block),
            elements: None,
            extensible: false,
            flattened: None,
            erroneous: false,
            last_checked: None,
        })
    }

    /// A set named by reference, resolved within `scope`
    pub fn reference(
        name: String,
        governing_class: ObjectClassId,
        reference: Reference,
        scope: ModuleId,
    ) -> Self {
        ObjectSet::Referenced(ObjectSetReference {
            name,
            governing_class,
            reference,
            scope,
            resolved: None,
        })
    }

    pub fn is_erroneous(&self) -> bool {
        matches!(self, ObjectSet::Definition(def) if def.erroneous)
    }

    pub fn name(&self) -> &str {
        match self {
            ObjectSet::Definition(def) => &def.name,
            ObjectSet::Referenced(r) => &r.name,
        }
    }

    pub fn governing_class(&self) -> ObjectClassId {
        match self {
            ObjectSet::Definition(def) => def.governing_class,
            ObjectSet::Referenced(r) => r.governing_class,
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            ObjectSet::Definition(def) => &def.location,
            ObjectSet::Referenced(r) => &r.reference.location,
        }
    }

    pub fn as_definition(&self) -> Option<&ObjectSetDefinition> {
        match self {
            ObjectSet::Definition(def) => Some(def),
            ObjectSet::Referenced(_) => None,
        }
    }

    pub fn as_definition_mut(&mut self) -> Option<&mut ObjectSetDefinition> {
        match self {
            ObjectSet::Definition(def) => Some(def),
            ObjectSet::Referenced(_) => None,
        }
    }
}

impl ObjectSetDefinition {
    /// A set whose elements are already known
    pub fn from_elements(
        name: String,
        governing_class: ObjectClassId,
        location: Location,
        elements: Vec<ObjectSetElement>,
        extensible: bool,
    ) -> Self {
        ObjectSetDefinition {
            name,
            governing_class,
            location,
            block: None,
            elements: Some(elements),
            extensible,
            flattened: None,
            erroneous: false,
            last_checked: None,
        }
    }

    /// Move every element of `other` to the end of this set, leaving `other`
    /// empty.  Used when a parenthesised set is written inside another set
    /// body, its elements belong directly to the outer set.
    pub fn steal_elements(&mut self, other: &mut ObjectSetDefinition) {
        let stolen = other.elements.take().unwrap_or_default();
        self.elements.get_or_insert_with(Vec::new).extend(stolen);
        self.extensible |= std::mem::take(&mut other.extensible);
        other.flattened = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steal_moves_elements() {
        let element = ObjectSetElement::Object(ObjectId::ERRONEOUS);
        let mut outer = ObjectSetDefinition::from_elements(
            "outer".into(),
            ObjectClassId::ERRONEOUS,
            Location::default(),
            vec![element],
            false,
        );
        let mut inner = ObjectSetDefinition::from_elements(
            "inner".into(),
            ObjectClassId::ERRONEOUS,
            Location::default(),
            vec![ObjectSetElement::Reference(ObjectSetId::ERRONEOUS), element],
            true,
        );

        outer.steal_elements(&mut inner);

        assert_eq!(
            outer.elements,
            Some(vec![
                element,
                ObjectSetElement::Reference(ObjectSetId::ERRONEOUS),
                element
            ])
        );
        assert!(outer.extensible);
        assert_eq!(inner.elements, None);
        assert!(!inner.extensible);
    }
}
