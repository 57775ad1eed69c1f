use std::rc::Rc;

use crate::{analysis::CompilationTimestamp, diagnostic::Location, token::TokenBlock};

use super::{
    field::FieldSpecifications,
    store::{ModuleId, ObjectClassId},
    syntax::SyntaxRoot,
    types::Reference,
};

/// An object class, either written out or named through a reference
#[derive(Debug, Clone)]
pub enum ObjectClass {
    Definition(ClassDefinition),
    Referenced(ClassReference),
}

/// `CLASS { ... } [WITH SYNTAX { ... }]`
#[derive(Debug, Clone)]
pub struct ClassDefinition {
    /// Name of the assignment defining the class
    pub name: String,

    pub location: Location,

    /// Unparsed field list, taken on the first check
    pub(crate) fields_block: Option<TokenBlock>,

    /// Unparsed `WITH SYNTAX` template
    pub(crate) syntax_block: Option<TokenBlock>,

    pub fields: FieldSpecifications,

    /// Grammar for objects of the class, shared with object parsing
    pub syntax: Rc<SyntaxRoot>,

    pub erroneous: bool,

    /// The field list had syntax errors
    pub(crate) parse_failed: bool,

    pub(crate) last_checked: Option<CompilationTimestamp>,
}

/// A class written as the name of another class
#[derive(Debug, Clone)]
pub struct ClassReference {
    pub reference: Reference,

    /// Module the reference was written in
    pub scope: ModuleId,

    /// Definition the reference resolved to, and when
    pub(crate) resolved: Option<(ObjectClassId, CompilationTimestamp)>,
}

impl ObjectClass {
    /// The shared class returned whenever resolution fails
    pub(crate) fn erroneous() -> Self {
        ObjectClass::Definition(ClassDefinition {
            name: "<erroneous>".to_string(),
            location: Location::default(),
            fields_block: None,
            syntax_block: None,
            fields: FieldSpecifications::new(),
            syntax: Rc::new(SyntaxRoot::from_nodes(vec![])),
            erroneous: true,
            parse_failed: false,
            last_checked: Some(CompilationTimestamp::MAX),
        })
    }

    /// A class defined by a `CLASS` body that has not been parsed yet
    pub fn definition(
        name: String,
        location: Location,
        fields_block: TokenBlock,
        syntax_block: Option<TokenBlock>,
    ) -> Self {
        ObjectClass::Definition(ClassDefinition {
            name,
            location,
            fields_block: Some(fields_block),
            syntax_block,
            fields: FieldSpecifications::new(),
            syntax: Rc::new(SyntaxRoot::unbuilt()),
            erroneous: false,
            parse_failed: false,
            last_checked: None,
        })
    }

    /// A class named by reference, resolved within `scope`
    pub fn reference(reference: Reference, scope: ModuleId) -> Self {
        ObjectClass::Referenced(ClassReference {
            reference,
            scope,
            resolved: None,
        })
    }

    /// Is this a definition that failed its check.  References are never
    /// erroneous themselves, only what they resolve to.
    pub fn is_erroneous(&self) -> bool {
        matches!(self, ObjectClass::Definition(def) if def.erroneous)
    }

    /// Name to show for the class in messages
    pub fn name(&self) -> String {
        match self {
            ObjectClass::Definition(def) => def.name.clone(),
            ObjectClass::Referenced(r) => r.reference.to_string(),
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            ObjectClass::Definition(def) => &def.location,
            ObjectClass::Referenced(r) => &r.reference.location,
        }
    }

    pub fn as_definition(&self) -> Option<&ClassDefinition> {
        match self {
            ObjectClass::Definition(def) => Some(def),
            ObjectClass::Referenced(_) => None,
        }
    }

    pub fn as_definition_mut(&mut self) -> Option<&mut ClassDefinition> {
        match self {
            ObjectClass::Definition(def) => Some(def),
            ObjectClass::Referenced(_) => None,
        }
    }
}
