//! Payloads produced by placeholders: types, values and references to other
//! assignments.

use std::fmt::Display;

use crate::{diagnostic::Location, token::TokenBlock};

/// A name written in the source, with the place it was written
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// The text of the name, including the `&` of field names
    pub name: String,

    /// Where the name was written
    pub location: Location,
}

/// A possibly module-qualified reference to another assignment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Module named before the dot, for `Module.name`
    pub module: Option<String>,

    /// The referenced name
    pub name: String,

    /// Location of the whole reference
    pub location: Location,
}

/// Builtin types that have no further structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Boolean,
    Null,
    Real,
    OctetString,
    ObjectIdentifier,
    RelativeOid,
    OidIri,
    RelativeOidIri,
    External,
    BmpString,
    GeneralizedTime,
    IA5String,
    NumericString,
    ObjectDescriptor,
    PrintableString,
    UniversalString,
    UtcTime,
    Utf8String,
    VisibleString,
}

/// `SEQUENCE`, `SET` or `CHOICE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructedKind {
    Sequence,
    Set,
    Choice,
}

/// The shape of a parsed type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Builtin(BuiltinType),

    /// `INTEGER`, with the names of any named numbers
    Integer { named_numbers: Vec<String> },

    /// `ENUMERATED { ... }`, items are not interpreted
    Enumerated(TokenBlock),

    /// `BIT STRING`, with optional named bits
    BitString { named_bits: Vec<String> },

    /// `SEQUENCE { ... }`, `SET { ... }` or `CHOICE { ... }`, the component
    /// list is kept unparsed
    Constructed {
        kind: ConstructedKind,
        body: TokenBlock,
    },

    /// `SEQUENCE OF T` or `SET OF T`
    CollectionOf {
        kind: ConstructedKind,
        element: Box<Type>,
    },

    /// A type defined by another assignment
    Reference(Reference),
}

/// A type written in a field setting, a field specification or an assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub kind: TypeKind,

    /// Where the type was written
    pub location: Location,

    /// Contents of a trailing `( ... )` constraint, unparsed
    pub constraint: Option<TokenBlock>,
}

/// A value or value set, kept as the run of tokens it was written with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub tokens: TokenBlock,

    /// Location of the written value
    pub location: Location,
}

impl Value {
    /// The source text of the value, tokens separated by single spaces
    pub fn text(&self) -> String {
        self.tokens.text(0, self.tokens.tokens.len())
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(module) = &self.module {
            write!(f, "{module}.")?;
        }
        write!(f, "{}", self.name)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
