use crate::{diagnostic::Diagnostic, token::TokenBlock};

use super::{
    field::FieldSpecifications,
    object_set::ObjectSetElement,
    store::{NodeSink, ObjectClassId, ObjectId, ObjectSetId},
    syntax::SyntaxNode,
    types::{Type, Value},
};

/// Result of parsing part of a token block
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    /// The parsed item, `None` if parsing failed
    pub value: Option<T>,

    /// Number of tokens used from the starting offset
    pub consumed: usize,

    /// Syntax errors found while parsing
    pub errors: Vec<Diagnostic>,
}

impl<T> Parsed<T> {
    /// A successful parse
    pub fn ok(value: T, consumed: usize) -> Self {
        Parsed {
            value: Some(value),
            consumed,
            errors: vec![],
        }
    }

    /// A failed parse
    pub fn failed(error: Diagnostic) -> Self {
        Parsed {
            value: None,
            consumed: 0,
            errors: vec![error],
        }
    }

    /// Convert the parsed value, keeping the token count and errors
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        Parsed {
            value: self.value.map(f),
            consumed: self.consumed,
            errors: self.errors,
        }
    }
}

/// Parsers for the pieces of ASN.1 that appear inside object class, object
/// and object set bodies.  Every method starts reading `block` at `offset` and
/// never reads past the end of the block.  Object and object set parsers put
/// the nodes they create into `sink`, governed by `governor`.
pub trait SubParser: std::fmt::Debug {
    fn parse_type(&self, block: &TokenBlock, offset: usize) -> Parsed<Type>;

    fn parse_value(&self, block: &TokenBlock, offset: usize) -> Parsed<Value>;

    fn parse_value_set(&self, block: &TokenBlock, offset: usize) -> Parsed<Value>;

    fn parse_object(
        &self,
        sink: &mut dyn NodeSink,
        block: &TokenBlock,
        offset: usize,
        governor: ObjectClassId,
    ) -> Parsed<ObjectId>;

    fn parse_object_set(
        &self,
        sink: &mut dyn NodeSink,
        block: &TokenBlock,
        offset: usize,
        governor: ObjectClassId,
    ) -> Parsed<ObjectSetId>;

    /// Parse the whole body of an object set.  The flag is true when the set
    /// is extensible.
    fn parse_object_set_elements(
        &self,
        sink: &mut dyn NodeSink,
        block: &TokenBlock,
        governor: ObjectClassId,
    ) -> Parsed<(Vec<ObjectSetElement>, bool)>;

    /// Parse the whole body of a `CLASS { ... }`
    fn parse_field_spec_list(
        &self,
        sink: &mut dyn NodeSink,
        block: &TokenBlock,
    ) -> (FieldSpecifications, Vec<Diagnostic>);

    /// Parse the body of `WITH SYNTAX { ... }`, after version brackets have
    /// been split.  Placeholders take their kind from `fields`.
    fn parse_object_class_syntax_fragment(
        &self,
        block: &TokenBlock,
        fields: &FieldSpecifications,
    ) -> (Vec<SyntaxNode>, Vec<Diagnostic>);
}
