//! Objects and object sets, written inline or by reference

use crate::{
    ios::{
        NodeSink, Object, ObjectClass, ObjectClassId, ObjectId, ObjectSet, ObjectSetDefinition,
        ObjectSetElement, ObjectSetId, Reference,
    },
    token::{TokenBlock, TokenKind},
};

use super::{Parser, ParserError, Result};

impl<'a> Parser<'a> {
    /// Parse an object, either `{ ... }` or a reference to an object
    pub(super) fn object(
        &mut self,
        sink: &mut dyn NodeSink,
        governor: ObjectClassId,
    ) -> Result<ObjectId> {
        self.named_object(sink, governor, None)
    }

    /// Parse an object, named after its assignment if it has one
    pub(super) fn named_object(
        &mut self,
        sink: &mut dyn NodeSink,
        governor: ObjectClassId,
        name: Option<&str>,
    ) -> Result<ObjectId> {
        let tok = self.peek(&[
            TokenKind::LeftCurly,
            TokenKind::ValueReference,
            TokenKind::TypeReference,
            TokenKind::Word,
        ])?;

        let object = if tok.kind == TokenKind::LeftCurly {
            let block = self.braced_block()?;
            let name = name.map_or_else(|| inline_name(&block), str::to_string);
            Object::definition(name, governor, block)
        } else {
            let reference = self.object_reference()?;
            let name = name.map_or_else(|| reference.to_string(), str::to_string);
            Object::reference(name, governor, reference, self.scope)
        };

        Ok(sink.add_object(object))
    }

    /// Parse an object set, either `{ ... }` or a reference to an object set
    pub(super) fn object_set(
        &mut self,
        sink: &mut dyn NodeSink,
        governor: ObjectClassId,
    ) -> Result<ObjectSetId> {
        self.named_object_set(sink, governor, None)
    }

    /// Parse an object set, named after its assignment if it has one
    pub(super) fn named_object_set(
        &mut self,
        sink: &mut dyn NodeSink,
        governor: ObjectClassId,
        name: Option<&str>,
    ) -> Result<ObjectSetId> {
        let tok = self.peek(&[TokenKind::LeftCurly, TokenKind::TypeReference])?;

        let set = if tok.kind == TokenKind::LeftCurly {
            let block = self.braced_block()?;
            let name = name.map_or_else(|| inline_name(&block), str::to_string);
            ObjectSet::definition(name, governor, block)
        } else {
            let reference = self.module_reference(TokenKind::TypeReference)?;
            let name = name.map_or_else(|| reference.to_string(), str::to_string);
            ObjectSet::reference(name, governor, reference, self.scope)
        };

        Ok(sink.add_object_set(set))
    }

    /// Parse the elements of an object set body up to the end of the tokens
    /// or a closing parenthesis.  Returns the elements in order and whether an
    /// extension marker was found.
    pub(super) fn object_set_elements(
        &mut self,
        sink: &mut dyn NodeSink,
        governor: ObjectClassId,
    ) -> Result<(Vec<ObjectSetElement>, bool)> {
        let mut set = ObjectSetDefinition::from_elements(
            String::new(),
            governor,
            self.location_here(),
            vec![],
            false,
        );

        while !self.is_eof() && self.peek_kind(0) != Some(TokenKind::RightParen) {
            self.unsupported_set_operator()?;
            let tok = self.peek(&[
                TokenKind::Ellipsis,
                TokenKind::LeftParen,
                TokenKind::LeftCurly,
                TokenKind::ValueReference,
                TokenKind::TypeReference,
                TokenKind::Word,
            ])?;
            let qualified_object = self.peek_kind(1) == Some(TokenKind::Dot)
                && self.peek_kind(2) == Some(TokenKind::ValueReference);

            let element = match tok.kind {
                TokenKind::Ellipsis => {
                    self.next(&[TokenKind::Ellipsis])?;
                    set.extensible = true;
                    None
                }
                TokenKind::LeftParen => {
                    self.enter()?;
                    let location = self.next(&[TokenKind::LeftParen])?.location();
                    let (elements, extensible) = self.object_set_elements(sink, governor)?;
                    self.next(&[TokenKind::RightParen])?;
                    self.leave();

                    let mut inner = ObjectSetDefinition::from_elements(
                        String::new(),
                        governor,
                        location,
                        elements,
                        extensible,
                    );
                    set.steal_elements(&mut inner);
                    None
                }
                TokenKind::TypeReference if !qualified_object => {
                    Some(ObjectSetElement::Reference(self.object_set(sink, governor)?))
                }
                _ => Some(ObjectSetElement::Object(self.object(sink, governor)?)),
            };

            if let Some(element) = element {
                set.elements.get_or_insert_with(Vec::new).push(element);
            }

            if self.is_eof() || self.peek_kind(0) == Some(TokenKind::RightParen) {
                break;
            }
            self.unsupported_set_operator()?;
            self.next(&[TokenKind::Pipe, TokenKind::KwUnion, TokenKind::Comma])?;
        }

        Ok((set.elements.unwrap_or_default(), set.extensible))
    }

    /// Fail on set operators other than union
    fn unsupported_set_operator(&self) -> Result {
        match self.peek_kind(0) {
            Some(TokenKind::KwIntersection | TokenKind::KwExcept | TokenKind::KwAll) => {
                Err(ParserError::Unsupported {
                    what: "object set intersections and exclusions",
                    location: self.location_here(),
                })
            }
            _ => Ok(()),
        }
    }

    /// `object` or `Module.object`
    fn object_reference(&mut self) -> Result<Reference> {
        self.module_reference(TokenKind::ValueReference)
    }

    /// Is the next token the start of a reference to an object class, rather
    /// than a type
    pub(super) fn at_class_reference(&self) -> bool {
        matches!(
            (self.peek_kind(0), self.peek_kind(1), self.peek_kind(2)),
            (Some(TokenKind::Word), Some(TokenKind::Dot), Some(TokenKind::Word))
                | (Some(TokenKind::TypeReference), Some(TokenKind::Dot), Some(TokenKind::Word))
        ) || (self.peek_kind(0) == Some(TokenKind::Word)
            && self.peek_kind(1) != Some(TokenKind::Dot))
    }

    /// Parse a reference to an object class, adding it to the sink
    pub(super) fn class_reference(&mut self, sink: &mut dyn NodeSink) -> Result<ObjectClassId> {
        let reference = self.module_reference(TokenKind::Word)?;
        Ok(sink.add_class(ObjectClass::reference(reference, self.scope)))
    }

    /// A name of the given kind, optionally qualified by a module name
    pub(super) fn module_reference(&mut self, kind: TokenKind) -> Result<Reference> {
        let start = self.offset;

        let module = if self.peek_kind(1) == Some(TokenKind::Dot) {
            let module = self.next(&[TokenKind::TypeReference, TokenKind::Word])?;
            self.next(&[TokenKind::Dot])?;
            Some(module.value.clone())
        } else {
            None
        };

        let name = self.next(vec![kind])?;
        Ok(Reference {
            module,
            name: name.value.clone(),
            location: self.span_from(start),
        })
    }
}

/// Name shown for objects and sets written inline, their body text
fn inline_name(block: &TokenBlock) -> String {
    if block.tokens.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", block.text(0, block.tokens.len()))
    }
}
