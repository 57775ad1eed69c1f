use crate::{
    ios::{BuiltinType, ConstructedKind, Reference, Type, TypeKind},
    token::TokenKind,
};

use super::{Parser, ParserError, Result};

/// Tokens that can start a type
const TYPE_START: &[TokenKind] = &[
    TokenKind::KwBoolean,
    TokenKind::KwNull,
    TokenKind::KwReal,
    TokenKind::KwInteger,
    TokenKind::KwEnumerated,
    TokenKind::KwBit,
    TokenKind::KwOctet,
    TokenKind::KwObject,
    TokenKind::KwRelativeOid,
    TokenKind::KwOidIri,
    TokenKind::KwRelativeOidIri,
    TokenKind::KwExternal,
    TokenKind::KwSequence,
    TokenKind::KwSet,
    TokenKind::KwChoice,
    TokenKind::KwBmpString,
    TokenKind::KwGeneralizedTime,
    TokenKind::KwIA5String,
    TokenKind::KwNumericString,
    TokenKind::KwObjectDescriptor,
    TokenKind::KwPrintableString,
    TokenKind::KwUniversalString,
    TokenKind::KwUTCTime,
    TokenKind::KwUTF8String,
    TokenKind::KwVisibleString,
    TokenKind::TypeReference,
    TokenKind::Word,
];

impl<'a> Parser<'a> {
    /// Parse a type with an optional trailing constraint
    pub(super) fn ty(&mut self) -> Result<Type> {
        self.enter()?;
        let start = self.offset;

        let tok = self.peek(TYPE_START)?;
        let kind = match tok.kind {
            TokenKind::KwInteger => {
                self.next(&[TokenKind::KwInteger])?;
                TypeKind::Integer {
                    named_numbers: self.named_list()?,
                }
            }
            TokenKind::KwEnumerated => {
                self.next(&[TokenKind::KwEnumerated])?;
                TypeKind::Enumerated(self.braced_block()?)
            }
            TokenKind::KwBit => {
                self.next(&[TokenKind::KwBit])?;
                self.next(&[TokenKind::KwString])?;
                TypeKind::BitString {
                    named_bits: self.named_list()?,
                }
            }
            TokenKind::KwOctet => {
                self.next(&[TokenKind::KwOctet])?;
                self.next(&[TokenKind::KwString])?;
                TypeKind::Builtin(BuiltinType::OctetString)
            }
            TokenKind::KwObject => {
                self.next(&[TokenKind::KwObject])?;
                self.next(&[TokenKind::KwIdentifier])?;
                TypeKind::Builtin(BuiltinType::ObjectIdentifier)
            }
            TokenKind::KwSequence | TokenKind::KwSet | TokenKind::KwChoice => {
                self.constructed_type()?
            }
            TokenKind::TypeReference | TokenKind::Word => {
                TypeKind::Reference(self.type_reference()?)
            }
            _ => {
                let tok = self.next(TYPE_START)?;
                TypeKind::Builtin(builtin(tok.kind).ok_or_else(|| ParserError::Expected {
                    kind: TYPE_START.into(),
                    got: Some(tok.kind),
                    location: tok.location(),
                })?)
            }
        };

        let mut constraint = None;
        if self.peek_kind(0) == Some(TokenKind::LeftParen) {
            constraint = Some(self.parenthesised_block()?);
        }

        self.leave();
        Ok(Type {
            kind,
            location: self.span_from(start),
            constraint,
        })
    }

    /// `SEQUENCE { ... }`, `SEQUENCE OF T`, `SEQUENCE SIZE (..) OF T` and the
    /// same for `SET`, or `CHOICE { ... }`
    fn constructed_type(&mut self) -> Result<TypeKind> {
        let tok = self.next(&[TokenKind::KwSequence, TokenKind::KwSet, TokenKind::KwChoice])?;
        let kind = match tok.kind {
            TokenKind::KwSequence => ConstructedKind::Sequence,
            TokenKind::KwSet => ConstructedKind::Set,
            _ => ConstructedKind::Choice,
        };

        if kind == ConstructedKind::Choice {
            return Ok(TypeKind::Constructed {
                kind,
                body: self.braced_block()?,
            });
        }

        let tok = self.peek(&[
            TokenKind::LeftCurly,
            TokenKind::KwOf,
            TokenKind::KwSize,
            TokenKind::LeftParen,
        ])?;
        match tok.kind {
            TokenKind::LeftCurly => Ok(TypeKind::Constructed {
                kind,
                body: self.braced_block()?,
            }),
            _ => {
                if self.eat(TokenKind::KwSize) {
                    self.parenthesised_block()?;
                } else if self.peek_kind(0) == Some(TokenKind::LeftParen) {
                    self.parenthesised_block()?;
                }
                self.next(&[TokenKind::KwOf])?;

                // `SEQUENCE OF name Type`
                if self.peek_kind(0) == Some(TokenKind::ValueReference) {
                    self.next(&[TokenKind::ValueReference])?;
                }

                Ok(TypeKind::CollectionOf {
                    kind,
                    element: Box::new(self.ty()?),
                })
            }
        }
    }

    /// `Type`, `Module.Type` or `CLASS.&field`
    fn type_reference(&mut self) -> Result<Reference> {
        let start = self.offset;
        let first = self.next(&[TokenKind::TypeReference, TokenKind::Word])?;

        if self.peek_kind(0) != Some(TokenKind::Dot) {
            return Ok(Reference {
                module: None,
                name: first.value.clone(),
                location: first.location(),
            });
        }
        self.next(&[TokenKind::Dot])?;

        let second = self.next(&[
            TokenKind::TypeReference,
            TokenKind::Word,
            TokenKind::TypeField,
            TokenKind::ValueField,
        ])?;
        let reference = match second.kind {
            TokenKind::TypeField | TokenKind::ValueField => Reference {
                module: None,
                name: format!("{}.{}", first.value, second.value),
                location: self.span_from(start),
            },
            _ => Reference {
                module: Some(first.value.clone()),
                name: second.value.clone(),
                location: self.span_from(start),
            },
        };

        Ok(reference)
    }

    /// Optional `{ name(1), other(2) }` after `INTEGER` or `BIT STRING`,
    /// returning the names
    fn named_list(&mut self) -> Result<Vec<String>> {
        if self.peek_kind(0) != Some(TokenKind::LeftCurly) {
            return Ok(vec![]);
        }
        self.next(&[TokenKind::LeftCurly])?;

        let mut names = vec![];
        loop {
            let name = self.next(&[TokenKind::ValueReference])?;
            names.push(name.value.clone());

            self.parenthesised_block()?;

            let tok = self.next(&[TokenKind::Comma, TokenKind::RightCurly])?;
            if tok.kind == TokenKind::RightCurly {
                break;
            }
        }

        Ok(names)
    }

    /// `( ... )` with balanced brackets, the tokens between the parentheses
    /// are returned unparsed
    pub(super) fn parenthesised_block(&mut self) -> Result<crate::token::TokenBlock> {
        let open = self.next(&[TokenKind::LeftParen])?.location();
        let start = self.offset;

        self.skip_balanced(TokenKind::RightParen)?;
        let mut block = self.block_from(start);
        let close = self.next(&[TokenKind::RightParen])?.location();
        block.location = open.join(&close);

        Ok(block)
    }
}

/// The builtin type named by a single keyword
fn builtin(kind: TokenKind) -> Option<BuiltinType> {
    Some(match kind {
        TokenKind::KwBoolean => BuiltinType::Boolean,
        TokenKind::KwNull => BuiltinType::Null,
        TokenKind::KwReal => BuiltinType::Real,
        TokenKind::KwRelativeOid => BuiltinType::RelativeOid,
        TokenKind::KwOidIri => BuiltinType::OidIri,
        TokenKind::KwRelativeOidIri => BuiltinType::RelativeOidIri,
        TokenKind::KwExternal => BuiltinType::External,
        TokenKind::KwBmpString => BuiltinType::BmpString,
        TokenKind::KwGeneralizedTime => BuiltinType::GeneralizedTime,
        TokenKind::KwIA5String => BuiltinType::IA5String,
        TokenKind::KwNumericString => BuiltinType::NumericString,
        TokenKind::KwObjectDescriptor => BuiltinType::ObjectDescriptor,
        TokenKind::KwPrintableString => BuiltinType::PrintableString,
        TokenKind::KwUniversalString => BuiltinType::UniversalString,
        TokenKind::KwUTCTime => BuiltinType::UtcTime,
        TokenKind::KwUTF8String => BuiltinType::Utf8String,
        TokenKind::KwVisibleString => BuiltinType::VisibleString,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        compiler::{Features, SourceId},
        diagnostic::Location,
        ios::ModuleId,
        lexer::Lexer,
        token::TokenBlock,
    };

    use super::*;

    fn block(source: &str) -> TokenBlock {
        TokenBlock {
            tokens: Lexer::run(SourceId::new(0), source, Features::default()).unwrap(),
            location: Location::new(SourceId::new(0), 0..source.len()),
            scope: ModuleId::default(),
        }
    }

    fn parse(source: &str) -> (Type, usize) {
        let block = block(source);
        let mut parser = Parser::new(&block, 0);
        let ty = parser.ty().unwrap();
        (ty, parser.offset)
    }

    #[test]
    fn builtin_types() {
        assert_eq!(
            parse("OCTET STRING").0.kind,
            TypeKind::Builtin(BuiltinType::OctetString)
        );
        assert_eq!(
            parse("OBJECT IDENTIFIER").0.kind,
            TypeKind::Builtin(BuiltinType::ObjectIdentifier)
        );
        assert_eq!(parse("BOOLEAN").0.kind, TypeKind::Builtin(BuiltinType::Boolean));
    }

    #[test]
    fn integer_with_named_numbers_and_constraint() {
        let (ty, consumed) = parse("INTEGER { low(1), high(2) } (1..2) NEXT");
        assert_eq!(
            ty.kind,
            TypeKind::Integer {
                named_numbers: vec!["low".into(), "high".into()]
            }
        );
        assert_eq!(ty.constraint.map(|c| c.tokens.len()), Some(3));
        assert_eq!(consumed, 17);
    }

    #[test]
    fn collection_of_reference() {
        let (ty, _) = parse("SEQUENCE SIZE (1..4) OF Module.Thing");
        let TypeKind::CollectionOf { kind, element } = ty.kind else {
            panic!("expected a collection type");
        };
        assert_eq!(kind, ConstructedKind::Sequence);
        assert_eq!(
            element.kind,
            TypeKind::Reference(Reference {
                module: Some("Module".into()),
                name: "Thing".into(),
                location: Location::new(SourceId::new(0), 24..36),
            })
        );
    }

    #[test]
    fn class_field_type() {
        let (ty, consumed) = parse("TYPE-IDENTIFIER.&id");
        let TypeKind::Reference(reference) = ty.kind else {
            panic!("expected a reference");
        };
        assert_eq!(reference.name, "TYPE-IDENTIFIER.&id");
        assert_eq!(consumed, 3);
    }

    #[test]
    fn rejects_values() {
        let block = block("5");
        assert!(Parser::new(&block, 0).ty().is_err());
    }
}
