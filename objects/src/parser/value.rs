use crate::{ios::Value, token::TokenKind};

use super::{Parser, Result};

/// Tokens that can start a value
const VALUE_START: &[TokenKind] = &[
    TokenKind::LeftCurly,
    TokenKind::Hyphen,
    TokenKind::Number,
    TokenKind::RealNumber,
    TokenKind::CString,
    TokenKind::BHString,
    TokenKind::KwTrue,
    TokenKind::KwFalse,
    TokenKind::KwNull,
    TokenKind::ValueReference,
    TokenKind::TypeReference,
];

impl<'a> Parser<'a> {
    /// Parse a value, keeping the tokens it was written with.  Values are not
    /// interpreted, only their extent is found.
    pub(super) fn value(&mut self) -> Result<Value> {
        self.enter()?;
        let start = self.offset;

        let tok = self.peek(VALUE_START)?;
        match tok.kind {
            TokenKind::LeftCurly => {
                self.braced_block()?;
            }
            TokenKind::Hyphen => {
                self.next(&[TokenKind::Hyphen])?;
                self.next(&[TokenKind::Number, TokenKind::RealNumber])?;
            }
            TokenKind::ValueReference => {
                self.next(&[TokenKind::ValueReference])?;

                // choice value `name : value`
                if self.eat(TokenKind::Colon) {
                    self.value()?;
                }
            }
            TokenKind::TypeReference => {
                self.next(&[TokenKind::TypeReference])?;
                let tok = self.next(&[TokenKind::Dot, TokenKind::Colon])?;
                if tok.kind == TokenKind::Dot {
                    self.next(&[TokenKind::ValueReference])?;
                } else {
                    self.value()?;
                }
            }
            _ => {
                self.next(VALUE_START)?;
            }
        }

        self.leave();
        let tokens = self.block_from(start);
        Ok(Value {
            location: tokens.location.clone(),
            tokens,
        })
    }

    /// Parse a value set, always written in braces
    pub(super) fn value_set(&mut self) -> Result<Value> {
        let start = self.offset;
        self.braced_block()?;

        let tokens = self.block_from(start);
        Ok(Value {
            location: tokens.location.clone(),
            tokens,
        })
    }
}
