//! Recursive descent parser over lexed tokens, used both to split modules into
//! assignments and to read the token blocks kept by the information object
//! system.

mod error;
mod field_spec;
mod module;
mod object;
mod syntax;
mod ty;
mod value;

use crate::{
    diagnostic::{Diagnostic, Location},
    ios::{
        FieldSpecifications, NodeSink, ObjectClassId, ObjectId, ObjectSetElement, ObjectSetId,
        ModuleId, Parsed, SubParser, SyntaxNode, Type, Value,
    },
    token::{TokenBlock, TokenBuffer, TokenKind},
    util::CowVec,
};

pub use self::error::{ParserError, Result};

/// Deepest nesting of rules before parsing gives up
const MAX_DEPTH: usize = 100;

/// Cursor over a run of tokens
#[derive(Debug, Clone)]
pub(crate) struct Parser<'a> {
    /// Tokens being parsed, never read past the end
    tokens: &'a [TokenBuffer],

    /// Location of the whole run, used for errors at the end of it
    location: &'a Location,

    /// Index of the next token
    offset: usize,

    /// Module that blocks created by the parser resolve names in
    scope: ModuleId,

    /// Current recursion depth of the parser
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser starting at `offset` into a block
    pub(crate) fn new(block: &'a TokenBlock, offset: usize) -> Self {
        Parser {
            tokens: &block.tokens,
            location: &block.location,
            offset,
            scope: block.scope,
            depth: 0,
        }
    }

    /// Have all tokens been consumed
    fn is_eof(&self) -> bool {
        self.offset >= self.tokens.len()
    }

    /// Consume a token of one of the given kinds or return an error.  If an
    /// empty list is given, returns any token.
    fn next(&mut self, kind: impl Into<CowVec<TokenKind>>) -> Result<&'a TokenBuffer> {
        let tok = self.peek(kind)?;
        self.offset += 1;
        Ok(tok)
    }

    /// Peek a token without consuming it or return an error if the token is not
    /// of one of the provided kinds.  If an empty list is given, returns any
    /// token.
    fn peek(&self, kind: impl Into<CowVec<TokenKind>>) -> Result<&'a TokenBuffer> {
        let kind = kind.into();

        match self.tokens.get(self.offset) {
            Some(tok) if kind.is_empty() || kind.contains(&tok.kind) => Ok(tok),
            tok => Err(ParserError::Expected {
                kind,
                got: tok.map(|t| t.kind),
                location: self.location_here(),
            }),
        }
    }

    /// Kind of the token `n` tokens ahead of the cursor
    fn peek_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.offset + n).map(|t| t.kind)
    }

    /// Consume the next token if it has the given kind
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind(0) == Some(kind) {
            self.offset += 1;
            true
        } else {
            false
        }
    }

    /// Location of the next token, or the end of the run
    fn location_here(&self) -> Location {
        match self.tokens.get(self.offset) {
            Some(tok) => tok.location(),
            None => self.location.end(),
        }
    }

    /// Location covering the tokens from `start` up to the cursor
    fn span_from(&self, start: usize) -> Location {
        if start >= self.offset || start >= self.tokens.len() {
            return self.location_here();
        }
        let last = (self.offset - 1).min(self.tokens.len() - 1);
        self.tokens[start].location().join(&self.tokens[last].location())
    }

    /// Copy the tokens from `start` up to the cursor into a new block
    fn block_from(&self, start: usize) -> TokenBlock {
        TokenBlock {
            tokens: self.tokens[start..self.offset].to_vec(),
            location: self.span_from(start),
            scope: self.scope,
        }
    }

    /// Parse `{ ... }` with balanced brackets, returning the tokens between the
    /// braces.  The location of the block covers the braces.
    fn braced_block(&mut self) -> Result<TokenBlock> {
        let open = self.next(&[TokenKind::LeftCurly])?.location();
        let start = self.offset;

        self.skip_balanced(TokenKind::RightCurly)?;
        let tokens = self.tokens[start..self.offset].to_vec();
        let close = self.next(&[TokenKind::RightCurly])?.location();

        Ok(TokenBlock {
            tokens,
            location: open.join(&close),
            scope: self.scope,
        })
    }

    /// Skip tokens until `close` is the next token outside of any nested
    /// brackets.  The closing token is not consumed.
    fn skip_balanced(&mut self, close: TokenKind) -> Result {
        let mut stack = vec![];

        loop {
            let tok = self.peek(&[])?;
            match tok.kind {
                kind if stack.is_empty() && kind == close => return Ok(()),
                TokenKind::LeftCurly => stack.push(TokenKind::RightCurly),
                TokenKind::LeftParen => stack.push(TokenKind::RightParen),
                TokenKind::LeftSquare => stack.push(TokenKind::RightSquare),
                TokenKind::LeftVersionBrackets => stack.push(TokenKind::RightVersionBrackets),
                kind @ (TokenKind::RightCurly
                | TokenKind::RightParen
                | TokenKind::RightSquare
                | TokenKind::RightVersionBrackets) => {
                    if stack.last() != Some(&kind) {
                        let expected = stack.last().copied().unwrap_or(close);
                        return Err(ParserError::Expected {
                            kind: vec![expected].into(),
                            got: Some(kind),
                            location: tok.location(),
                        });
                    }
                    stack.pop();
                }
                _ => {}
            }
            self.offset += 1;
        }
    }

    /// Enter a nested rule, failing if the nesting is too deep
    fn enter(&mut self) -> Result {
        if self.depth >= MAX_DEPTH {
            return Err(ParserError::ParserDepthExceeded {
                location: self.location_here(),
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Leave a rule entered with `enter`
    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Require the whole run to have been consumed
    fn expect_eof(&self) -> Result {
        match self.tokens.get(self.offset) {
            None => Ok(()),
            Some(tok) => Err(ParserError::Superfluous {
                location: tok.location(),
            }),
        }
    }
}

/// The parser used for object class, object and object set bodies unless a
/// host supplies its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockParser;

impl BlockParser {
    /// Run a rule from `offset`, counting the tokens it consumed
    fn run<'a, T>(
        block: &'a TokenBlock,
        offset: usize,
        rule: impl FnOnce(&mut Parser<'a>) -> Result<T>,
    ) -> Parsed<T> {
        let mut parser = Parser::new(block, offset);
        match rule(&mut parser) {
            Ok(value) => Parsed::ok(value, parser.offset - offset),
            Err(error) => Parsed::failed(error.into()),
        }
    }
}

impl SubParser for BlockParser {
    fn parse_type(&self, block: &TokenBlock, offset: usize) -> Parsed<Type> {
        Self::run(block, offset, Parser::ty)
    }

    fn parse_value(&self, block: &TokenBlock, offset: usize) -> Parsed<Value> {
        Self::run(block, offset, Parser::value)
    }

    fn parse_value_set(&self, block: &TokenBlock, offset: usize) -> Parsed<Value> {
        Self::run(block, offset, Parser::value_set)
    }

    fn parse_object(
        &self,
        sink: &mut dyn NodeSink,
        block: &TokenBlock,
        offset: usize,
        governor: ObjectClassId,
    ) -> Parsed<ObjectId> {
        Self::run(block, offset, |parser| parser.object(sink, governor))
    }

    fn parse_object_set(
        &self,
        sink: &mut dyn NodeSink,
        block: &TokenBlock,
        offset: usize,
        governor: ObjectClassId,
    ) -> Parsed<ObjectSetId> {
        Self::run(block, offset, |parser| parser.object_set(sink, governor))
    }

    fn parse_object_set_elements(
        &self,
        sink: &mut dyn NodeSink,
        block: &TokenBlock,
        governor: ObjectClassId,
    ) -> Parsed<(Vec<ObjectSetElement>, bool)> {
        Self::run(block, 0, |parser| {
            let elements = parser.object_set_elements(sink, governor)?;
            parser.expect_eof()?;
            Ok(elements)
        })
    }

    fn parse_field_spec_list(
        &self,
        sink: &mut dyn NodeSink,
        block: &TokenBlock,
    ) -> (FieldSpecifications, Vec<Diagnostic>) {
        Parser::new(block, 0).field_spec_list(sink)
    }

    fn parse_object_class_syntax_fragment(
        &self,
        block: &TokenBlock,
        fields: &FieldSpecifications,
    ) -> (Vec<SyntaxNode>, Vec<Diagnostic>) {
        Parser::new(block, 0).syntax_fragment(fields)
    }
}
