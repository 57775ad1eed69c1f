use std::fmt::Display;

use crate::{
    diagnostic::{Diagnostic, Label, Location},
    lexer::LexerError,
    token::TokenKind,
    util::CowVec,
};

/// Any error that can be emitted by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// Found a token that is not one of the expected kinds, `got` is `None`
    /// at the end of the tokens
    Expected {
        kind: CowVec<TokenKind>,
        got: Option<TokenKind>,
        location: Location,
    },

    /// Recursion depth limit reached in the parser (try to avoid stack overflow)
    ParserDepthExceeded { location: Location },

    /// Tokens left over after a complete item
    Superfluous { location: Location },

    /// Valid ASN.1 that this parser does not handle
    Unsupported {
        what: &'static str,
        location: Location,
    },

    /// An error occurred within the lexer
    LexerError(LexerError),
}

pub type Result<T = (), E = ParserError> = std::result::Result<T, E>;

impl From<LexerError> for ParserError {
    fn from(value: LexerError) -> Self {
        ParserError::LexerError(value)
    }
}

/// Comma separated list of token kinds for messages
struct KindList<'a>(&'a [TokenKind]);

impl Display for KindList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            [] => write!(f, "any token"),
            [one] => write!(f, "{one}"),
            [rest @ .., last] => {
                for (idx, kind) in rest.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{kind}")?;
                }
                write!(f, " or {last}")
            }
        }
    }
}

impl From<ParserError> for Diagnostic {
    fn from(value: ParserError) -> Self {
        let (code, message, location) = match value {
            ParserError::LexerError(error) => return error.into(),
            ParserError::Expected {
                kind,
                got,
                location,
            } => {
                let got = match got {
                    Some(got) => got.to_string(),
                    None => "the end of the input".to_string(),
                };
                (
                    "E110",
                    format!("expected {}, found {got}", KindList(&kind)),
                    location,
                )
            }
            ParserError::ParserDepthExceeded { location } => (
                "E111",
                "nesting is too deep to parse".to_string(),
                location,
            ),
            ParserError::Superfluous { location } => (
                "E110",
                "unexpected token after the end of the item".to_string(),
                location,
            ),
            ParserError::Unsupported { what, location } => {
                ("E113", format!("{what} are not supported"), location)
            }
        };

        Diagnostic::error(code)
            .name(message.clone())
            .label(Label::at(&location).message(message))
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::SourceId;

    use super::*;

    #[test]
    fn expected_message_lists_kinds() {
        let error = ParserError::Expected {
            kind: (&[TokenKind::Comma, TokenKind::RightCurly, TokenKind::KwClass]).into(),
            got: None,
            location: Location::new(SourceId::new(0), 3..3),
        };

        let diagnostic = Diagnostic::from(error);
        assert_eq!(diagnostic.error_code, "E110");
        assert_eq!(
            diagnostic.name,
            "expected `,`, `}` or `CLASS`, found the end of the input"
        );
    }
}
