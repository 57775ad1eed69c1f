use std::{collections::HashMap, str::CharIndices, sync::OnceLock};

use crate::{
    compiler::{Features, SourceId},
    diagnostic::{Diagnostic, Label, Location},
    token::{self, Token, TokenBuffer, TokenKind},
    util::{Peek, Peekable},
};

/// State for converting a source string into a token stream
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    /// Iterator over all chars in the file
    chars: Peekable<CharIndices<'a>>,

    /// The original source text
    source: &'a str,

    /// File ID to use for all returned tokens
    id: SourceId,

    /// Enabled language extensions
    features: Features,
}

/// Any error that can be emitted by the lexer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LexerError {
    /// A character that cannot start any token
    Unrecognised { offset: usize, id: SourceId },

    /// A `/*` comment without a matching `*/`
    NonTerminatedComment { offset: usize, id: SourceId },

    /// A `"` string without a closing quote
    NonTerminatedString { offset: usize, id: SourceId },

    /// The source text is not in unicode normalisation form C
    NotNfc { id: SourceId },
}

pub type Result<T, E = LexerError> = std::result::Result<T, E>;

impl<'a> Lexer<'a> {
    /// Get all tokens for a source file, skipping whitespace and comments.
    pub fn run(id: SourceId, source: &'a str, features: Features) -> Result<Vec<TokenBuffer>> {
        // reject non-nfc source code
        if !unicode_normalization::is_nfc(source) {
            return Err(LexerError::NotNfc { id });
        }

        let mut lexer = Lexer {
            chars: source.char_indices().n_peekable(),
            source,
            id,
            features,
        };

        let mut tokens = vec![];
        while let Some(tok) = lexer.next_token()? {
            tokens.push(tok.to_owned());
        }

        log::trace!("lexed {} tokens from {id:?}", tokens.len());

        Ok(tokens)
    }

    /// Return the next token in the file, or none at the end of the file
    fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        self.skip_trivia()?;

        let Some(&(offset, c)) = self.chars.peek(0) else {
            return Ok(None);
        };

        let tok = match c {
            '{' => self.simple_token(TokenKind::LeftCurly, offset),
            '}' => self.simple_token(TokenKind::RightCurly, offset),
            '<' => self.simple_token(TokenKind::Less, offset),
            '>' => self.simple_token(TokenKind::Greater, offset),
            ',' => self.simple_token(TokenKind::Comma, offset),
            '(' => self.simple_token(TokenKind::LeftParen, offset),
            ')' => self.simple_token(TokenKind::RightParen, offset),
            '-' | '\u{2011}' => self.simple_token(TokenKind::Hyphen, offset),
            ';' => self.simple_token(TokenKind::SemiColon, offset),
            '@' => self.simple_token(TokenKind::At, offset),
            '|' => self.simple_token(TokenKind::Pipe, offset),
            '!' => self.simple_token(TokenKind::Exclamation, offset),
            '^' => self.simple_token(TokenKind::Caret, offset),
            '[' => self
                .multi_token(TokenKind::LeftVersionBrackets, offset, "[[")
                .unwrap_or_else(|| self.simple_token(TokenKind::LeftSquare, offset)),
            ']' => self
                .multi_token(TokenKind::RightVersionBrackets, offset, "]]")
                .unwrap_or_else(|| self.simple_token(TokenKind::RightSquare, offset)),
            ':' => self
                .multi_token(TokenKind::Assignment, offset, "::=")
                .unwrap_or_else(|| self.simple_token(TokenKind::Colon, offset)),
            '.' => self
                .multi_token(TokenKind::Ellipsis, offset, "...")
                .or_else(|| self.multi_token(TokenKind::RangeSeparator, offset, ".."))
                .unwrap_or_else(|| self.simple_token(TokenKind::Dot, offset)),
            '"' => self.cstring(offset)?,
            '\'' => self.bhstring(offset)?,
            '&' => self.field_reference(offset)?,
            _ if c.is_ascii_digit() => self.number(offset),
            _ if self.is_identifier_start(c) => self.identifier(c, offset),
            _ => {
                return Err(LexerError::Unrecognised {
                    offset,
                    id: self.id,
                })
            }
        };

        for _ in tok.value.chars() {
            self.chars.next();
        }

        Ok(Some(tok))
    }

    /// Skip all whitespace and comments before the next token
    fn skip_trivia(&mut self) -> Result<()> {
        while let Some(&(offset, c)) = self.chars.peek(0) {
            match c {
                '-' | '\u{2011}' => {
                    if !self.single_comment() {
                        break;
                    }
                }
                '/' => {
                    if !self.multi_comment(offset)? {
                        return Err(LexerError::Unrecognised {
                            offset,
                            id: self.id,
                        });
                    }
                }
                _ if self.is_whitespace(c) => {
                    self.chars.next();
                }
                _ => break,
            }
        }

        Ok(())
    }

    /// Return a 1 character token
    fn simple_token(&self, kind: TokenKind, offset: usize) -> Token<'a> {
        let value = &self.source[offset..];
        let len = value.chars().next().map_or(0, char::len_utf8);
        Token {
            kind,
            value: &value[..len],
            offset,
            id: self.id,
        }
    }

    /// Try to return a multi-character token
    fn multi_token(&self, kind: TokenKind, offset: usize, value: &str) -> Option<Token<'a>> {
        let tok_value = &self.source[offset..];

        if !tok_value.starts_with(value) {
            return None;
        }

        Some(Token {
            kind,
            value: &tok_value[..value.len()],
            offset,
            id: self.id,
        })
    }

    /// Parse a single line comment which is text between pairs of two hyphens.
    /// Non-breaking hyphens are also accepted instead of hyphens.
    fn single_comment(&mut self) -> bool {
        let Some(&(_, second)) = self.chars.peek(1) else {
            return false;
        };
        if !matches!(second, '-' | '\u{2011}') {
            return false;
        }
        self.chars.next(); // Consume the first hyphen
        self.chars.next(); // Consume the second hyphen

        while let Some(&(_, next)) = self.chars.peek(0) {
            if is_newline(next) {
                break;
            }

            if matches!(next, '-' | '\u{2011}')
                && matches!(self.chars.peek(1), Some((_, '-' | '\u{2011}')))
            {
                self.chars.next();
                self.chars.next();
                break;
            }

            self.chars.next();
        }

        true
    }

    /// Parse a multi line comment which is text between `/*` and `*/`.  The comment
    /// ends when a matching `*/` has been found for every `/*` encountered.
    fn multi_comment(&mut self, offset: usize) -> Result<bool> {
        let Some(&(_, c)) = self.chars.peek(1) else {
            return Ok(false);
        };
        if c != '*' {
            // not a start of comment
            return Ok(false);
        }

        self.chars.next();
        self.chars.next();

        let mut depth = 1;
        while let Some((_, c)) = self.chars.next() {
            if c == '/' && matches!(self.chars.peek(0), Some((_, '*'))) {
                depth += 1;
                self.chars.next();
            } else if c == '*' && matches!(self.chars.peek(0), Some((_, '/'))) {
                depth -= 1;
                self.chars.next();

                if depth == 0 {
                    break;
                }
            }
        }

        if depth != 0 {
            return Err(LexerError::NonTerminatedComment {
                offset,
                id: self.id,
            });
        }

        Ok(true)
    }

    /// Parse a character string.  Two adjacent quotes inside the string are an
    /// escaped quote.
    fn cstring(&mut self, offset: usize) -> Result<Token<'a>> {
        let value = &self.source[offset..];
        let mut len = 1;

        loop {
            let Some(&(_, c)) = self.chars.peek(len_chars(value, len)) else {
                return Err(LexerError::NonTerminatedString {
                    offset,
                    id: self.id,
                });
            };
            len += c.len_utf8();

            if c == '"' {
                if value[len..].starts_with('"') {
                    len += 1;
                    continue;
                }
                break;
            }
        }

        Ok(Token {
            kind: TokenKind::CString,
            value: &value[..len],
            offset,
            id: self.id,
        })
    }

    /// Parse a bit or hex string, `'0101'B` or `'0F'H`
    fn bhstring(&mut self, offset: usize) -> Result<Token<'a>> {
        let value = &self.source[offset..];
        let Some(end) = value[1..].find('\'') else {
            return Err(LexerError::NonTerminatedString {
                offset,
                id: self.id,
            });
        };
        let len = end + 2;

        if !value[len..].starts_with(['B', 'H']) {
            return Err(LexerError::Unrecognised {
                offset,
                id: self.id,
            });
        }

        Ok(Token {
            kind: TokenKind::BHString,
            value: &value[..len + 1],
            offset,
            id: self.id,
        })
    }

    /// Parse a `&field` reference, the case of the first letter after the
    /// ampersand decides between a type field and a value field.
    fn field_reference(&mut self, offset: usize) -> Result<Token<'a>> {
        let next = self.chars.peek(1).map(|&(_, c)| c);
        match next {
            Some(c) if self.is_identifier_start(c) => {
                let ident = self.identifier_len(1);
                let kind = if c.is_lowercase() {
                    TokenKind::ValueField
                } else {
                    TokenKind::TypeField
                };

                Ok(Token {
                    kind,
                    value: &self.source[offset..offset + ident],
                    offset,
                    id: self.id,
                })
            }
            _ => Err(LexerError::Unrecognised {
                offset,
                id: self.id,
            }),
        }
    }

    /// Parse an identifier.  Could be a type reference, value reference, word,
    /// or keyword.
    fn identifier(&mut self, first: char, offset: usize) -> Token<'a> {
        let len = self.identifier_len(0);
        let value = &self.source[offset..offset + len];
        let contains_lower = value.chars().any(char::is_lowercase);

        let ident_kind = if first.is_lowercase() {
            TokenKind::ValueReference
        } else if !contains_lower {
            TokenKind::Word
        } else {
            TokenKind::TypeReference
        };

        let keyword = keywords().get(value).copied().or_else(|| {
            if self.features.lowercase_keywords {
                keywords().get(value.to_uppercase().as_str()).copied()
            } else {
                None
            }
        });

        Token {
            kind: keyword.unwrap_or(ident_kind),
            value,
            offset,
            id: self.id,
        }
    }

    /// Byte length of the identifier starting `skip` chars after the current
    /// char.  Hyphens are allowed between two identifier characters.
    fn identifier_len(&mut self, skip: usize) -> usize {
        let mut len = 0;
        let mut n = 0;
        while n < skip {
            let Some(&(_, c)) = self.chars.peek(n) else {
                break;
            };
            len += c.len_utf8();
            n += 1;
        }

        let mut first = true;
        while let Some(&(_, c)) = self.chars.peek(n) {
            if first || self.is_identifier_continue(c) {
                first = false;
                len += c.len_utf8();
                n += 1;
                continue;
            }

            if c == '-' || c == '\u{2011}' {
                let Some(&(_, after)) = self.chars.peek(n + 1) else {
                    break;
                };
                if self.is_identifier_continue(after) && !matches!(after, '-' | '\u{2011}') {
                    len += c.len_utf8() + after.len_utf8();
                    n += 2;
                    continue;
                }
            }

            break;
        }

        len
    }

    /// Parse a number ([1-9][0-9]*)|0, or a real number with a fractional part
    fn number(&mut self, offset: usize) -> Token<'a> {
        let value = &self.source[offset..];
        let digits = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());

        let rest = &value[digits..];
        let is_real = rest.starts_with('.')
            && !rest.starts_with("..")
            && rest[1..].starts_with(|c: char| c.is_ascii_digit());

        if is_real {
            let fraction = rest[1..]
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len() - 1);
            return Token {
                kind: TokenKind::RealNumber,
                value: &value[..digits + 1 + fraction],
                offset,
                id: self.id,
            };
        }

        Token {
            kind: TokenKind::Number,
            value: &value[..digits],
            offset,
            id: self.id,
        }
    }

    /// Can the character start an identifier
    fn is_identifier_start(&self, c: char) -> bool {
        c.is_ascii_alphabetic() || (self.features.unicode_identifiers && c.is_alphabetic())
    }

    /// Can the character continue an identifier
    fn is_identifier_continue(&self, c: char) -> bool {
        c.is_ascii_alphanumeric()
            || c == '_'
            || (self.features.unicode_identifiers && c.is_alphanumeric())
    }

    /// Is the character any valid whitespace
    fn is_whitespace(&self, c: char) -> bool {
        // A0 = Non breaking space
        "\t \u{A0}".contains(c)
            || is_newline(c)
            || (self.features.unicode_whitespace && c.is_whitespace())
    }
}

/// Number of chars in the first `len` bytes of `value`
fn len_chars(value: &str, len: usize) -> usize {
    value[..len].chars().count()
}

/// Is the character a valid newline character
fn is_newline(c: char) -> bool {
    // 0B = Vertical Tab
    // 0C = Form Feed
    "\n\x0B\x0C\r".contains(c)
}

/// Get a mapping from keyword strings to their token kind
fn keywords() -> &'static HashMap<&'static str, TokenKind> {
    static KEYWORDS: OnceLock<HashMap<&'static str, TokenKind>> = OnceLock::new();
    KEYWORDS.get_or_init(|| HashMap::from(token::KEYWORD_DATA))
}

impl From<LexerError> for Diagnostic {
    fn from(value: LexerError) -> Self {
        let (code, message, id, offset) = match value {
            LexerError::Unrecognised { offset, id } => ("E101", "unrecognised character", id, offset),
            LexerError::NonTerminatedComment { offset, id } => {
                ("E102", "comment is never terminated", id, offset)
            }
            LexerError::NonTerminatedString { offset, id } => {
                ("E104", "string is never terminated", id, offset)
            }
            LexerError::NotNfc { id } => ("E103", "source text is not in NFC form", id, 0),
        };

        Diagnostic::error(code)
            .name(message)
            .label(Label::at(&Location::new(id, offset..offset + 1)).message(message))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::run(SourceId::new(0), source, Features::default())
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn classifies_identifiers() {
        assert_eq!(
            kinds("MY-CLASS MyType myValue &Type &id CLASS"),
            vec![
                TokenKind::Word,
                TokenKind::TypeReference,
                TokenKind::ValueReference,
                TokenKind::TypeField,
                TokenKind::ValueField,
                TokenKind::KwClass,
            ]
        );
    }

    #[test]
    fn field_references() {
        let tokens = Lexer::run(
            SourceId::new(0),
            "&Value-Set &id-2 &Type",
            Features::default(),
        )
        .unwrap();
        let fields: Vec<_> = tokens.iter().map(|t| (t.kind, t.value.as_str())).collect();
        assert_eq!(
            fields,
            vec![
                (TokenKind::TypeField, "&Value-Set"),
                (TokenKind::ValueField, "&id-2"),
                (TokenKind::TypeField, "&Type"),
            ]
        );

        assert!(Lexer::run(SourceId::new(0), "& id", Features::default()).is_err());
        assert!(Lexer::run(SourceId::new(0), "&", Features::default()).is_err());
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            kinds("a -- comment -- b /* nested /* comment */ */ c -- to end of line\nd"),
            vec![TokenKind::ValueReference; 4]
        );
    }

    #[test]
    fn compound_punctuation() {
        assert_eq!(
            kinds("::= ... .. . [[ ]] [ ] :"),
            vec![
                TokenKind::Assignment,
                TokenKind::Ellipsis,
                TokenKind::RangeSeparator,
                TokenKind::Dot,
                TokenKind::LeftVersionBrackets,
                TokenKind::RightVersionBrackets,
                TokenKind::LeftSquare,
                TokenKind::RightSquare,
                TokenKind::Colon,
            ]
        );
    }

    #[test]
    fn numbers_and_strings() {
        let tokens =
            Lexer::run(SourceId::new(0), r#"12 3.5 1..4 "a""b" '0F'H"#, Features::default())
                .unwrap();
        let values: Vec<_> = tokens.iter().map(|t| (t.kind, t.value.as_str())).collect();
        assert_eq!(
            values,
            vec![
                (TokenKind::Number, "12"),
                (TokenKind::RealNumber, "3.5"),
                (TokenKind::Number, "1"),
                (TokenKind::RangeSeparator, ".."),
                (TokenKind::Number, "4"),
                (TokenKind::CString, r#""a""b""#),
                (TokenKind::BHString, "'0F'H"),
            ]
        );
    }

    #[test]
    fn hyphenated_identifiers() {
        let tokens =
            Lexer::run(SourceId::new(0), "TYPE-IDENTIFIER a-b a--comment", Features::default())
                .unwrap();
        let values: Vec<_> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["TYPE-IDENTIFIER", "a-b", "a"]);
    }

    #[test]
    fn lowercase_keywords_feature() {
        let features = Features {
            lowercase_keywords: true,
            ..Features::default()
        };
        let tokens = Lexer::run(SourceId::new(0), "class", features).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::KwClass);
    }

    #[test]
    fn errors() {
        assert_eq!(
            Lexer::run(SourceId::new(0), "a /* b", Features::default()),
            Err(LexerError::NonTerminatedComment {
                offset: 2,
                id: SourceId::new(0)
            })
        );
        assert_eq!(
            Lexer::run(SourceId::new(0), "a # b", Features::default()),
            Err(LexerError::Unrecognised {
                offset: 2,
                id: SourceId::new(0)
            })
        );
        assert_eq!(
            Lexer::run(SourceId::new(0), "e\u{301}", Features::default()),
            Err(LexerError::NotNfc {
                id: SourceId::new(0)
            })
        );
    }
}
