use std::fmt::Display;

use crate::{compiler::SourceId, diagnostic::Location, ios::ModuleId};

/// The kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    // Single Character tokens
    LeftCurly,
    RightCurly,
    Less,
    Greater,
    Comma,
    Dot,
    LeftParen,
    RightParen,
    LeftSquare,
    RightSquare,
    Hyphen,
    Colon,
    SemiColon,
    At,
    Pipe,
    Exclamation,
    Caret,

    // Compound Tokens
    Assignment,
    RangeSeparator,
    Ellipsis,
    LeftVersionBrackets,
    RightVersionBrackets,
    Number,
    RealNumber,
    CString,
    BHString,

    /// Starts with a lower case letter
    ValueReference,

    /// Starts with an upper case letter and contains a lower case letter
    TypeReference,

    /// Contains no lower case letters at all, e.g. an object class reference
    /// or a word in a `WITH SYNTAX` template.
    Word,

    /// `&` followed by an upper case letter
    TypeField,

    /// `&` followed by a lower case letter
    ValueField,

    // Keywords
    KwAll,
    KwAutomatic,
    KwBegin,
    KwBit,
    KwBmpString,
    KwBoolean,
    KwChoice,
    KwClass,
    KwDefault,
    KwDefinitions,
    KwEnd,
    KwEnumerated,
    KwExcept,
    KwExplicit,
    KwExports,
    KwExtensibility,
    KwExternal,
    KwFalse,
    KwFrom,
    KwGeneralizedTime,
    KwIA5String,
    KwIdentifier,
    KwImplicit,
    KwImplied,
    KwImports,
    KwInteger,
    KwIntersection,
    KwNull,
    KwNumericString,
    KwObject,
    KwObjectDescriptor,
    KwOctet,
    KwOf,
    KwOidIri,
    KwOptional,
    KwPrintableString,
    KwReal,
    KwRelativeOid,
    KwRelativeOidIri,
    KwSequence,
    KwSet,
    KwSize,
    KwString,
    KwSyntax,
    KwTags,
    KwTrue,
    KwUnion,
    KwUnique,
    KwUniversalString,
    KwUTCTime,
    KwUTF8String,
    KwVisibleString,
    KwWith,
}

/// Data relating to a single lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token<'a> {
    /// The type of this token
    pub(crate) kind: TokenKind,

    /// The string value of the token, will be a valid string for the token kind
    /// so it can be parsed further, e.g. into a number.
    pub(crate) value: &'a str,

    /// Byte offset into the file that the token starts at.  The end location
    /// can be derived from this offset + the length of the value string.
    pub(crate) offset: usize,

    /// The file the token was lexed from
    pub(crate) id: SourceId,
}

/// Data relating to a single lexed token, owning the string value of the token,
/// rather than holding a reference to the source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenBuffer {
    /// The type of this token
    pub kind: TokenKind,

    /// The string value of the token, will be a valid string for the token kind
    /// so it can be parsed further, e.g. into a number.
    pub value: String,

    /// Byte offset into the file that the token starts at.  The end location
    /// can be derived from this offset + the length of the value string.
    pub offset: usize,

    /// The file the token was lexed from
    pub id: SourceId,
}

/// An ordered run of tokens, usually the inside of a pair of braces, kept
/// unparsed until the information object system knows how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBlock {
    /// The tokens between the delimiters
    pub tokens: Vec<TokenBuffer>,

    /// Location of the whole block, including the delimiters
    pub location: Location,

    /// Module that names used inside the block are resolved in
    pub scope: ModuleId,
}

impl Token<'_> {
    /// Convert a token to one that owns its value
    pub fn to_owned(&self) -> TokenBuffer {
        TokenBuffer {
            kind: self.kind,
            value: self.value.to_string(),
            offset: self.offset,
            id: self.id,
        }
    }
}

impl TokenBuffer {
    /// Source location of this token
    pub fn location(&self) -> Location {
        Location::new(self.id, self.offset..self.offset + self.value.len())
    }

    /// Is the text of the token made only of upper case letters, digits and
    /// hyphens, i.e. could it be written as a word in a `WITH SYNTAX` template.
    pub fn is_word(&self) -> bool {
        self.value.starts_with(|c: char| c.is_ascii_uppercase())
            && self
                .value
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    }
}

impl TokenBlock {
    /// Create a block with no tokens at a location
    pub fn empty(location: Location, scope: ModuleId) -> Self {
        TokenBlock {
            tokens: vec![],
            location,
            scope,
        }
    }

    /// Location of the token at `offset`, or the end of the block if the
    /// offset is past the last token.
    pub fn location_at(&self, offset: usize) -> Location {
        match self.tokens.get(offset) {
            Some(tok) => tok.location(),
            None => self.location.end(),
        }
    }

    /// Location spanning the tokens from `start` to `end` (exclusive)
    pub fn span(&self, start: usize, end: usize) -> Location {
        if start >= end || start >= self.tokens.len() {
            return self.location_at(start);
        }

        let first = self.tokens[start].location();
        let last = self.tokens[(end - 1).min(self.tokens.len() - 1)].location();
        first.join(&last)
    }

    /// Text of the tokens in a range separated by single spaces
    pub fn text(&self, start: usize, end: usize) -> String {
        self.tokens[start.min(self.tokens.len())..end.min(self.tokens.len())]
            .iter()
            .map(|t| t.value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TokenKind {
    /// Is the token kind any keyword
    pub fn is_keyword(self) -> bool {
        KEYWORD_DATA.iter().any(|&(_, kind)| kind == self)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some((text, _)) = KEYWORD_DATA.iter().find(|&&(_, kind)| kind == *self) {
            return write!(f, "`{text}`");
        }

        let text = match self {
            TokenKind::LeftCurly => "`{`",
            TokenKind::RightCurly => "`}`",
            TokenKind::Less => "`<`",
            TokenKind::Greater => "`>`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::LeftSquare => "`[`",
            TokenKind::RightSquare => "`]`",
            TokenKind::Hyphen => "`-`",
            TokenKind::Colon => "`:`",
            TokenKind::SemiColon => "`;`",
            TokenKind::At => "`@`",
            TokenKind::Pipe => "`|`",
            TokenKind::Exclamation => "`!`",
            TokenKind::Caret => "`^`",
            TokenKind::Assignment => "`::=`",
            TokenKind::RangeSeparator => "`..`",
            TokenKind::Ellipsis => "`...`",
            TokenKind::LeftVersionBrackets => "`[[`",
            TokenKind::RightVersionBrackets => "`]]`",
            TokenKind::Number => "number",
            TokenKind::RealNumber => "real number",
            TokenKind::CString => "character string",
            TokenKind::BHString => "bit or hex string",
            TokenKind::ValueReference => "value reference",
            TokenKind::TypeReference => "type reference",
            TokenKind::Word => "object class reference",
            TokenKind::TypeField => "type field reference",
            TokenKind::ValueField => "value field reference",
            _ => "keyword",
        };

        write!(f, "{text}")
    }
}

/// String/Enum mapping for keywords
pub const KEYWORD_DATA: [(&str, TokenKind); 53] = [
    ("ALL", TokenKind::KwAll),
    ("AUTOMATIC", TokenKind::KwAutomatic),
    ("BEGIN", TokenKind::KwBegin),
    ("BIT", TokenKind::KwBit),
    ("BMPString", TokenKind::KwBmpString),
    ("BOOLEAN", TokenKind::KwBoolean),
    ("CHOICE", TokenKind::KwChoice),
    ("CLASS", TokenKind::KwClass),
    ("DEFAULT", TokenKind::KwDefault),
    ("DEFINITIONS", TokenKind::KwDefinitions),
    ("END", TokenKind::KwEnd),
    ("ENUMERATED", TokenKind::KwEnumerated),
    ("EXCEPT", TokenKind::KwExcept),
    ("EXPLICIT", TokenKind::KwExplicit),
    ("EXPORTS", TokenKind::KwExports),
    ("EXTENSIBILITY", TokenKind::KwExtensibility),
    ("EXTERNAL", TokenKind::KwExternal),
    ("FALSE", TokenKind::KwFalse),
    ("FROM", TokenKind::KwFrom),
    ("GeneralizedTime", TokenKind::KwGeneralizedTime),
    ("IA5String", TokenKind::KwIA5String),
    ("IDENTIFIER", TokenKind::KwIdentifier),
    ("IMPLICIT", TokenKind::KwImplicit),
    ("IMPLIED", TokenKind::KwImplied),
    ("IMPORTS", TokenKind::KwImports),
    ("INTEGER", TokenKind::KwInteger),
    ("INTERSECTION", TokenKind::KwIntersection),
    ("NULL", TokenKind::KwNull),
    ("NumericString", TokenKind::KwNumericString),
    ("OBJECT", TokenKind::KwObject),
    ("ObjectDescriptor", TokenKind::KwObjectDescriptor),
    ("OCTET", TokenKind::KwOctet),
    ("OF", TokenKind::KwOf),
    ("OID-IRI", TokenKind::KwOidIri),
    ("OPTIONAL", TokenKind::KwOptional),
    ("PrintableString", TokenKind::KwPrintableString),
    ("REAL", TokenKind::KwReal),
    ("RELATIVE-OID", TokenKind::KwRelativeOid),
    ("RELATIVE-OID-IRI", TokenKind::KwRelativeOidIri),
    ("SEQUENCE", TokenKind::KwSequence),
    ("SET", TokenKind::KwSet),
    ("SIZE", TokenKind::KwSize),
    ("STRING", TokenKind::KwString),
    ("SYNTAX", TokenKind::KwSyntax),
    ("TAGS", TokenKind::KwTags),
    ("TRUE", TokenKind::KwTrue),
    ("UNION", TokenKind::KwUnion),
    ("UNIQUE", TokenKind::KwUnique),
    ("UniversalString", TokenKind::KwUniversalString),
    ("UTCTime", TokenKind::KwUTCTime),
    ("UTF8String", TokenKind::KwUTF8String),
    ("VisibleString", TokenKind::KwVisibleString),
    ("WITH", TokenKind::KwWith),
];
