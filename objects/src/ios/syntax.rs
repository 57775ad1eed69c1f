//! The grammar of object bodies, built per class from its field list and its
//! optional `WITH SYNTAX` template.

use std::{collections::HashSet, fmt::Display};

use crate::{
    diagnostic::{Diagnostics, Location},
    token::{TokenBlock, TokenBuffer, TokenKind},
};

use super::{
    field::{FieldSpecifications, SettingKind},
    types::Identifier,
};

/// A node of the object syntax grammar
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxNode {
    Sequence(SyntaxSequence),

    /// A word that must appear as written
    Literal { text: String, location: Location },

    /// The setting for a field
    Placeholder { field: Identifier, kind: SettingKind },
}

/// Nodes that are matched one after another
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyntaxSequence {
    pub nodes: Vec<SyntaxNode>,

    /// Can the whole sequence be left out
    pub optional: bool,

    /// Must the sequence be preceded by a comma once any setting has been
    /// parsed for the object
    pub leading_comma_optional: bool,
}

/// The grammar for all objects of one class
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyntaxRoot {
    pub body: SyntaxSequence,
    pub is_built: bool,

    /// Derived from the fields rather than written as a template.  Objects
    /// may leave out any field of a default syntax, missing mandatory fields
    /// are reported by the class check instead.
    pub is_default: bool,
}

/// Words that may not be used as literals in a `WITH SYNTAX` template
const RESERVED_WORDS: &[&str] = &[
    "BIT",
    "BOOLEAN",
    "CHARACTER",
    "CHOICE",
    "DATE",
    "DATE-TIME",
    "DURATION",
    "EMBEDDED",
    "END",
    "ENUMERATED",
    "EXTERNAL",
    "FALSE",
    "INSTANCE",
    "INTEGER",
    "INTERSECTION",
    "MINUS-INFINITY",
    "NULL",
    "OBJECT",
    "OCTET",
    "PLUS-INFINITY",
    "REAL",
    "RELATIVE-OID",
    "SEQUENCE",
    "SET",
    "TIME",
    "TIME-OF-DAY",
    "TRUE",
    "UNION",
];

impl SyntaxRoot {
    /// A root that has not been built yet
    pub fn unbuilt() -> Self {
        Default::default()
    }

    /// A built root with the given top level nodes
    pub fn from_nodes(nodes: Vec<SyntaxNode>) -> Self {
        SyntaxRoot {
            body: SyntaxSequence {
                nodes,
                optional: false,
                leading_comma_optional: false,
            },
            is_built: true,
            is_default: false,
        }
    }

    /// Derive the syntax used when a class has no `WITH SYNTAX` template:
    /// every field written as `&name setting`, separated by commas.
    pub fn default_syntax(fields: &FieldSpecifications) -> Self {
        let nodes = fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                SyntaxNode::Sequence(SyntaxSequence {
                    nodes: vec![
                        SyntaxNode::Literal {
                            text: field.identifier.name.clone(),
                            location: field.identifier.location.clone(),
                        },
                        SyntaxNode::Placeholder {
                            field: field.identifier.clone(),
                            kind: field.setting_kind(),
                        },
                    ],
                    optional: field.may_be_omitted(),
                    leading_comma_optional: idx > 0,
                })
            })
            .collect();

        SyntaxRoot {
            is_default: true,
            ..Self::from_nodes(nodes)
        }
    }
}

impl SyntaxNode {
    /// Location of the node in the template, if it came from one
    pub fn location(&self) -> Option<&Location> {
        match self {
            SyntaxNode::Sequence(seq) => seq.nodes.first().and_then(SyntaxNode::location),
            SyntaxNode::Literal { location, .. } => Some(location),
            SyntaxNode::Placeholder { field, .. } => Some(&field.location),
        }
    }
}

impl Display for SyntaxNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyntaxNode::Sequence(seq) => match seq.nodes.first() {
                Some(first) => write!(f, "{first}"),
                None => write!(f, "nothing"),
            },
            SyntaxNode::Literal { text, .. } => write!(f, "`{text}`"),
            SyntaxNode::Placeholder { field, .. } => write!(f, "setting for `{field}`"),
        }
    }
}

/// Split every `[[` and `]]` of a template into two single brackets, so
/// nested optional groups can be parsed one bracket at a time.
pub fn expand_version_brackets(block: &TokenBlock) -> TokenBlock {
    let mut tokens = Vec::with_capacity(block.tokens.len());

    for tok in &block.tokens {
        let single = match tok.kind {
            TokenKind::LeftVersionBrackets => (TokenKind::LeftSquare, "["),
            TokenKind::RightVersionBrackets => (TokenKind::RightSquare, "]"),
            _ => {
                tokens.push(tok.clone());
                continue;
            }
        };

        for offset in [tok.offset, tok.offset + 1] {
            tokens.push(TokenBuffer {
                kind: single.0,
                value: single.1.to_string(),
                offset,
                id: tok.id,
            });
        }
    }

    TokenBlock {
        tokens,
        location: block.location.clone(),
        scope: block.scope,
    }
}

/// Structural rules every `WITH SYNTAX` template must follow
pub fn check_template(
    root: &SyntaxRoot,
    fields: &FieldSpecifications,
    template: &Location,
    diagnostics: &mut Diagnostics,
) {
    let mut seen = HashSet::new();
    check_sequence(&root.body, false, fields, &mut seen, diagnostics);

    for field in fields.iter() {
        if !field.may_be_omitted() && !seen.contains(&field.identifier.name) {
            diagnostics.report_error(
                "E213",
                template,
                format!(
                    "mandatory field `{}` is missing from the syntax",
                    field.identifier.name
                ),
            );
        }
    }
}

fn check_sequence(
    seq: &SyntaxSequence,
    in_optional: bool,
    fields: &FieldSpecifications,
    seen: &mut HashSet<String>,
    diagnostics: &mut Diagnostics,
) {
    for node in &seq.nodes {
        match node {
            SyntaxNode::Sequence(group) => {
                let Some(first) = group.nodes.first() else {
                    // the empty group has no location of its own
                    let location = seq
                        .nodes
                        .iter()
                        .find_map(SyntaxNode::location)
                        .cloned()
                        .unwrap_or_default();
                    diagnostics.report_error(
                        "E210",
                        &location,
                        "empty optional group is not allowed",
                    );
                    continue;
                };

                if group.optional && !matches!(first, SyntaxNode::Literal { .. }) {
                    if let Some(location) = first.location() {
                        diagnostics.report_error(
                            "E214",
                            location,
                            "an optional group must start with a literal",
                        );
                    }
                }

                check_sequence(group, in_optional || group.optional, fields, seen, diagnostics);
            }
            SyntaxNode::Literal { text, location } => check_literal(text, location, diagnostics),
            SyntaxNode::Placeholder { field, .. } => {
                if !seen.insert(field.name.clone()) {
                    diagnostics.report_error(
                        "E211",
                        &field.location,
                        format!("field `{field}` appears more than once in the syntax"),
                    );
                }

                let mandatory = fields.get(&field.name).is_some_and(|f| !f.may_be_omitted());
                if mandatory && in_optional {
                    diagnostics.report_error(
                        "E212",
                        &field.location,
                        format!("mandatory field `{field}` cannot be inside an optional group"),
                    );
                }
            }
        }
    }
}

fn check_literal(text: &str, location: &Location, diagnostics: &mut Diagnostics) {
    if text == "," {
        return;
    }

    let is_word = text.starts_with(|c: char| c.is_ascii_uppercase())
        && text
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-');
    if !is_word {
        diagnostics.report_error(
            "E215",
            location,
            format!("`{text}` cannot be used as a literal, literals are upper case words"),
        );
    } else if RESERVED_WORDS.contains(&text) {
        diagnostics.report_error(
            "E215",
            location,
            format!("`{text}` is a reserved word and cannot be used as a literal"),
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        compiler::SourceId,
        ios::{field::FieldKind, FieldSpecification},
    };

    use super::*;

    fn loc(start: usize) -> Location {
        Location::new(SourceId::new(0), start..start + 1)
    }

    fn field(name: &str, optional: bool) -> FieldSpecification {
        FieldSpecification {
            identifier: Identifier {
                name: name.to_string(),
                location: loc(0),
            },
            optional,
            kind: FieldKind::Type { default: None },
        }
    }

    fn fields(list: &[(&str, bool)]) -> FieldSpecifications {
        let mut fields = FieldSpecifications::new();
        for &(name, optional) in list {
            fields.add(field(name, optional));
        }
        fields.check(
            crate::analysis::CompilationTimestamp::new(1),
            &mut Diagnostics::new(),
        );
        fields
    }

    fn literal(text: &str) -> SyntaxNode {
        SyntaxNode::Literal {
            text: text.to_string(),
            location: loc(0),
        }
    }

    fn placeholder(name: &str) -> SyntaxNode {
        SyntaxNode::Placeholder {
            field: Identifier {
                name: name.to_string(),
                location: loc(0),
            },
            kind: SettingKind::Type,
        }
    }

    fn group(nodes: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::Sequence(SyntaxSequence {
            nodes,
            optional: true,
            leading_comma_optional: false,
        })
    }

    fn codes(root: &SyntaxRoot, fields: &FieldSpecifications) -> Vec<String> {
        let mut diagnostics = Diagnostics::new();
        check_template(root, fields, &loc(0), &mut diagnostics);
        diagnostics.iter().map(|d| d.error_code.clone()).collect()
    }

    #[test]
    fn default_syntax_shape() {
        let fields = fields(&[("&A", false), ("&B", true)]);
        let root = SyntaxRoot::default_syntax(&fields);
        assert!(root.is_built && root.is_default);

        let children: Vec<_> = root
            .body
            .nodes
            .iter()
            .map(|node| match node {
                SyntaxNode::Sequence(seq) => (seq.optional, seq.leading_comma_optional),
                _ => panic!("expected a sequence"),
            })
            .collect();
        assert_eq!(children, vec![(false, false), (true, true)]);
        assert_eq!(root.body.nodes[1].to_string(), "`&B`");
    }

    #[test]
    fn valid_template_passes() {
        let fields = fields(&[("&A", false), ("&B", true)]);
        let root = SyntaxRoot::from_nodes(vec![
            literal("TYPE"),
            placeholder("&A"),
            group(vec![literal("NAME"), placeholder("&B")]),
        ]);
        assert_eq!(codes(&root, &fields), Vec::<String>::new());
    }

    #[test]
    fn template_structure_errors() {
        let fields = fields(&[("&A", false), ("&B", true), ("&C", false)]);
        let root = SyntaxRoot::from_nodes(vec![
            literal("INTEGER"),
            placeholder("&B"),
            group(vec![]),
            group(vec![placeholder("&B")]),
            group(vec![literal("X"), placeholder("&A")]),
        ]);
        assert_eq!(
            codes(&root, &fields),
            vec!["E215", "E210", "E214", "E211", "E212", "E213"]
        );
    }

    #[test]
    fn brackets_are_split() {
        let block = TokenBlock {
            tokens: vec![
                TokenBuffer {
                    kind: TokenKind::LeftVersionBrackets,
                    value: "[[".into(),
                    offset: 4,
                    id: SourceId::new(0),
                },
                TokenBuffer {
                    kind: TokenKind::RightVersionBrackets,
                    value: "]]".into(),
                    offset: 7,
                    id: SourceId::new(0),
                },
            ],
            location: loc(0),
            scope: crate::ios::ModuleId::default(),
        };

        let expanded = expand_version_brackets(&block);
        let tokens: Vec<_> = expanded
            .tokens
            .iter()
            .map(|t| (t.kind, t.offset))
            .collect();
        assert_eq!(
            tokens,
            vec![
                (TokenKind::LeftSquare, 4),
                (TokenKind::LeftSquare, 5),
                (TokenKind::RightSquare, 7),
                (TokenKind::RightSquare, 8),
            ]
        );
    }
}
