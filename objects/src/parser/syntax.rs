use crate::{
    diagnostic::{Diagnostic, Label},
    ios::{FieldSpecifications, Identifier, SettingKind, SyntaxNode, SyntaxSequence},
    token::TokenKind,
};

use super::{Parser, ParserError};

impl<'a> Parser<'a> {
    /// Parse the body of a `WITH SYNTAX { ... }` template.  Placeholders are
    /// given the setting kind of the field they name.  Errors are collected
    /// and parsing carries on with the next token.
    pub(super) fn syntax_fragment(
        &mut self,
        fields: &FieldSpecifications,
    ) -> (Vec<SyntaxNode>, Vec<Diagnostic>) {
        let mut errors = vec![];
        let nodes = self.syntax_nodes(fields, false, &mut errors);
        (nodes, errors)
    }

    fn syntax_nodes(
        &mut self,
        fields: &FieldSpecifications,
        in_group: bool,
        errors: &mut Vec<Diagnostic>,
    ) -> Vec<SyntaxNode> {
        let tokens = self.tokens;
        let mut nodes = vec![];

        while let Some(tok) = tokens.get(self.offset) {
            match tok.kind {
                TokenKind::RightSquare if in_group => break,
                TokenKind::LeftSquare => {
                    if let Err(error) = self.enter() {
                        errors.push(error.into());
                        self.offset = tokens.len();
                        break;
                    }
                    self.offset += 1;
                    let group = self.syntax_nodes(fields, true, errors);
                    self.leave();

                    if !self.eat(TokenKind::RightSquare) {
                        errors.push(
                            ParserError::Expected {
                                kind: vec![TokenKind::RightSquare].into(),
                                got: None,
                                location: self.location_here(),
                            }
                            .into(),
                        );
                    }

                    nodes.push(SyntaxNode::Sequence(SyntaxSequence {
                        nodes: group,
                        optional: true,
                        leading_comma_optional: false,
                    }));
                }
                TokenKind::TypeField | TokenKind::ValueField => {
                    self.offset += 1;
                    let field = Identifier {
                        name: tok.value.clone(),
                        location: tok.location(),
                    };

                    let kind = match fields.get(&tok.value) {
                        Some(spec) => spec.setting_kind(),
                        None => {
                            let message = format!("no field specification named `{}`", tok.value);
                            errors.push(
                                Diagnostic::error("E202")
                                    .name(message.clone())
                                    .label(Label::at(&field.location).message(message)),
                            );
                            SettingKind::Erroneous
                        }
                    };

                    nodes.push(SyntaxNode::Placeholder { field, kind });
                }
                kind if kind == TokenKind::Word
                    || kind == TokenKind::Comma
                    || kind.is_keyword() =>
                {
                    self.offset += 1;
                    nodes.push(SyntaxNode::Literal {
                        text: tok.value.clone(),
                        location: tok.location(),
                    });
                }
                kind => {
                    self.offset += 1;
                    errors.push(
                        ParserError::Expected {
                            kind: vec![
                                TokenKind::Word,
                                TokenKind::Comma,
                                TokenKind::TypeField,
                                TokenKind::ValueField,
                                TokenKind::LeftSquare,
                            ]
                            .into(),
                            got: Some(kind),
                            location: tok.location(),
                        }
                        .into(),
                    );
                }
            }
        }

        nodes
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        analysis::CompilationTimestamp,
        compiler::{Features, SourceId},
        diagnostic::{Diagnostics, Location},
        ios::{FieldKind, FieldSpecification, ModuleId},
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

    fn fields() -> FieldSpecifications {
        let mut fields = FieldSpecifications::new();
        for name in ["&Type", "&id"] {
            fields.add(FieldSpecification {
                identifier: Identifier {
                    name: name.to_string(),
                    location: Location::default(),
                },
                optional: false,
                kind: FieldKind::Type { default: None },
            });
        }
        fields.check(CompilationTimestamp::new(1), &mut Diagnostics::new());
        fields
    }

    fn shape(nodes: &[SyntaxNode]) -> String {
        nodes
            .iter()
            .map(|node| match node {
                SyntaxNode::Sequence(seq) => format!("[{}]", shape(&seq.nodes)),
                SyntaxNode::Literal { text, .. } => text.clone(),
                SyntaxNode::Placeholder { field, .. } => field.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn nested_groups() {
        let source = block("&Type IDENTIFIED BY &id [WITH [SYNTAX &Type] ] ,");
        let (nodes, errors) = Parser::new(&source, 0).syntax_fragment(&fields());

        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(
            shape(&nodes),
            "&Type IDENTIFIED BY &id [WITH [SYNTAX &Type]] ,"
        );
        let SyntaxNode::Sequence(group) = &nodes[4] else {
            panic!("expected an optional group");
        };
        assert!(group.optional);
    }

    #[test]
    fn unknown_fields_and_tokens() {
        let source = block("&missing ID 5 [NAME");
        let (nodes, errors) = Parser::new(&source, 0).syntax_fragment(&fields());

        let codes = errors.iter().map(|e| e.error_code.as_str()).collect::<Vec<_>>();
        assert_eq!(codes, vec!["E202", "E110", "E110"]);
        assert!(matches!(
            nodes[0],
            SyntaxNode::Placeholder {
                kind: SettingKind::Erroneous,
                ..
            }
        ));
        assert_eq!(shape(&nodes), "&missing ID [NAME]");
    }
}
