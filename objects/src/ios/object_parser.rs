//! Reads an object body by walking the syntax tree of its class.

use crate::{
    diagnostic::{Diagnostic, Label},
    token::{TokenBlock, TokenKind},
};

use super::{
    field::SettingKind,
    object::{FieldSetting, Setting},
    store::NodeSink,
    sub_parser::{Parsed, SubParser},
    syntax::{SyntaxNode, SyntaxRoot, SyntaxSequence},
    types::Identifier,
};

/// Everything produced by parsing one object body
#[derive(Debug, Clone)]
pub struct ParsedObject {
    pub settings: Vec<FieldSetting>,
    pub errors: Vec<Diagnostic>,

    /// The body matched the syntax with nothing left over
    pub success: bool,
}

/// State for parsing a single object body
pub struct ObjectSyntaxParser<'a> {
    block: &'a TokenBlock,
    parser: &'a dyn SubParser,
    sink: &'a mut dyn NodeSink,

    /// Index of the next unread token
    cursor: usize,

    /// Every sequence may be skipped, set for default syntaxes
    omit_any: bool,

    settings: Vec<FieldSetting>,
    errors: Vec<Diagnostic>,

    /// Errors from the most recent failed placeholder, shown if the failure
    /// turns out to be fatal
    pending: Vec<Diagnostic>,

    success: bool,
}

impl<'a> ObjectSyntaxParser<'a> {
    pub fn new(
        block: &'a TokenBlock,
        parser: &'a dyn SubParser,
        sink: &'a mut dyn NodeSink,
    ) -> Self {
        ObjectSyntaxParser {
            block,
            parser,
            sink,
            cursor: 0,
            omit_any: false,
            settings: vec![],
            errors: vec![],
            pending: vec![],
            success: true,
        }
    }

    /// Parse the block against a class syntax.
    ///
    /// # Panics
    /// If the syntax has not been built.
    pub fn parse(mut self, root: &SyntaxRoot, class_name: &str) -> ParsedObject {
        assert!(root.is_built, "object syntax walked before it was built");
        self.omit_any = root.is_default;

        self.sequence(&root.body);

        if self.success && self.cursor < self.block.tokens.len() {
            let tok = &self.block.tokens[self.cursor];
            let message = format!("unexpected `{}`, it is a superfluous part", tok.value);
            self.errors.push(
                Diagnostic::error("E302")
                    .name(message.clone())
                    .label(Label::at(&tok.location()).message(message)),
            );
            self.success = false;
        }

        if !self.success {
            log::debug!("object body did not match the syntax of `{class_name}`");
            self.errors.push(
                Diagnostic::error("E303")
                    .name(format!("check the syntax of objectclass `{class_name}`"))
                    .label(
                        Label::at(&self.block.location)
                            .message("this object does not match the syntax of its class"),
                    ),
            );
        }

        ParsedObject {
            settings: self.settings,
            errors: self.errors,
            success: self.success,
        }
    }

    /// Match any node, returns false if it did not match
    fn node(&mut self, node: &SyntaxNode) -> bool {
        match node {
            SyntaxNode::Sequence(seq) => self.sequence(seq),
            SyntaxNode::Literal { text, .. } => self.literal(text),
            SyntaxNode::Placeholder { field, kind } => self.placeholder(field, *kind),
        }
    }

    /// Match every node of a sequence in order.  An optional sequence that
    /// does not match is skipped, leaving the cursor and settings as they were
    /// before it, and counts as a match.  Once the leading literal of a
    /// sequence has matched the rest of it must match too.
    fn sequence(&mut self, seq: &SyntaxSequence) -> bool {
        let optional = seq.optional || self.omit_any;
        let start = self.cursor;
        let settings_start = self.settings.len();

        if seq.leading_comma_optional && !self.settings.is_empty() {
            if self.current_kind() == Some(TokenKind::Comma) {
                self.cursor += 1;
            } else if optional {
                return true;
            } else {
                self.expected("`,`");
                return false;
            }
        }

        let chosen_by_literal = matches!(seq.nodes.first(), Some(SyntaxNode::Literal { .. }));
        for (idx, node) in seq.nodes.iter().enumerate() {
            if self.node(node) {
                continue;
            }

            if !self.success {
                return false;
            }

            if optional && !(chosen_by_literal && idx > 0) {
                self.cursor = start;
                self.settings.truncate(settings_start);
                self.pending.clear();
                return true;
            }

            self.expected(&node.to_string());
            return false;
        }

        true
    }

    fn literal(&mut self, text: &str) -> bool {
        match self.block.tokens.get(self.cursor) {
            Some(tok) if tok.value == text => {
                self.cursor += 1;
                true
            }
            _ => false,
        }
    }

    fn placeholder(&mut self, field: &Identifier, kind: SettingKind) -> bool {
        self.pending.clear();
        if self.cursor >= self.block.tokens.len() {
            return false;
        }

        let block = self.block;
        let offset = self.cursor;
        let parsed = match kind {
            SettingKind::Type => self.parser.parse_type(block, offset).map(Setting::Type),
            SettingKind::Value => self.parser.parse_value(block, offset).map(Setting::Value),
            SettingKind::ValueSet => self
                .parser
                .parse_value_set(block, offset)
                .map(Setting::ValueSet),
            SettingKind::Object(class) => self
                .parser
                .parse_object(self.sink, block, offset, class)
                .map(Setting::Object),
            SettingKind::ObjectSet(class) => self
                .parser
                .parse_object_set(self.sink, block, offset, class)
                .map(Setting::ObjectSet),
            SettingKind::Erroneous => return false,
        };

        let Parsed {
            value,
            consumed,
            errors,
        } = parsed;

        match value {
            Some(setting) if consumed > 0 => {
                self.errors.extend(errors);
                self.cursor += consumed;
                self.settings.push(FieldSetting {
                    identifier: Identifier {
                        name: field.name.clone(),
                        location: block.span(offset, offset + consumed),
                    },
                    setting,
                });
                true
            }
            _ => {
                self.pending = errors;
                false
            }
        }
    }

    /// Report that the current token is not what the syntax required
    fn expected(&mut self, what: &str) {
        let location = self.block.location_at(self.cursor);
        let found = match self.block.tokens.get(self.cursor) {
            Some(tok) => format!("`{}`", tok.value),
            None => "the end of the object".to_string(),
        };

        let mut error = Diagnostic::error("E301")
            .name(format!("expecting {what}"))
            .label(Label::at(&location).message(format!("expecting {what}, found {found}")));
        for pending in std::mem::take(&mut self.pending) {
            for label in pending.labels {
                error = error.label(label);
            }
        }

        self.errors.push(error);
        self.success = false;
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.block.tokens.get(self.cursor).map(|t| t.kind)
    }
}
