//! The field list of a `CLASS { ... }` definition

use crate::{
    diagnostic::Diagnostic,
    ios::{FieldKind, FieldSpecification, FieldSpecifications, Identifier, NodeSink},
    token::TokenKind,
};

use super::{Parser, Result};

impl<'a> Parser<'a> {
    /// Parse comma separated field specifications up to the end of the
    /// tokens.  A field that fails to parse is reported and skipped, parsing
    /// carries on from the next comma.
    pub(super) fn field_spec_list(
        &mut self,
        sink: &mut dyn NodeSink,
    ) -> (FieldSpecifications, Vec<Diagnostic>) {
        let mut fields = FieldSpecifications::new();
        let mut errors = vec![];

        while !self.is_eof() {
            let field = self.field_spec(sink).and_then(|field| {
                if !self.is_eof() {
                    self.next(&[TokenKind::Comma])?;
                }
                Ok(field)
            });

            match field {
                Ok(field) => fields.add(field),
                Err(error) => {
                    errors.push(error.into());
                    self.skip_field();
                }
            }
        }

        (fields, errors)
    }

    /// Move past the next comma that is not inside brackets, always consuming
    /// at least one token
    fn skip_field(&mut self) {
        let mut depth = 0usize;

        while let Some(kind) = self.peek_kind(0) {
            self.offset += 1;
            match kind {
                TokenKind::LeftCurly | TokenKind::LeftParen | TokenKind::LeftSquare => depth += 1,
                TokenKind::RightCurly | TokenKind::RightParen | TokenKind::RightSquare => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Comma if depth == 0 => return,
                _ => {}
            }
        }
    }

    fn field_spec(&mut self, sink: &mut dyn NodeSink) -> Result<FieldSpecification> {
        let name = self.next(&[TokenKind::TypeField, TokenKind::ValueField])?;
        let identifier = Identifier {
            name: name.value.clone(),
            location: name.location(),
        };

        let next = self.peek_kind(0);
        let mut kind = if name.kind == TokenKind::TypeField {
            match next {
                None | Some(TokenKind::Comma | TokenKind::KwOptional | TokenKind::KwDefault) => {
                    FieldKind::Type { default: None }
                }
                Some(TokenKind::TypeField) => FieldKind::VariableTypeValueSet {
                    type_field: self.field_name()?,
                    default: None,
                },
                _ if self.at_class_reference() => FieldKind::ObjectSet {
                    class: self.class_reference(sink)?,
                    default: None,
                },
                _ => FieldKind::FixedTypeValueSet {
                    ty: self.ty()?,
                    default: None,
                },
            }
        } else {
            match next {
                Some(TokenKind::TypeField) => FieldKind::VariableTypeValue {
                    type_field: self.field_name()?,
                    default: None,
                },
                _ if self.at_class_reference() => FieldKind::Object {
                    class: self.class_reference(sink)?,
                    default: None,
                },
                _ => {
                    let ty = self.ty()?;
                    FieldKind::FixedTypeValue {
                        ty,
                        unique: self.eat(TokenKind::KwUnique),
                        default: None,
                    }
                }
            }
        };

        let mut optional = false;
        if self.eat(TokenKind::KwOptional) {
            optional = true;
        } else if self.eat(TokenKind::KwDefault) {
            match &mut kind {
                FieldKind::Type { default } => *default = Some(self.ty()?),
                FieldKind::FixedTypeValue { default, .. }
                | FieldKind::VariableTypeValue { default, .. } => *default = Some(self.value()?),
                FieldKind::FixedTypeValueSet { default, .. }
                | FieldKind::VariableTypeValueSet { default, .. } => {
                    *default = Some(self.value_set()?)
                }
                FieldKind::Object { class, default } => {
                    *default = Some(self.object(sink, *class)?)
                }
                FieldKind::ObjectSet { class, default } => {
                    *default = Some(self.object_set(sink, *class)?)
                }
                FieldKind::Erroneous => {}
            }
        }

        Ok(FieldSpecification {
            identifier,
            optional,
            kind,
        })
    }

    /// The `&Type` naming the type of a variable type field
    fn field_name(&mut self) -> Result<Identifier> {
        let tok = self.next(&[TokenKind::TypeField])?;
        Ok(Identifier {
            name: tok.value.clone(),
            location: tok.location(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        analysis::CompilationTimestamp,
        compiler::{Features, SourceId},
        diagnostic::{Diagnostics, Location},
        ios::{ModuleId, ObjectClass, Store, TypeKind},
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

    fn parse(store: &mut Store, source: &str) -> (FieldSpecifications, Vec<Diagnostic>) {
        let block = block(source);
        let (mut fields, errors) = Parser::new(&block, 0).field_spec_list(store);
        fields.check(CompilationTimestamp::new(1), &mut Diagnostics::new());
        (fields, errors)
    }

    #[test]
    fn every_field_kind() {
        let mut store = Store::new();
        let (fields, errors) = parse(
            &mut store,
            "&Type, &id INTEGER UNIQUE, &val &Type, &Set INTEGER, \
             &VSet &Type, &obj OTHER-CLASS, &Objs Mod.OTHER-CLASS",
        );

        assert!(errors.is_empty(), "{errors:?}");
        let kinds = fields
            .iter()
            .map(|f| (f.identifier.name.as_str(), f.setting_kind()))
            .collect::<Vec<_>>();
        assert_eq!(kinds.len(), 7);

        assert!(fields.get("&id").unwrap().is_unique());
        assert!(matches!(
            fields.get("&val").unwrap().kind,
            FieldKind::VariableTypeValue { ref type_field, .. } if type_field.name == "&Type"
        ));
        assert!(matches!(
            fields.get("&Set").unwrap().kind,
            FieldKind::FixedTypeValueSet { .. }
        ));
        assert!(matches!(
            fields.get("&VSet").unwrap().kind,
            FieldKind::VariableTypeValueSet { .. }
        ));

        let FieldKind::ObjectSet { class, .. } = fields.get("&Objs").unwrap().kind else {
            panic!("expected an object set field");
        };
        let ObjectClass::Referenced(reference) = store.class(class) else {
            panic!("expected a class reference");
        };
        assert_eq!(reference.reference.module.as_deref(), Some("Mod"));
        assert_eq!(reference.reference.name, "OTHER-CLASS");
    }

    #[test]
    fn optional_and_defaults() {
        let mut store = Store::new();
        let (fields, errors) = parse(
            &mut store,
            "&Type DEFAULT BOOLEAN, &num INTEGER DEFAULT 5, &flag BOOLEAN OPTIONAL, \
             &Vals INTEGER DEFAULT { 1 | 2 }, &obj CLASS-A DEFAULT { &id 1 }",
        );
        assert!(errors.is_empty(), "{errors:?}");

        let FieldKind::Type { default: Some(ty) } = &fields.get("&Type").unwrap().kind else {
            panic!("expected a type default");
        };
        assert!(matches!(ty.kind, TypeKind::Builtin(_)));

        let FieldKind::FixedTypeValue { default: Some(value), unique: false, .. } =
            &fields.get("&num").unwrap().kind
        else {
            panic!("expected a value default");
        };
        assert_eq!(value.text(), "5");

        let flag = fields.get("&flag").unwrap();
        assert!(flag.optional && !flag.has_default());
        assert!(fields.get("&Vals").unwrap().has_default());

        let FieldKind::Object { default: Some(object), .. } = fields.get("&obj").unwrap().kind
        else {
            panic!("expected an object default");
        };
        assert_eq!(store.object(object).name(), "{ &id 1 }");
    }

    #[test]
    fn recovers_after_bad_field() {
        let mut store = Store::new();
        let (fields, errors) = parse(&mut store, "&a 5 { , } 6, &b INTEGER, &C");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_code, "E110");
        assert!(fields.get("&a").is_none());
        assert!(fields.get("&b").is_some());
        assert!(fields.get("&C").is_some());
    }

    #[test]
    fn value_field_needs_a_type() {
        let mut store = Store::new();
        let (fields, errors) = parse(&mut store, "&a 5, &b INTEGER, &c");

        let codes: Vec<_> = errors.iter().map(|e| e.error_code.as_str()).collect();
        assert_eq!(codes, vec!["E110", "E110"]);
        assert_eq!(fields.len(), 1);
        assert!(fields.get("&b").is_some());
        assert!(fields.get("&c").is_none());
    }

    #[test]
    fn missing_comma() {
        let mut store = Store::new();
        let (fields, errors) = parse(&mut store, "&a INTEGER &b BOOLEAN, &c INTEGER");

        assert_eq!(errors.len(), 1);
        assert_eq!(fields.len(), 1);
        assert!(fields.get("&c").is_some());
    }
}
