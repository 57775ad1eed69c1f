//! Module definitions and the assignments inside them

use crate::{
    diagnostic::Diagnostics,
    ios::{Assignment, AssignmentKind, NodeSink, ObjectClass, Store},
    token::TokenKind,
};

use super::{Parser, ParserError, Result};

impl<'a> Parser<'a> {
    /// Parse every module in the tokens, adding them to the store as they are
    /// read.  Duplicate modules and assignments are reported without stopping
    /// the parse; a syntax error stops it.
    pub(crate) fn modules(&mut self, store: &mut Store, diagnostics: &mut Diagnostics) -> Result {
        while !self.is_eof() {
            self.module_definition(store, diagnostics)?;
        }
        Ok(())
    }

    fn module_definition(&mut self, store: &mut Store, diagnostics: &mut Diagnostics) -> Result {
        let name = self.next(&[TokenKind::TypeReference, TokenKind::Word])?;
        if self.peek_kind(0) == Some(TokenKind::LeftCurly) {
            self.braced_block()?;
        }

        self.next(&[TokenKind::KwDefinitions])?;
        self.module_defaults()?;
        self.next(&[TokenKind::Assignment])?;
        self.next(&[TokenKind::KwBegin])?;

        let (module, duplicate) = store.add_module(name.value.clone(), name.location());
        diagnostics.extend(duplicate);
        self.scope = module;

        self.exports()?;
        self.imports(store)?;

        let mut count = 0;
        loop {
            let tok = self.peek(&[
                TokenKind::KwEnd,
                TokenKind::TypeReference,
                TokenKind::ValueReference,
                TokenKind::Word,
            ])?;
            if tok.kind == TokenKind::KwEnd {
                break;
            }

            let assignment = self.assignment(store)?;
            diagnostics.extend(store.add_assignment(module, assignment));
            count += 1;
        }
        self.next(&[TokenKind::KwEnd])?;

        log::debug!("parsed module `{}` with {count} assignments", name.value);
        Ok(())
    }

    /// `[EXPLICIT | IMPLICIT | AUTOMATIC TAGS] [EXTENSIBILITY IMPLIED]`
    fn module_defaults(&mut self) -> Result {
        if self.eat(TokenKind::KwExplicit)
            || self.eat(TokenKind::KwImplicit)
            || self.eat(TokenKind::KwAutomatic)
        {
            self.next(&[TokenKind::KwTags])?;
        }

        if self.eat(TokenKind::KwExtensibility) {
            self.next(&[TokenKind::KwImplied])?;
        }

        Ok(())
    }

    /// `EXPORTS ... ;`, everything is visible so the list is skipped
    fn exports(&mut self) -> Result {
        if self.eat(TokenKind::KwExports) {
            self.skip_balanced(TokenKind::SemiColon)?;
            self.next(&[TokenKind::SemiColon])?;
        }
        Ok(())
    }

    /// `IMPORTS a, b FROM Module c FROM Other ;`
    fn imports(&mut self, store: &mut Store) -> Result {
        if !self.eat(TokenKind::KwImports) {
            return Ok(());
        }

        while !self.eat(TokenKind::SemiColon) {
            let mut symbols = vec![];
            loop {
                let symbol = self.next(&[
                    TokenKind::TypeReference,
                    TokenKind::ValueReference,
                    TokenKind::Word,
                ])?;
                // parameterized reference `Name{}`
                if self.peek_kind(0) == Some(TokenKind::LeftCurly)
                    && self.peek_kind(1) == Some(TokenKind::RightCurly)
                {
                    self.offset += 2;
                }
                symbols.push(symbol.value.clone());

                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }

            self.next(&[TokenKind::KwFrom])?;
            let from = self.next(&[TokenKind::TypeReference, TokenKind::Word])?;

            // the module's assigned identifier, an oid or a defined value
            if self.peek_kind(0) == Some(TokenKind::LeftCurly) {
                self.braced_block()?;
            } else if self.peek_kind(0) == Some(TokenKind::ValueReference)
                && !matches!(
                    self.peek_kind(1),
                    Some(TokenKind::Comma | TokenKind::KwFrom)
                )
            {
                self.offset += 1;
            } else if self.peek_kind(1) == Some(TokenKind::Dot) {
                self.module_reference(TokenKind::ValueReference)?;
            }
            if self.eat(TokenKind::KwWith) {
                self.next(&[TokenKind::Word])?;
            }

            for symbol in symbols {
                store.add_import(self.scope, symbol, from.value.clone());
            }
        }

        Ok(())
    }

    /// A single assignment.  Which kind it is depends on the case of the name
    /// and on what follows it:
    ///
    /// - `CLASS-NAME ::= CLASS { ... } [WITH SYNTAX { ... }]`
    /// - `CLASS-NAME ::= OTHER-CLASS`
    /// - `object CLASS-NAME ::= { ... } | other`
    /// - `value Type ::= value`
    /// - `ObjectSet CLASS-NAME ::= { ... } | Other`
    /// - `Type ::= Type`
    /// - `ValueSet Type ::= { ... }`
    fn assignment(&mut self, store: &mut Store) -> Result<Assignment> {
        let name = self.next(&[
            TokenKind::TypeReference,
            TokenKind::ValueReference,
            TokenKind::Word,
        ])?;
        if self.peek_kind(0) == Some(TokenKind::LeftCurly) {
            return Err(ParserError::Unsupported {
                what: "parameterized assignments",
                location: self.location_here(),
            });
        }

        let kind = match name.kind {
            TokenKind::Word if self.peek_kind(0) == Some(TokenKind::Assignment) => {
                self.next(&[TokenKind::Assignment])?;
                self.class_or_type(store, &name.value, name.location())?
            }
            TokenKind::ValueReference => {
                if self.at_class_reference() {
                    let class = self.class_reference(store)?;
                    self.next(&[TokenKind::Assignment])?;
                    AssignmentKind::Object(self.named_object(store, class, Some(&name.value))?)
                } else {
                    let ty = self.ty()?;
                    self.next(&[TokenKind::Assignment])?;
                    AssignmentKind::Value {
                        ty,
                        value: self.value()?,
                    }
                }
            }
            _ => {
                if self.eat(TokenKind::Assignment) {
                    AssignmentKind::Type(self.ty()?)
                } else if self.at_class_reference() {
                    let class = self.class_reference(store)?;
                    self.next(&[TokenKind::Assignment])?;
                    AssignmentKind::ObjectSet(self.named_object_set(
                        store,
                        class,
                        Some(&name.value),
                    )?)
                } else {
                    let ty = self.ty()?;
                    self.next(&[TokenKind::Assignment])?;
                    AssignmentKind::ValueSet {
                        ty,
                        value: self.value_set()?,
                    }
                }
            }
        };

        log::trace!("assignment `{}`", name.value);
        Ok(Assignment {
            name: name.value.clone(),
            location: name.location(),
            kind,
        })
    }

    /// The right hand side of `NAME ::= ...`, a class definition, another
    /// class or a type with an upper case name
    fn class_or_type(
        &mut self,
        store: &mut Store,
        name: &str,
        location: crate::diagnostic::Location,
    ) -> Result<AssignmentKind> {
        if self.eat(TokenKind::KwClass) {
            let fields = self.braced_block()?;
            let syntax = if self.eat(TokenKind::KwWith) {
                self.next(&[TokenKind::KwSyntax])?;
                Some(self.braced_block()?)
            } else {
                None
            };

            let class = ObjectClass::definition(name.to_string(), location, fields, syntax);
            return Ok(AssignmentKind::ObjectClass(store.add_class(class)));
        }

        if self.at_class_reference() {
            return Ok(AssignmentKind::ObjectClass(self.class_reference(store)?));
        }

        Ok(AssignmentKind::Type(self.ty()?))
    }
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

    fn parse(source: &str) -> (Store, Diagnostics, Result) {
        let block = TokenBlock {
            tokens: Lexer::run(SourceId::new(0), source, Features::default()).unwrap(),
            location: Location::new(SourceId::new(0), 0..source.len()),
            scope: ModuleId::default(),
        };
        let mut store = Store::new();
        let mut diagnostics = Diagnostics::new();
        let result = Parser::new(&block, 0).modules(&mut store, &mut diagnostics);
        (store, diagnostics, result)
    }

    fn kinds(store: &Store, module: &str) -> Vec<(String, &'static str)> {
        let module = store.module(store.module_by_name(module).unwrap());
        module
            .assignments
            .iter()
            .map(|a| {
                let kind = match a.kind {
                    AssignmentKind::ObjectClass(_) => "class",
                    AssignmentKind::Object(_) => "object",
                    AssignmentKind::ObjectSet(_) => "object set",
                    AssignmentKind::Type(_) => "type",
                    AssignmentKind::Value { .. } => "value",
                    AssignmentKind::ValueSet { .. } => "value set",
                };
                (a.name.clone(), kind)
            })
            .collect()
    }

    #[test]
    fn assignment_kinds() {
        let (store, diagnostics, result) = parse(
            "Test { iso 1 } DEFINITIONS AUTOMATIC TAGS ::= BEGIN
                EXPORTS ALL;
                IMPORTS OTHER, thing FROM Other { 1 2 } More FROM Third;
                CLASS-A ::= CLASS { &id INTEGER UNIQUE } WITH SYNTAX { ID &id }
                ALIAS ::= CLASS-A
                obj CLASS-A ::= { ID 1 }
                Set CLASS-A ::= { obj | { ID 2 } }
                Num ::= INTEGER
                num Num ::= 5
                Nums Num ::= { 1 | 2 }
                FieldType ::= CLASS-A.&id
            END",
        );

        assert_eq!(result, Ok(()));
        assert!(diagnostics.is_empty());
        assert_eq!(
            kinds(&store, "Test"),
            vec![
                ("CLASS-A".into(), "class"),
                ("ALIAS".into(), "class"),
                ("obj".into(), "object"),
                ("Set".into(), "object set"),
                ("Num".into(), "type"),
                ("num".into(), "value"),
                ("Nums".into(), "value set"),
                ("FieldType".into(), "type"),
            ]
        );

        let AssignmentKind::Object(obj) = store.module(ModuleId::default()).assignments[2].kind
        else {
            panic!("expected an object");
        };
        assert_eq!(store.object(obj).name(), "obj");
    }

    #[test]
    fn duplicates_are_reported() {
        let (store, diagnostics, result) = parse(
            "A DEFINITIONS ::= BEGIN x INTEGER ::= 1 x INTEGER ::= 2 END
             A DEFINITIONS ::= BEGIN END",
        );

        assert_eq!(result, Ok(()));
        assert_eq!(diagnostics.with_code("E112").count(), 2);
        assert_eq!(store.modules().count(), 2);
        assert_eq!(kinds(&store, "A").len(), 1);
    }

    #[test]
    fn syntax_errors_stop_the_file() {
        let (_, _, result) = parse("A DEFINITIONS ::= BEGIN x ::= END");
        assert!(matches!(result, Err(ParserError::Expected { .. })));

        let (_, _, result) = parse("A DEFINITIONS ::= BEGIN T { X } ::= INTEGER END");
        assert!(matches!(result, Err(ParserError::Unsupported { .. })));
    }
}
