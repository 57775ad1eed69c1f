use asn1_objects::{
    ios::{FieldKind, Setting, TypeKind},
    AsnCompiler, CompilationTimestamp,
};
use pretty_assertions::assert_eq;

const FIRST: CompilationTimestamp = CompilationTimestamp::new(1);

fn compile(source: &str) -> AsnCompiler {
    let mut compiler = AsnCompiler::new();
    compiler
        .add_file("test.asn".to_string(), source.to_string())
        .unwrap();
    compiler.check(FIRST);
    compiler
}

fn codes(compiler: &AsnCompiler) -> Vec<String> {
    compiler
        .diagnostics()
        .iter()
        .map(|d| d.error_code.clone())
        .collect()
}

const ITEMS: &str = "Items DEFINITIONS ::= BEGIN
    ITEM ::= CLASS { &id INTEGER UNIQUE } WITH SYNTAX { ID &id }

    a ITEM ::= { ID 1 }
    b ITEM ::= { ID 2 }

    Left ITEM ::= { a | b }
    Right ITEM ::= { b }
    All ITEM ::= { Left | Right | a, ... }
END";

#[test]
fn objects_of_default_syntax() {
    let mut compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            C ::= CLASS { &id INTEGER UNIQUE, &Type }
            o1 C ::= { &id 1, &Type INTEGER }
            o2 C ::= { &Type INTEGER }
        END",
    );

    assert_eq!(codes(&compiler), vec!["E305"]);
    let missing = compiler.diagnostics().iter().next().unwrap();
    assert_eq!(missing.name, "missing setting for field `&id`");

    let o1 = compiler.object("Test", "o1").unwrap();
    let o2 = compiler.object("Test", "o2").unwrap();
    let analysis = compiler.analysis();

    assert_eq!(analysis.settings(o1).len(), 2);
    assert!(!analysis.is_object_erroneous(o1));
    let Some(Setting::Value(id)) = analysis.setting(o1, "&id") else {
        panic!("expected a value setting");
    };
    assert_eq!(id.text(), "1");

    assert!(analysis.is_object_erroneous(o2));
    assert!(analysis.has_setting(o2, "&Type"));
    assert!(!analysis.has_setting(o2, "&id"));
}

#[test]
fn supplying_the_missing_field() {
    let compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            C ::= CLASS { &id INTEGER UNIQUE, &Type }
            o2 C ::= { &id 2, &Type INTEGER }
        END",
    );
    assert!(compiler.diagnostics().is_empty());
}

#[test]
fn duplicate_fields_keep_the_first() {
    let mut compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            C ::= CLASS { &id INTEGER, &Type, &id BOOLEAN }
        END",
    );

    assert_eq!(codes(&compiler), vec!["E201"]);
    assert_eq!(compiler.diagnostics().iter().next().unwrap().labels.len(), 2);

    let class = compiler.class("Test", "C").unwrap();
    let analysis = compiler.analysis();
    let fields = analysis.field_specifications(class);
    let FieldKind::FixedTypeValue { ty, .. } = &fields.get("&id").unwrap().kind else {
        panic!("expected a value field");
    };
    assert!(matches!(ty.kind, TypeKind::Integer { .. }));
}

#[test]
fn template_with_optional_groups_and_defaults() {
    let mut compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            ATTRIBUTE ::= CLASS {
                &Type,
                &id OBJECT IDENTIFIER UNIQUE,
                &matches BOOLEAN DEFAULT FALSE,
                &Usage OPTIONAL
            } WITH SYNTAX {
                WITH SYNTAX &Type
                [EQUALITY MATCH &matches]
                [USAGE &Usage]
                ID &id
            }

            name ATTRIBUTE ::= { WITH SYNTAX PrintableString ID { 2 5 4 41 } }
            flag ATTRIBUTE ::= { WITH SYNTAX BOOLEAN EQUALITY MATCH TRUE ID { 2 5 4 99 } }
        END",
    );
    assert!(compiler.diagnostics().is_empty());

    let name = compiler.object("Test", "name").unwrap();
    let flag = compiler.object("Test", "flag").unwrap();
    let analysis = compiler.analysis();

    let fields: Vec<_> = analysis
        .settings(name)
        .iter()
        .map(|s| s.identifier.name.as_str())
        .collect();
    assert_eq!(fields, vec!["&Type", "&id"]);

    let Some(Setting::Value(default)) = analysis.setting_or_default(name, "&matches") else {
        panic!("expected the default value");
    };
    assert_eq!(default.text(), "FALSE");
    assert_eq!(analysis.setting_or_default(name, "&Usage"), None);

    let Some(Setting::Value(matches)) = analysis.setting_or_default(flag, "&matches") else {
        panic!("expected a value setting");
    };
    assert_eq!(matches.text(), "TRUE");
}

#[test]
fn superfluous_tokens() {
    let mut compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            ITEM ::= CLASS { &id INTEGER } WITH SYNTAX { ID &id }
            bad ITEM ::= { ID 1 EXTRA }
        END",
    );

    assert_eq!(codes(&compiler), vec!["E302", "E303"]);
    let bad = compiler.object("Test", "bad").unwrap();
    assert!(compiler.analysis().is_object_erroneous(bad));
}

#[test]
fn template_rules() {
    let compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            BAD ::= CLASS {
                &a INTEGER,
                &b INTEGER OPTIONAL,
                &val &Missing,
                &id INTEGER UNIQUE DEFAULT 1
            } WITH SYNTAX { [A &a] [ ] B &b B &b VAL &val ID &id }
        END",
    );

    assert_eq!(codes(&compiler), vec!["E204", "E205", "E212", "E210", "E211"]);
}

#[test]
fn circular_classes_report_once() {
    let mut compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            A-CLASS ::= B-CLASS
            B-CLASS ::= A-CLASS
            obj A-CLASS ::= { }
        END",
    );

    assert_eq!(codes(&compiler), vec!["E402"]);
    let obj = compiler.object("Test", "obj").unwrap();
    assert!(compiler.analysis().is_object_erroneous(obj));
}

#[test]
fn circular_objects_and_sets() {
    let compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            ITEM ::= CLASS { &id INTEGER } WITH SYNTAX { ID &id }
            first ITEM ::= second
            second ITEM ::= first
            One ITEM ::= { Two }
            Two ITEM ::= { One }
        END",
    );

    assert_eq!(compiler.diagnostics().with_code("E402").count(), 2);
    assert_eq!(compiler.diagnostics().len(), 2);
}

#[test]
fn flattening_is_stable_and_deduplicated() {
    let mut compiler = compile(ITEMS);
    assert!(compiler.diagnostics().is_empty());

    let all = compiler.object_set("Items", "All").unwrap();
    let mut analysis = compiler.analysis();

    let names: Vec<_> = analysis
        .flattened(all)
        .iter()
        .map(|&o| analysis.store().object(o).name().to_string())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(analysis.is_extensible(all));
    assert_eq!(analysis.object_set_len(all), 2);
    assert_eq!(analysis.object_set_get(all, 2), None);

    let before = analysis.flattened(all).to_vec();
    analysis.check_all(FIRST.next());
    assert_eq!(analysis.flattened(all), before.as_slice());

    analysis.refresh_object_set(all, FIRST.next().next());
    assert_eq!(analysis.flattened(all), before.as_slice());
    assert!(analysis.diagnostics.is_empty());
}

#[test]
fn duplicate_unique_values() {
    let compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            ITEM ::= CLASS { &id INTEGER UNIQUE } WITH SYNTAX { ID &id }
            Dups ITEM ::= { { ID 1 } | { ID 2 } | { ID 1 } }
        END",
    );

    assert_eq!(codes(&compiler), vec!["E502"]);
    let error = compiler.diagnostics().iter().next().unwrap();
    assert_eq!(error.name, "duplicate value `1` for UNIQUE field `&id`");
    assert_eq!(error.labels.len(), 2);
}

#[test]
fn objects_and_sets_of_the_wrong_class() {
    let mut compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            ITEM ::= CLASS { &id INTEGER } WITH SYNTAX { ID &id }
            OTHER ::= CLASS { &code INTEGER }
            item ITEM ::= { ID 1 }
            other OTHER ::= { &code 1 }
            Others OTHER ::= { other }
            Items ITEM ::= { item | other }
            Mixed ITEM ::= { Others }
        END",
    );

    assert_eq!(codes(&compiler), vec!["E404", "E405"]);
    let error = compiler.diagnostics().iter().next().unwrap();
    assert_eq!(
        error.name,
        "objects of objectclass `ITEM` expected; `other` is object of class `OTHER`"
    );

    let items = compiler.object_set("Test", "Items").unwrap();
    let mixed = compiler.object_set("Test", "Mixed").unwrap();
    let analysis = compiler.analysis();
    assert_eq!(analysis.object_set_len(items), 1);
    assert_eq!(analysis.object_set_len(mixed), 0);
}

#[test]
fn references_across_modules() {
    let mut compiler = compile(
        "Classes DEFINITIONS ::= BEGIN
            ITEM ::= CLASS { &id INTEGER } WITH SYNTAX { ID &id }
            shared ITEM ::= { ID 7 }
        END

        Users DEFINITIONS ::= BEGIN
            IMPORTS ITEM FROM Classes;
            local ITEM ::= { ID 1 }
            Set ITEM ::= { local | Classes.shared }
        END",
    );
    assert!(compiler.diagnostics().is_empty());

    let set = compiler.object_set("Users", "Set").unwrap();
    let analysis = compiler.analysis();
    let names: Vec<_> = analysis
        .flattened(set)
        .iter()
        .map(|&o| analysis.store().object(o).name())
        .collect();
    assert_eq!(names, vec!["local", "shared"]);
}

#[test]
fn broken_references() {
    let compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            ITEM ::= CLASS { &id INTEGER } WITH SYNTAX { ID &id }
            num INTEGER ::= 5
            Set ITEM ::= { missing | num }
        END",
    );

    assert_eq!(codes(&compiler), vec!["E401", "E403"]);
}

#[test]
fn object_and_object_set_fields() {
    let mut compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            ITEM ::= CLASS { &id INTEGER UNIQUE } WITH SYNTAX { ID &id }
            CONTAINER ::= CLASS {
                &item ITEM,
                &Items ITEM OPTIONAL
            } WITH SYNTAX { ITEM &item [ITEMS &Items] }

            first ITEM ::= { ID 1 }
            box CONTAINER ::= { ITEM { ID 1 } ITEMS { first | { ID 2 } } }
        END",
    );
    assert!(compiler.diagnostics().is_empty());

    let container = compiler.object("Test", "box").unwrap();
    let analysis = compiler.analysis();

    let Some(&Setting::Object(item)) = analysis.setting(container, "&item") else {
        panic!("expected an object setting");
    };
    assert!(!analysis.is_object_erroneous(item));

    let Some(&Setting::ObjectSet(items)) = analysis.setting(container, "&Items") else {
        panic!("expected an object set setting");
    };
    assert_eq!(analysis.object_set_len(items), 2);
}

#[test]
fn parse_errors_keep_the_source() {
    let mut compiler = AsnCompiler::new();
    let error = compiler
        .add_file(
            "broken.asn".to_string(),
            "Test DEFINITIONS ::= BEGIN x ::= END".to_string(),
        )
        .unwrap_err();

    assert_eq!(error.error_code, "E110");
    let source = compiler.sources().next().unwrap();
    assert_eq!(compiler.source_name(source), "broken.asn");
    assert!(compiler.source_text(source).starts_with("Test"));
}

#[test]
fn duplicate_assignments() {
    let compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            ITEM ::= CLASS { &id INTEGER } WITH SYNTAX { ID &id }
            a ITEM ::= { ID 1 }
            a ITEM ::= { ID 2 }
        END",
    );

    assert_eq!(codes(&compiler), vec!["E112"]);
    assert!(compiler.object("Test", "a").is_some());
    assert!(compiler.class("Test", "a").is_none());
}

#[test]
fn checking_again_does_not_repeat_errors() {
    let mut compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            C ::= CLASS { &id INTEGER UNIQUE, &Type }
            o2 C ::= { &Type INTEGER }
            Set C ::= { missing }
        END",
    );
    assert_eq!(codes(&compiler), vec!["E305", "E401"]);

    compiler.check(FIRST.next());
    compiler.check(FIRST.next().next());
    assert_eq!(codes(&compiler), vec!["E305", "E401"]);

    let o2 = compiler.object("Test", "o2").unwrap();
    assert!(compiler.analysis().is_object_erroneous(o2));
}

#[test]
fn classes_with_broken_fields_are_erroneous() {
    let mut compiler = compile(
        "Test DEFINITIONS ::= BEGIN
            C ::= CLASS { &id 5, &Type }
            obj C ::= { &Type INTEGER }
            Set C ::= { obj }
        END",
    );
    assert_eq!(codes(&compiler), vec!["E110"]);

    let class = compiler.class("Test", "C").unwrap();
    let obj = compiler.object("Test", "obj").unwrap();
    let set = compiler.object_set("Test", "Set").unwrap();
    assert!(compiler.store().class(class).is_erroneous());

    compiler.check(FIRST.next());
    let analysis = compiler.analysis();
    assert!(analysis.store().class(class).is_erroneous());
    assert!(analysis.is_object_erroneous(obj));
    assert_eq!(analysis.object_set_len(set), 0);
    assert_eq!(analysis.diagnostics.len(), 1);
}
