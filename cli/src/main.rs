mod error;

use std::{fmt::Write, fs, path::PathBuf, process::ExitCode};

use asn1_objects::{ios::AssignmentKind, AnalysisContext, AsnCompiler, CompilationTimestamp};
use clap::Parser;

use crate::error::{print_diagnostic, AsnCompilerCache};

/// Check the information object classes, objects and object sets of ASN.1
/// modules
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// ASN.1 source files, all checked together
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print every assignment after checking, with the objects of each
    /// object set
    #[arg(long)]
    assignments: bool,

    /// Print rust source listing every object set
    #[arg(long)]
    codegen: bool,

    /// Allow both upper and lowercase keywords
    #[arg(long)]
    lowercase_keywords: bool,

    /// Allow non-ascii characters in identifiers
    #[arg(long)]
    unicode_identifiers: bool,

    /// Allow further whitespace characters
    #[arg(long)]
    unicode_whitespace: bool,

    #[command(flatten)]
    color: concolor_clap::Color,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    args.color.apply();

    let mut compiler = AsnCompiler::new();
    compiler.lowercase_keywords = args.lowercase_keywords;
    compiler.unicode_identifiers = args.unicode_identifiers;
    compiler.unicode_whitespace = args.unicode_whitespace;

    let mut failed = false;
    for path in &args.files {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(error) => {
                eprintln!("unable to read `{}`: {error}", path.display());
                return ExitCode::FAILURE;
            }
        };

        if let Err(diagnostic) = compiler.add_file(path.display().to_string(), source) {
            print_diagnostic(&diagnostic, AsnCompilerCache::new(&compiler));
            failed = true;
        }
    }

    let mut analysis = compiler.analysis();
    analysis.check_all(CompilationTimestamp::new(1));

    let mut output = String::new();
    if args.assignments {
        output += &list_assignments(&analysis);
    }
    if args.codegen && !analysis.diagnostics.has_errors() {
        match analysis.rust_codegen() {
            Ok(code) => output += &code,
            Err(error) => log::error!("code generation failed: {error:?}"),
        }
    }

    for diagnostic in compiler.diagnostics().iter() {
        print_diagnostic(diagnostic, AsnCompilerCache::new(&compiler));
    }
    print!("{output}");

    if failed || compiler.diagnostics().has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// One line per assignment, object sets are followed by their objects
fn list_assignments(analysis: &AnalysisContext) -> String {
    let mut result = String::new();
    let store = analysis.store();

    for (_, module) in store.modules() {
        for assignment in &module.assignments {
            let kind = match assignment.kind {
                AssignmentKind::ObjectClass(_) => "object class".to_string(),
                AssignmentKind::Object(object) if analysis.is_object_erroneous(object) => {
                    "object (erroneous)".to_string()
                }
                AssignmentKind::Object(_) => "object".to_string(),
                AssignmentKind::ObjectSet(set) => {
                    let objects = analysis
                        .flattened(set)
                        .iter()
                        .map(|&object| store.object(object).name())
                        .collect::<Vec<_>>()
                        .join(" | ");
                    let extension = if analysis.is_extensible(set) { ", ..." } else { "" };
                    format!("object set {{ {objects}{extension} }}")
                }
                AssignmentKind::Type(_) => "type".to_string(),
                AssignmentKind::Value { .. } => "value".to_string(),
                AssignmentKind::ValueSet { .. } => "value set".to_string(),
            };

            // writing to a string cannot fail
            let _ = writeln!(result, "{}.{}: {kind}", module.name, assignment.name);
        }
    }

    result
}
