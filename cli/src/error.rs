use std::{collections::HashMap, error::Error, ops::Range};

use ariadne::{Config, IndexType, ReportKind};
use asn1_objects::{AsnCompiler, Diagnostic, Level, SourceId};

type Report = ariadne::Report<'static, (SourceId, Range<usize>)>;

/// Convert a diagnostic to an ariadne report, positioned at its first label
pub fn to_error(diag: &Diagnostic) -> Result<Report, Box<dyn Error>> {
    let kind = match diag.level {
        Level::Error => ReportKind::Error,
        Level::Warning => ReportKind::Warning,
        Level::Note => ReportKind::Advice,
    };

    let Some((source, range)) = diag.primary_location() else {
        return Err(format!("diagnostic {} has no source location", diag.error_code).into());
    };

    let mut report = Report::build(kind, source, range.start)
        .with_code(&diag.error_code)
        .with_message(&diag.name)
        .with_config(Config::default().with_index_type(IndexType::Byte));

    let mut note: Option<String> = None;
    for label in &diag.labels {
        let (Some(source), Some(offset)) = (label.source, &label.location) else {
            note = Some(note.unwrap_or_default() + "\n" + &label.message);
            continue;
        };
        report.add_label(ariadne::Label::new((source, offset.clone())).with_message(&label.message))
    }

    if let Some(note) = note {
        report.set_note(note);
    }

    Ok(report.finish())
}

/// Print a diagnostic against its source, or as plain text when it has no
/// location
pub fn print_diagnostic(diag: &Diagnostic, cache: AsnCompilerCache) {
    let printed = to_error(diag).and_then(|report| Ok(report.eprint(cache)?));
    if let Err(error) = printed {
        log::debug!("plain diagnostic output: {error}");
        eprintln!("{diag}");
    }
}

/// Source file cache provider for the Asn compiler
pub struct AsnCompilerCache<'a> {
    cache: HashMap<SourceId, ariadne::Source<&'a str>>,
    compiler: &'a AsnCompiler,
}

impl<'a> ariadne::Cache<SourceId> for AsnCompilerCache<'a> {
    type Storage = &'a str;

    fn fetch(
        &mut self,
        id: &SourceId,
    ) -> Result<&ariadne::Source<Self::Storage>, Box<dyn std::fmt::Debug + '_>> {
        Ok(self
            .cache
            .entry(*id)
            .or_insert_with(|| ariadne::Source::from(self.compiler.source_text(*id))))
    }

    fn display<'b>(&self, id: &'b SourceId) -> Option<Box<dyn std::fmt::Display + 'b>> {
        Some(Box::new(self.compiler.source_name(*id).to_string()))
    }
}

impl<'a> AsnCompilerCache<'a> {
    pub fn new(compiler: &'a AsnCompiler) -> Self {
        AsnCompilerCache {
            cache: HashMap::new(),
            compiler,
        }
    }
}
