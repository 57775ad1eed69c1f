use std::{collections::HashSet, error::Error, fmt::Display, ops::Range};

use crate::compiler::SourceId;

/// Any kind of error reported by the compiler
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    /// Unique error code reference
    pub error_code: String,

    /// Severity of the error
    pub level: Level,

    /// Name of the diagnostic
    pub name: String,

    /// All labels with information about this diagnostic
    pub labels: Vec<Label>,
}

/// Reference to a source file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    /// The source file
    pub source: Option<SourceId>,

    /// Location within the source file that the diagnostic should be shown at.
    /// If the range is present but empty, that indicates a single character
    /// position rather than a range of characters.
    /// The range is a byte range into the source string, not a code point or
    /// character range.
    pub location: Option<Range<usize>>,

    /// The message to display to the user.
    pub message: String,
}

/// Severity of a given diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// A fatal error
    Error,

    /// Should be fixed but the compiler can still continue.
    Warning,

    /// Notice about some code
    Note,
}

/// A span of source text that a node or token came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    /// The source file, `None` for nodes synthesised by the compiler
    pub source: Option<SourceId>,

    /// Byte range within the source file
    pub range: Range<usize>,
}

/// A result containing a diagnostic, the default error type for the compiler
pub type Result<T = ()> = std::result::Result<T, Diagnostic>;

impl Diagnostic {
    /// Create a new diagnostic
    fn new(level: Level, code: String) -> Self {
        Diagnostic {
            error_code: code,
            level,
            name: String::new(),
            labels: vec![],
        }
    }

    /// Create an error diagnostic
    pub(crate) fn error(code: impl Into<String>) -> Self {
        Self::new(Level::Error, code.into())
    }

    /// Set the descriptive name of an error
    pub(crate) fn name(self, value: impl Into<String>) -> Self {
        Self {
            name: value.into(),
            ..self
        }
    }

    /// Add a label to the diagnostic
    pub(crate) fn label(mut self, label: impl Into<Label>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Location of the first label, if it has one
    pub fn primary_location(&self) -> Option<(SourceId, Range<usize>)> {
        let label = self.labels.first()?;
        Some((label.source?, label.location.clone()?))
    }
}

impl Label {
    /// Create a new source label
    pub(crate) fn new() -> Label {
        Label {
            source: None,
            location: None,
            message: String::new(),
        }
    }

    /// Create a label pointing at a source location
    pub(crate) fn at(location: &Location) -> Label {
        Label {
            source: location.source,
            location: location.source.map(|_| location.range.clone()),
            message: String::new(),
        }
    }

    /// Set the message for this label
    pub(crate) fn message(self, value: impl Into<String>) -> Self {
        Self {
            message: value.into(),
            ..self
        }
    }

    /// Set the source file for this label
    pub fn source(self, id: SourceId) -> Self {
        Self {
            source: Some(id),
            ..self
        }
    }

    /// Set the location within the source file for this label
    pub fn loc(self, loc: Range<usize>) -> Self {
        Self {
            location: Some(loc),
            ..self
        }
    }
}

impl Location {
    /// Create a location covering a byte range of a source file
    pub fn new(source: SourceId, range: Range<usize>) -> Self {
        Location {
            source: Some(source),
            range,
        }
    }

    /// Smallest location covering both `self` and `other`.  If they come from
    /// different files, `self` is returned unchanged.
    pub fn join(&self, other: &Location) -> Location {
        if self.source != other.source {
            return self.clone();
        }

        Location {
            source: self.source,
            range: self.range.start.min(other.range.start)..self.range.end.max(other.range.end),
        }
    }

    /// Zero length location at the end of this one
    pub fn end(&self) -> Location {
        Location {
            source: self.source,
            range: self.range.end..self.range.end,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {:04}: {}", self.level, self.error_code, self.name)?;

        for label in &self.labels {
            if let Some(source) = label.source {
                writeln!(f)?;

                write!(f, "\t{:?} [{source:?}", self.level)?;
                if let Some(location) = &label.location {
                    write!(f, "@{}..{}", location.start, location.end)?;
                }
                write!(f, "]: {}", label.message)?;
            }
        }

        for label in &self.labels {
            if label.source.is_none() {
                writeln!(f)?;
                write!(f, "\t{:?}: {}", self.level, label.message)?;
            }
        }

        Ok(())
    }
}

impl Error for Diagnostic {}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::new().message(value)
    }
}

/// Sink collecting every diagnostic reported while checking.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Everything reported so far, in report order
    list: Vec<Diagnostic>,

    /// Singular reports already made in the current pass
    singular: HashSet<(Location, String)>,

    /// Everything reported before the current pass began
    earlier: HashSet<Diagnostic>,

    /// Index into `list` of the first report of the current pass
    pass_start: usize,
}

impl Diagnostics {
    /// Create an empty sink
    pub fn new() -> Self {
        Default::default()
    }

    /// Start a new check pass.  Singular errors may be reported again after
    /// this, but a repeat of anything reported in an earlier pass is dropped.
    pub fn begin_pass(&mut self) {
        self.singular.clear();
        self.earlier.extend(self.list[self.pass_start..].iter().cloned());
        self.pass_start = self.list.len();
    }

    /// Add a fully built diagnostic
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if self.earlier.contains(&diagnostic) {
            log::trace!("repeated diagnostic {} dropped", diagnostic.error_code);
            return;
        }

        log::trace!("diagnostic {}: {}", diagnostic.error_code, diagnostic.name);
        self.list.push(diagnostic);
    }

    /// Report an error with a single label at the given location
    pub fn report_error(&mut self, code: &str, location: &Location, message: impl Into<String>) {
        let message = message.into();
        self.report(
            Diagnostic::error(code)
                .name(message.clone())
                .label(Label::at(location).message(message)),
        );
    }

    /// Report an error, unless the same message was already reported at the
    /// same location during this pass.
    pub fn report_singular_error(
        &mut self,
        code: &str,
        location: &Location,
        message: impl Into<String>,
    ) {
        let message = message.into();
        if self.singular.insert((location.clone(), message.clone())) {
            self.report_error(code, location, message);
        }
    }

    /// Add every diagnostic from an iterator
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.report(diagnostic);
        }
    }

    /// Does the sink contain any error level diagnostics
    pub fn has_errors(&self) -> bool {
        self.list.iter().any(|d| d.level == Level::Error)
    }

    /// Number of diagnostics reported
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Has nothing been reported
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Iterate over all reported diagnostics
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.list.iter()
    }

    /// Iterate over the diagnostics with a given error code
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.list.iter().filter(move |d| d.error_code == code)
    }

    /// Remove and return every reported diagnostic
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.pass_start = 0;
        std::mem::take(&mut self.list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(start: usize, end: usize) -> Location {
        Location::new(SourceId::new(0), start..end)
    }

    #[test]
    fn singular_errors_are_deduplicated_per_pass() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report_singular_error("E401", &loc(1, 4), "missing");
        diagnostics.report_singular_error("E401", &loc(1, 4), "missing");
        diagnostics.report_singular_error("E401", &loc(5, 8), "missing");
        assert_eq!(diagnostics.len(), 2);

        diagnostics.begin_pass();
        diagnostics.report_singular_error("E401", &loc(5, 8), "other");
        diagnostics.report_singular_error("E401", &loc(5, 8), "other");
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn later_passes_do_not_repeat_reports() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report_error("E305", &loc(0, 9), "missing setting");
        diagnostics.report_error("E305", &loc(0, 9), "missing setting");
        assert_eq!(diagnostics.len(), 2);

        diagnostics.begin_pass();
        diagnostics.report_error("E305", &loc(0, 9), "missing setting");
        diagnostics.report_singular_error("E401", &loc(1, 4), "missing");
        assert_eq!(diagnostics.len(), 3);

        diagnostics.begin_pass();
        diagnostics.report_singular_error("E401", &loc(1, 4), "missing");
        diagnostics.report_error("E402", &loc(1, 4), "circular");
        assert_eq!(diagnostics.len(), 4);
        assert_eq!(diagnostics.with_code("E402").count(), 1);
    }

    #[test]
    fn join_covers_both_locations() {
        assert_eq!(loc(4, 6).join(&loc(1, 3)), loc(1, 6));
        assert_eq!(loc(4, 6).end(), loc(6, 6));
    }

    #[test]
    fn display_lists_labels() {
        let diagnostic = Diagnostic::error("E201")
            .name("duplicate")
            .label(Label::at(&loc(0, 2)).message("first"))
            .label("note");

        assert_eq!(
            diagnostic.to_string(),
            "Error E201: duplicate\n\tError [SourceId(0)@0..2]: first\n\tError: note"
        );
    }
}
