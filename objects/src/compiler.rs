//! The primary interface: source files go in, checked classes, objects and
//! object sets come out.

use std::ops::{Deref, DerefMut};

use crate::{
    analysis::{AnalysisContext, CompilationTimestamp},
    diagnostic::{Diagnostic, Diagnostics, Location},
    ios::{AssignmentKind, ModuleId, ObjectClassId, ObjectId, ObjectSetId, Store, SubParser},
    lexer::Lexer,
    parser::{BlockParser, Parser},
    token::TokenBlock,
};

/// Store of everything relating to a set of ASN.1 modules, including the
/// source files, the nodes of the information object system and the
/// diagnostics reported while checking them.
#[derive(Debug)]
pub struct AsnCompiler {
    /// List of all included source files.
    sources: Vec<Source>,

    /// The enabled features.
    features: Features,

    store: Store,

    /// Parser used for the token blocks kept by classes, objects and sets
    parser: Box<dyn SubParser>,

    diagnostics: Diagnostics,
}

/// All features that can be enabled within the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Features {
    /// Allow both upper and lowercase keywords.
    pub lowercase_keywords: bool,

    /// Allow non-ascii characters in identifiers
    pub unicode_identifiers: bool,

    /// Allow further whitespace characters
    pub unicode_whitespace: bool,
}

/// Information relating to a single source file
#[derive(Debug, Clone, PartialEq, Eq)]
struct Source {
    /// File name and path.
    file_name: String,

    /// Source text of the file
    source: String,
}

/// Reference to a single source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SourceId(usize);

impl SourceId {
    pub(crate) fn new(id: usize) -> Self {
        Self(id)
    }
}

impl Default for AsnCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl AsnCompiler {
    /// Create a new compiler using the builtin block parser
    pub fn new() -> Self {
        Self::with_parser(Box::new(BlockParser))
    }

    /// Create a compiler that reads object class, object and object set
    /// bodies with another parser
    pub fn with_parser(parser: Box<dyn SubParser>) -> Self {
        AsnCompiler {
            sources: vec![],
            features: Features::default(),
            store: Store::new(),
            parser,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Add a new file to the compiler.  The modules in the file are split
    /// into assignments, but the bodies of classes, objects and object sets
    /// are only parsed when they are checked.  The source is kept even when
    /// parsing fails so the error can be shown against it.
    pub fn add_file(&mut self, file_name: String, source: String) -> Result<SourceId, Diagnostic> {
        let id = SourceId(self.sources.len());
        log::info!("adding `{file_name}` as source {}", id.0);

        let tokens = Lexer::run(id, &source, self.features);
        let location = Location::new(id, 0..source.len());
        self.sources.push(Source { file_name, source });

        let block = TokenBlock {
            tokens: tokens?,
            location,
            scope: ModuleId::default(),
        };
        Parser::new(&block, 0).modules(&mut self.store, &mut self.diagnostics)?;

        Ok(id)
    }

    /// Text of a source file
    pub fn source_text(&self, id: SourceId) -> &str {
        &self.sources[id.0].source
    }

    /// File name a source was added with
    pub fn source_name(&self, id: SourceId) -> &str {
        &self.sources[id.0].file_name
    }

    /// Get an iterator over all source IDs
    pub fn sources(&self) -> impl Iterator<Item = SourceId> {
        (0..self.sources.len()).map(SourceId)
    }

    /// Context for checking and querying the nodes of all added files.
    pub fn analysis(&mut self) -> AnalysisContext<'_> {
        AnalysisContext::new(&mut self.store, &*self.parser, &mut self.diagnostics)
    }

    /// Check everything assigned in every module at the given timestamp
    pub fn check(&mut self, timestamp: CompilationTimestamp) {
        self.analysis().check_all(timestamp);
    }

    /// Everything reported so far, including duplicate assignments found
    /// while adding files
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Object class assigned to `name` in `module`
    pub fn class(&self, module: &str, name: &str) -> Option<ObjectClassId> {
        match self.assignment(module, name)? {
            AssignmentKind::ObjectClass(id) => Some(*id),
            _ => None,
        }
    }

    /// Object assigned to `name` in `module`
    pub fn object(&self, module: &str, name: &str) -> Option<ObjectId> {
        match self.assignment(module, name)? {
            AssignmentKind::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Object set assigned to `name` in `module`
    pub fn object_set(&self, module: &str, name: &str) -> Option<ObjectSetId> {
        match self.assignment(module, name)? {
            AssignmentKind::ObjectSet(id) => Some(*id),
            _ => None,
        }
    }

    fn assignment(&self, module: &str, name: &str) -> Option<&AssignmentKind> {
        let module = self.store.module_by_name(module)?;
        Some(&self.store.module(module).get(name)?.kind)
    }
}

impl Deref for AsnCompiler {
    type Target = Features;

    fn deref(&self) -> &Self::Target {
        &self.features
    }
}

impl DerefMut for AsnCompiler {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.features
    }
}
