#![forbid(unsafe_code)]

mod analysis;
mod codegen;
mod compiler;
mod diagnostic;
pub mod ios;
mod lexer;
mod parser;
mod token;
mod util;

pub use analysis::{AnalysisContext, CompilationTimestamp};
pub use codegen::CodegenError;
pub use compiler::{AsnCompiler, Features, SourceId};
pub use diagnostic::{Diagnostic, Diagnostics, Label, Level, Location};
pub use parser::{BlockParser, ParserError};
pub use token::{TokenBlock, TokenBuffer, TokenKind};

const _: () = assert!(
    unicode_normalization::UNICODE_VERSION.0 == 15
        && unicode_normalization::UNICODE_VERSION.1 == 1
        && unicode_normalization::UNICODE_VERSION.2 == 0,
    "Mismatched unicode normalisation version"
);
