use std::fmt::Write;

use convert_case::{Case, Casing};

use crate::{
    analysis::AnalysisContext,
    ios::{AssignmentKind, Module},
};

/// Generate rust source code listing the checked object sets
#[derive(Debug)]
struct RustCodegen<'a, 'b> {
    analysis: &'a AnalysisContext<'b>,
    result: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodegenError {
    /// Cannot run codegen if any errors are present in the analysis context
    AnalysisErrors,

    /// Error during write to string? should never occur
    FmtError(std::fmt::Error),
}

type Result<T = (), E = CodegenError> = std::result::Result<T, E>;

impl AnalysisContext<'_> {
    /// Run the code generator to produce a rust source code listing with one
    /// module per ASN.1 module, holding the names of the objects in each of
    /// its object sets.  Objects and sets must already have been checked.
    pub fn rust_codegen(&self) -> Result<String> {
        if self.diagnostics.has_errors() {
            return Err(CodegenError::AnalysisErrors);
        }

        RustCodegen {
            analysis: self,
            result: String::new(),
        }
        .run()
    }
}

impl RustCodegen<'_, '_> {
    fn run(mut self) -> Result<String> {
        let analysis = self.analysis;
        for (_, module) in analysis.store().modules() {
            self.module(module)?;
        }

        Ok(self.result)
    }

    fn module(&mut self, module: &Module) -> Result {
        writeln!(self.result, "mod {} {{", module.name.to_case(Case::Snake))?;

        for assignment in &module.assignments {
            let AssignmentKind::ObjectSet(set) = assignment.kind else {
                continue;
            };

            write!(
                self.result,
                "\tpub const {}: &[&str] = &[",
                assignment.name.to_case(Case::ScreamingSnake)
            )?;
            let analysis = self.analysis;
            for (idx, &object) in analysis.flattened(set).iter().enumerate() {
                if idx > 0 {
                    write!(self.result, ", ")?;
                }
                write!(self.result, "{:?}", analysis.store().object(object).name())?;
            }
            writeln!(self.result, "];")?;
        }

        writeln!(self.result, "}}")?;

        Ok(())
    }
}

impl From<std::fmt::Error> for CodegenError {
    fn from(value: std::fmt::Error) -> Self {
        Self::FmtError(value)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{analysis::CompilationTimestamp, compiler::AsnCompiler};

    use super::*;

    #[test]
    fn lists_flattened_sets() {
        let mut compiler = AsnCompiler::new();
        compiler
            .add_file(
                "test.asn".into(),
                "My-Module DEFINITIONS ::= BEGIN
                    ITEM ::= CLASS { &id INTEGER UNIQUE } WITH SYNTAX { ID &id }
                    first ITEM ::= { ID 1 }
                    Item-Set ITEM ::= { first | { ID 2 } | first }
                END"
                .into(),
            )
            .unwrap();

        let mut analysis = compiler.analysis();
        analysis.check_all(CompilationTimestamp::new(1));
        assert_eq!(
            analysis.rust_codegen().unwrap(),
            "mod my_module {\n\tpub const ITEM_SET: &[&str] = &[\"first\", \"{ ID 2 }\"];\n}\n"
        );
    }

    #[test]
    fn refuses_erroneous_input() {
        let mut compiler = AsnCompiler::new();
        compiler
            .add_file(
                "test.asn".into(),
                "M DEFINITIONS ::= BEGIN
                    Set MISSING ::= { a }
                END"
                .into(),
            )
            .unwrap();

        let mut analysis = compiler.analysis();
        analysis.check_all(CompilationTimestamp::new(1));
        assert_eq!(analysis.rust_codegen(), Err(CodegenError::AnalysisErrors));
    }
}
