//! Kiln - back end for the cinder teaching language
//!
//! Kiln takes a checked cinder program, lowers it to a flat list of
//! quadruples, optionally optimizes that list and renders it as LLVM-IR
//! style text. The [`vm`] module can execute the quadruples directly.
//!
//! ```text
//! source -> cinder::parse -> cinder::analyze -> generate_ir -> optimize -> emit
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod codegen;
pub mod ir;
pub mod optimize;
pub mod vm;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use backend::{Backend, Emission, LlvmTextBackend};
use cinder::errors::{LexicalError, SemanticError, SyntaxError};
use cinder::parser::ast::Program;
use cinder::semantic::annotate::AnnotatedNode;
use cinder::semantic::scope::Symbol;
use codegen::IrOutput;
use optimize::Optimized;

pub use backend::emit;
pub use codegen::generate_ir;
pub use optimize::optimize;

/// Kiln version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings for one compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Run the optimizer before emission
    pub optimize: bool,
    /// Triple written into the emitted module
    pub target_triple: String,
    /// Step bound for [`vm::run`]
    pub max_steps: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            target_triple: backend::llvm::DEFAULT_TARGET_TRIPLE.to_string(),
            max_steps: vm::DEFAULT_MAX_STEPS,
        }
    }
}

/// Every artifact of a successful compile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compilation {
    /// Parsed program
    pub ast: Program,
    /// Symbol table from semantic analysis
    pub symbols: Vec<Symbol>,
    /// Type-annotated tree
    pub annotated: AnnotatedNode,
    /// Quadruples straight from lowering
    pub ir: IrOutput,
    /// Optimizer output, when optimization is enabled
    pub optimized: Option<Optimized>,
    /// Emitted target text
    pub emission: Emission,
}

impl Compilation {
    /// Quadruples that were handed to the backend.
    pub fn final_quadruples(&self) -> &[ir::Quadruple] {
        match &self.optimized {
            Some(optimized) => &optimized.quadruples,
            None => &self.ir.quadruples,
        }
    }
}

/// Main compiler interface
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    /// Options used by every compile
    pub options: CompileOptions,
}

impl Compiler {
    /// Create a compiler with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler with `options`
    pub fn with_options(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Compile cinder source text. Stops at the first stage that reports
    /// diagnostics; lexical errors win over syntax errors.
    pub fn compile_source(&self, source: &str) -> Result<Compilation, CompileError> {
        let parsed = cinder::parse(source);
        if !parsed.lexical_errors.is_empty() {
            return Err(CompileError::Lexical(parsed.lexical_errors));
        }
        if !parsed.errors.is_empty() {
            return Err(CompileError::Syntax(parsed.errors));
        }
        let program = parsed.ast.ok_or_else(|| {
            CompileError::Syntax(vec![SyntaxError {
                message: "expected 'main'".to_string(),
                line: 1,
                column: 1,
            }])
        })?;
        self.compile_program(program)
    }

    /// Compile an already parsed program.
    pub fn compile_program(&self, program: Program) -> Result<Compilation, CompileError> {
        let analysis = cinder::analyze(&program);
        if !analysis.errors.is_empty() {
            return Err(CompileError::Semantic(analysis.errors));
        }

        let ir = generate_ir(&program, &analysis.symbols);
        if !ir.diagnostics.is_empty() {
            return Err(CompileError::Internal(ir.diagnostics));
        }
        let optimized = self.options.optimize.then(|| optimize(&ir.quadruples));
        let backend = LlvmTextBackend::new(self.options.target_triple.clone());
        let quadruples = match &optimized {
            Some(optimized) => &optimized.quadruples,
            None => &ir.quadruples,
        };
        let emission = backend.emit(quadruples, &analysis.symbols);
        debug!(
            backend = backend.name(),
            quadruples = quadruples.len(),
            warnings = emission.warnings.len(),
            "compiled program"
        );

        Ok(Compilation {
            ast: program,
            symbols: analysis.symbols,
            annotated: analysis.annotated,
            ir,
            optimized,
            emission,
        })
    }

    /// Execute a compilation's final quadruples with [`vm::run`].
    pub fn run(
        &self,
        compilation: &Compilation,
        input: &mut dyn vm::InputSource,
    ) -> Result<vm::Execution, CompileError> {
        vm::run(
            compilation.final_quadruples(),
            &compilation.symbols,
            input,
            self.options.max_steps,
        )
        .map_err(CompileError::Runtime)
    }
}

/// Compilation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// The source did not tokenize
    #[error("{} lexical error(s)", .0.len())]
    Lexical(Vec<LexicalError>),
    /// The source did not parse
    #[error("{} syntax error(s)", .0.len())]
    Syntax(Vec<SyntaxError>),
    /// The program failed semantic analysis
    #[error("{} semantic error(s)", .0.len())]
    Semantic(Vec<SemanticError>),
    /// Lowering disagreed with the symbol table produced by analysis
    #[error("internal compiler error: {}", .0.join("; "))]
    Internal(Vec<String>),
    /// The simulator stopped with an error
    #[error("runtime error: {0}")]
    Runtime(#[from] vm::VmError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_optimize() {
        let compiler = Compiler::new();
        assert!(compiler.options.optimize);
        assert_eq!(compiler.options.max_steps, vm::DEFAULT_MAX_STEPS);
    }

    #[test]
    fn internal_errors_list_every_problem() {
        let err = CompileError::Internal(vec![
            "unresolved name 'a'".to_string(),
            "unresolved name 'b'".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "internal compiler error: unresolved name 'a'; unresolved name 'b'"
        );
    }
}
