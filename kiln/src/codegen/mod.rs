//! Intermediate code generation
//!
//! Checked AST -> ordered quadruple list. Every call builds a fresh
//! [`lowering::Lowering`] context, so temporaries and labels restart at
//! `t0` / `L0` and nothing leaks between compiles.

pub mod lowering;

use serde::Serialize;

use crate::ir::Quadruple;
use cinder::parser::ast::Program;
use cinder::semantic::scope::Symbol;

/// Result of intermediate code generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrOutput {
    /// Generated instructions, in execution order.
    pub quadruples: Vec<Quadruple>,
    /// Numbered listing of `quadruples`.
    pub text: String,
    /// Names or scopes the symbol table did not account for. Always empty
    /// for a program that passed analysis.
    pub diagnostics: Vec<String>,
}

/// Lower a checked program. `symbols` must come from analyzing `program`.
pub fn generate_ir(program: &Program, symbols: &[Symbol]) -> IrOutput {
    lowering::Lowering::new(symbols).lower_program(program)
}
