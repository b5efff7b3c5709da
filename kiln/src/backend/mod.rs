//! Target code emitters
//!
//! A backend turns the (optimized) quadruple list plus the symbol table
//! into target text. Emission never fails: anything the backend cannot
//! express is replaced by a neutral placeholder and reported in
//! [`Emission::warnings`].

pub mod llvm;

use serde::Serialize;

use crate::ir::Quadruple;
use cinder::semantic::scope::Symbol;

pub use llvm::LlvmTextBackend;

/// Code generation backend trait
pub trait Backend {
    /// Render `quadruples` as target text.
    fn emit(&self, quadruples: &[Quadruple], symbols: &[Symbol]) -> Emission;

    /// Get backend name
    fn name(&self) -> &'static str;
}

/// Emitted target text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Emission {
    /// The generated code
    pub text: String,
    /// One `warning: ...` line per placeholder substituted
    pub warnings: Vec<String>,
}

/// Emit with the default [`LlvmTextBackend`].
pub fn emit(quadruples: &[Quadruple], symbols: &[Symbol]) -> Emission {
    LlvmTextBackend::default().emit(quadruples, symbols)
}
