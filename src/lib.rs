//! Front end of the cinder teaching language: lexing, parsing and scoped
//! semantic analysis. The back end (quadruples, optimizer, emitter) lives
//! in the `kiln` crate.

pub mod errors;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use errors::{LexicalError, SemanticError, SyntaxError};
pub use lexer::{lexical_errors, tokenize};
pub use parser::{parse, ParseOutput};
pub use semantic::{analyze, Analysis};
