//! Diagnostics produced by the front end.
//!
//! Every stage returns its diagnostics as data next to a best-effort result;
//! none of these types is ever used to abort a stage.

pub mod pretty;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("lexical error at line {line}, column {column}: {message}")]
pub struct LexicalError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("syntax error at line {line}, column {column}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    pub(crate) fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("semantic error at line {line}: {message}")]
pub struct SemanticError {
    pub message: String,
    pub line: usize,
    pub column: Option<usize>,
}

impl SemanticError {
    pub(crate) fn new(message: impl Into<String>, line: usize, column: Option<usize>) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Anything that can be pointed at in the source.
pub trait Diagnostic {
    fn severity(&self) -> &'static str {
        "error"
    }
    fn message(&self) -> &str;
    fn line(&self) -> usize;
    fn column(&self) -> Option<usize>;
    fn width(&self) -> usize {
        1
    }
}

impl Diagnostic for LexicalError {
    fn message(&self) -> &str {
        &self.message
    }
    fn line(&self) -> usize {
        self.line
    }
    fn column(&self) -> Option<usize> {
        Some(self.column)
    }
    fn width(&self) -> usize {
        self.length.max(1)
    }
}

impl Diagnostic for SyntaxError {
    fn message(&self) -> &str {
        &self.message
    }
    fn line(&self) -> usize {
        self.line
    }
    fn column(&self) -> Option<usize> {
        Some(self.column)
    }
}

impl Diagnostic for SemanticError {
    fn message(&self) -> &str {
        &self.message
    }
    fn line(&self) -> usize {
        self.line
    }
    fn column(&self) -> Option<usize> {
        self.column
    }
}
