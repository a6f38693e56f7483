//! Error types for the generator.
//!
//! Every variant is fatal: a run either produces complete output or nothing.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Source text could not be turned into declarations.
    #[error("parse error at {line}:{column}: {message}")]
    Parse { line: usize, column: usize, message: String },

    /// A generated fragment carries no `export type` / `export const` name.
    #[error("could not extract type or variable name from generated fragment:\n{fragment}")]
    UnnameableFragment { fragment: String },

    /// The declaration list broke a precondition (empty or duplicate name).
    #[error("declaration contract violated: {0}")]
    ExtractorContract(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The bundled TypeScript grammar does not match the tree-sitter runtime.
    #[error("TypeScript grammar could not be loaded: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Parse { line, column, message: message.into() }
    }
}
