pub mod pretty;

use thiserror::Error;

use crate::lexer::LexError;
use crate::parser::ParseError;

/// Failure to turn source text into a tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FrontendError {
    pub fn line(&self) -> usize {
        match self {
            FrontendError::Lex(err) => err.line,
            FrontendError::Parse(err) => err.line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            FrontendError::Lex(err) => err.column,
            FrontendError::Parse(err) => err.column,
        }
    }
}
