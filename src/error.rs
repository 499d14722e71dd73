//! Error types for the lc3gen lowering library.
//!
//! All fallible operations in the crate return [`Result`], whose error type
//! wraps the codegen-specific errors together with the I/O errors raised
//! while writing the finished assembly unit.

use crate::codegen::CodegenError;
use std::error::Error;
use std::fmt;

/// Main error type for the lowering library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lc3genError {
    /// Errors during LC-3 code generation.
    Codegen(CodegenError),
    /// I/O errors when writing the output file or stream.
    Io(String),
}

impl fmt::Display for Lc3genError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lc3genError::Codegen(err) => write!(f, "{}", err),
            Lc3genError::Io(msg) => write!(f, "IO Error: {}", msg),
        }
    }
}

impl Error for Lc3genError {}

impl From<CodegenError> for Lc3genError {
    fn from(err: CodegenError) -> Self {
        Lc3genError::Codegen(err)
    }
}

impl From<std::io::Error> for Lc3genError {
    fn from(err: std::io::Error) -> Self {
        Lc3genError::Io(err.to_string())
    }
}

impl From<fmt::Error> for Lc3genError {
    fn from(err: fmt::Error) -> Self {
        Lc3genError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Lc3genError>;
