//! Code generation backends.
//!
//! The only target is LC-3. Errors here form a single taxonomy: an IR shape
//! the lowering cannot express aborts emission for the whole module, with a
//! diagnostic preserving the offending IR text.

pub mod lc3;

pub use lc3::generate_lc3_assembly;

use std::fmt;

/// Configuration for assembly generation.
///
/// Field meanings and defaults mirror the command-line flags of the hosting
/// pass framework: `lc3-start-addr`, `lc3-stack-base`, `signed-mul`,
/// `no-comment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Value emitted after `.ORIG`.
    pub start_addr: String,
    /// Initial stack pointer, the word stored at `STACK_BASE`.
    pub stack_base: String,
    /// When true, `mul` lowering inserts an absolute-value preamble so the
    /// repeated-addition loop terminates for negative multipliers.
    pub signed_mul: bool,
    /// When true, suppresses IR-as-comment preambles and register-usage
    /// hints in the output.
    pub no_comment: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            start_addr: "x3000".to_string(),
            stack_base: "xFE00".to_string(),
            signed_mul: false,
            no_comment: false,
        }
    }
}

/// Error types specific to codegen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// IR the lowering cannot express on LC-3. Carries the printed form of
    /// the offending construct.
    UnsupportedInstruction(String),
    /// A function's frame grew past the 32 slots the two-step stack
    /// adjustment can address.
    TooManyLocals(usize),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::UnsupportedInstruction(ir) => {
                write!(f, "Unsupported Instruction: {}", ir)
            }
            CodegenError::TooManyLocals(count) => {
                write!(f, "Too many local variables: {}", count)
            }
        }
    }
}

impl std::error::Error for CodegenError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = CodegenOptions::default();
        assert_eq!(opts.start_addr, "x3000");
        assert_eq!(opts.stack_base, "xFE00");
        assert!(!opts.signed_mul);
        assert!(!opts.no_comment);
    }

    #[test]
    fn test_display_unsupported() {
        let err = CodegenError::UnsupportedInstruction("%r = fadd %a, %b".to_string());
        assert_eq!(
            format!("{}", err),
            "Unsupported Instruction: %r = fadd %a, %b"
        );
    }
}
