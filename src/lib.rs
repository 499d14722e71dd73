//! # lc3gen
//!
//! Lowers a typed SSA intermediate representation onto the LC-3 educational
//! 16-bit instruction set, producing a single assembly unit ready for an
//! LC-3 assembler and simulator.
//!
//! LC-3 offers eight general-purpose registers, a narrow PC-relative offset
//! field, no hardware multiply, divide, or shift, and memory-mapped I/O.
//! The lowering therefore synthesizes everything from a tiny primitive set:
//! arithmetic expands into `ADD`/`AND`/`NOT` loops, every SSA value is
//! spilled to a per-function stack frame addressed through R5, constants
//! live in per-block pools reachable by PC-relative `LD`, and phi nodes
//! resolve their predecessor by comparing the label the predecessor left in
//! R7.
//!
//! ## Pipeline
//!
//! 1. Build a [`ir::Module`] in memory, typically through
//!    [`ir::IrBuilder`].
//! 2. [`transform::Canonicalize`] rewrites the handful of shapes the
//!    lowering does not want to see (constant-on-the-left compares,
//!    `sub`-by-constant, min/max intrinsics, equality branches, constant
//!    `lshr`, disjoint `or`).
//! 3. [`codegen::generate_lc3_assembly`] drives the per-function frame
//!    layout, the per-instruction expansion, and the `.ORIG`/`.END`
//!    envelope.
//!
//! [`compile_module`] runs steps 2 and 3; [`emit_module_to_file`] wraps it
//! with the all-or-nothing output-file convention.
//!
//! ```rust
//! use lc3gen::{compile_module, CodegenOptions};
//! use lc3gen::ir::builder::cstr;
//! use lc3gen::ir::IrBuilder;
//!
//! let mut b = IrBuilder::new("hello.c");
//! b.declaration("printStr", &["s"]);
//! b.function("main", &[])
//!     .call_void("printStr", &[cstr("Hello, world!\n")])
//!     .ret_void();
//! let mut module = b.build();
//!
//! let mut asm = Vec::new();
//! compile_module(&mut module, &mut asm, &CodegenOptions::default()).unwrap();
//! let asm = String::from_utf8(asm).unwrap();
//! assert!(asm.contains("\tPUTS\n"));
//! ```

pub mod codegen;
pub mod error;
pub mod ir;
pub mod transform;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub use codegen::{generate_lc3_assembly, CodegenError, CodegenOptions};
pub use error::{Lc3genError, Result};
pub use ir::{
    BasicBlock, BinaryOp, CastKind, Function, IcmpPred, Instruction, IrBuilder, Module, Value,
};
pub use transform::Canonicalize;

/// Canonicalize `module` in place and lower it to LC-3 assembly on `writer`.
pub fn compile_module<W: Write>(
    module: &mut Module,
    writer: &mut W,
    opts: &CodegenOptions,
) -> Result<()> {
    Canonicalize.run_on_module(module);
    generate_lc3_assembly(module, writer, opts)
}

/// Compile `module` and write `<stem>.asm` next to the current directory,
/// where `<stem>` is the stem of the module's source file name.
///
/// Emission is all-or-nothing: the assembly is rendered to memory first and
/// the output file is only created on success, so a failed module never
/// leaves partial assembly on disk. Outcome diagnostics go to stderr.
pub fn emit_module_to_file(module: &mut Module, opts: &CodegenOptions) -> Result<PathBuf> {
    emit_module_in_dir(module, opts, Path::new("."))
}

fn emit_module_in_dir(module: &mut Module, opts: &CodegenOptions, dir: &Path) -> Result<PathBuf> {
    let stem = Path::new(&module.source_file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    let target = dir.join(format!("{}.asm", stem));

    let mut buffer = Vec::new();
    match compile_module(module, &mut buffer, opts) {
        Ok(()) => {
            fs::write(&target, &buffer)?;
            eprintln!("One file generated: {}", target.display());
            Ok(target)
        }
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("No File Generated");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::{int, var};

    fn test_dir(case: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lc3gen_{}_{}", case, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_emit_writes_file_on_success() {
        let mut b = IrBuilder::new("demo/answer.c");
        b.function("main", &[])
            .binary(BinaryOp::Add, "sum", int(40), int(2))
            .ret(var("sum"));
        let mut module = b.build();

        let dir = test_dir("ok");
        let path = emit_module_in_dir(&mut module, &CodegenOptions::default(), &dir).unwrap();
        assert_eq!(path, dir.join("answer.asm"));
        let asm = fs::read_to_string(&path).unwrap();
        assert!(asm.contains("\t.ORIG\tx3000\n"));
        assert!(asm.ends_with("\t.END\n"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_emit_leaves_no_file_on_unsupported_ir() {
        let mut b = IrBuilder::new("bad.c");
        b.function("main", &[])
            .binary(BinaryOp::FAdd, "x", int(1), int(2))
            .ret(var("x"));
        let mut module = b.build();

        let dir = test_dir("err");
        let err = emit_module_in_dir(&mut module, &CodegenOptions::default(), &dir).unwrap_err();
        assert!(format!("{}", err).contains("Unsupported Instruction: %x = fadd 1, 2"));
        assert!(!dir.join("bad.asm").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
