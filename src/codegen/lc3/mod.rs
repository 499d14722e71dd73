//! The LC-3 module driver.
//!
//! Emits the assembly envelope around the per-function generators: the
//! header comment, the `.ORIG` directive, the boot trampoline and
//! `STACK_BASE` word when the module defines `main`, every function body,
//! and the closing `.END`.

pub mod functions;
pub mod instructions;
pub mod intrinsics;
pub mod state;
pub mod util;

use std::io::Write;

use crate::codegen::CodegenOptions;
use crate::error::Result;
use crate::ir::Module;
use state::CodegenState;

/// Generate a complete LC-3 assembly unit for `module`.
///
/// The IR is expected to be canonicalized (see
/// [`Canonicalize`](crate::transform::Canonicalize)); un-canonicalized
/// modules still lower, but miss the rewrites that make equality branches
/// and constant shifts cheap.
pub fn generate_lc3_assembly<W: Write>(
    module: &Module,
    writer: &mut W,
    opts: &CodegenOptions,
) -> Result<()> {
    let mut state = CodegenState::new(opts.clone());

    writeln!(writer, "; This file is generated automatically by lc3gen.")?;
    writeln!(writer)?;
    if !state.opts.no_comment {
        writeln!(writer, "; R6 : stack pointer")?;
        writeln!(writer, "; R5 : frame pointer")?;
        writeln!(writer)?;
    }
    writeln!(writer, "\t.ORIG\t{}", state.opts.start_addr)?;

    // The trampoline loads the stack base and jumps over the STACK_BASE
    // word into main. Both appear only when the module defines main, so
    // every emitted reference has a definition.
    let main = module.get_function("main").filter(|f| !f.is_declaration());
    if let Some(main) = main {
        let entry = state.block_label(&main.name, &main.blocks[0].name);
        writeln!(writer, "\tLD\t\tR6, STACK_BASE")?;
        writeln!(writer, "\tBR\t\t{}", entry)?;
        writeln!(writer)?;
        writeln!(writer, "STACK_BASE")?;
        writeln!(writer, "\t.FILL\t{}", state.opts.stack_base)?;
        writeln!(writer)?;
    }

    functions::generate_functions(module, writer, &mut state)?;
    writeln!(writer, "\t.END")?;
    Ok(())
}
