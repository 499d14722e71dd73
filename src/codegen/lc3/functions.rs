//! Per-function assembly generation: prologue, epilogue, argument spills,
//! and the block walk.
//!
//! The body of a function is emitted into a buffer first, because the
//! prologue's stack adjustment needs the final frame slot count and slots
//! are allocated lazily while the body is lowered. Arguments are interned
//! ahead of the body, so they always occupy the first slots.

use std::fmt::Write as FmtWrite;
use std::io::Write;

use super::instructions::generate_instruction;
use super::intrinsics::is_intrinsic;
use super::state::{sanitize, CodegenState, ConstPool, FunctionContext, MAX_CALL_ARGS, MAX_FRAME_SLOTS};
use crate::codegen::CodegenError;
use crate::error::Result;
use crate::ir::{Function, Module};

/// Generate assembly for every function definition in the module.
/// Declarations and the reserved runtime names are skipped.
pub fn generate_functions<W: Write>(
    module: &Module,
    writer: &mut W,
    state: &mut CodegenState,
) -> Result<()> {
    for func in &module.functions {
        if func.is_declaration() || is_intrinsic(&func.name) {
            continue;
        }
        let text = generate_function(func, module, state)?;
        writer.write_all(text.as_bytes())?;
    }
    Ok(())
}

/// Generate the complete text of one function: labels, prologue, argument
/// spills, blocks with their constant pools.
pub fn generate_function(
    func: &Function,
    module: &Module,
    state: &mut CodegenState,
) -> Result<String> {
    if func.params.len() > MAX_CALL_ARGS {
        return Err(CodegenError::UnsupportedInstruction(format!(
            "define @{}({} arguments)",
            func.name,
            func.params.len()
        ))
        .into());
    }

    let mut fx = FunctionContext::new();
    for param in &func.params {
        fx.slot(param);
    }

    let entry_label = state.block_label(&func.name, &func.blocks[0].name);

    let mut body = String::new();
    for (bi, block) in func.blocks.iter().enumerate() {
        let label = state.block_label(&func.name, &block.name);
        if bi > 0 {
            if !state.opts.no_comment {
                writeln!(body, "; {}", block.name)?;
            }
            writeln!(body, "{}", label)?;
        }
        let mut pool = ConstPool::new();
        for instr in &block.instructions {
            generate_instruction(
                instr, &mut body, module, func, &label, state, &mut fx, &mut pool,
            )?;
        }
        writeln!(body)?;
        if !pool.is_empty() {
            writeln!(body, "; static value section for {}", label)?;
            writeln!(body, "{}", pool.text())?;
        }
    }

    if fx.slot_count > MAX_FRAME_SLOTS {
        return Err(CodegenError::TooManyLocals(fx.slot_count).into());
    }

    let mut out = String::new();
    writeln!(out, "; function {}", func.name)?;
    writeln!(out, "; local variable count: {}", fx.slot_count)?;
    writeln!(out, "{}", sanitize(&func.name))?;
    writeln!(out, "{}", entry_label)?;
    emit_prologue(&mut out, state, &mut fx, func)?;
    out.push_str(&body);
    Ok(out)
}

/// Reserve the seven-word save area, establish the frame pointer, claim the
/// local area, and spill incoming arguments to their slots.
fn emit_prologue(
    out: &mut String,
    state: &CodegenState,
    fx: &mut FunctionContext,
    func: &Function,
) -> Result<()> {
    if !state.opts.no_comment {
        writeln!(out, "; save registers, set up frame")?;
    }
    writeln!(out, "\tADD\t\tR6, R6, #-7")?;
    writeln!(out, "\tSTR\t\tR0, R6, #6")?;
    writeln!(out, "\tSTR\t\tR1, R6, #5")?;
    writeln!(out, "\tSTR\t\tR2, R6, #4")?;
    writeln!(out, "\tSTR\t\tR3, R6, #3")?;
    writeln!(out, "\tSTR\t\tR4, R6, #2")?;
    writeln!(out, "\tSTR\t\tR7, R6, #1")?;
    writeln!(out, "\tSTR\t\tR5, R6, #0")?;
    writeln!(out, "\tADD\t\tR5, R6, #0")?;

    let mut remaining = fx.slot_count;
    if remaining > 16 {
        writeln!(out, "\tADD\t\tR6, R6, #-16")?;
        remaining -= 16;
    }
    if remaining > 0 {
        writeln!(out, "\tADD\t\tR6, R6, #-{}", remaining)?;
    }

    if !func.params.is_empty() {
        if !state.opts.no_comment {
            writeln!(out, "; store arguments")?;
        }
        for (i, param) in func.params.iter().enumerate() {
            writeln!(out, "\tSTR\t\tR{}, R5, #{}", i, fx.offset(param))?;
        }
    }
    Ok(())
}

/// Unwind the frame at a `ret` site. The caller has already placed any
/// return value in R0; R0 is only restored for void returns.
pub fn emit_epilogue(
    out: &mut String,
    state: &CodegenState,
    returns_value: bool,
) -> Result<()> {
    if !state.opts.no_comment {
        writeln!(out, "; restore saved registers")?;
    }
    writeln!(out, "\tADD\t\tR6, R5, #0")?;
    writeln!(out, "\tLDR\t\tR5, R6, #0")?;
    writeln!(out, "\tLDR\t\tR7, R6, #1")?;
    writeln!(out, "\tLDR\t\tR4, R6, #2")?;
    writeln!(out, "\tLDR\t\tR3, R6, #3")?;
    writeln!(out, "\tLDR\t\tR2, R6, #4")?;
    writeln!(out, "\tLDR\t\tR1, R6, #5")?;
    if !returns_value {
        writeln!(out, "\tLDR\t\tR0, R6, #6")?;
    }
    writeln!(out, "\tADD\t\tR6, R6, #7")?;
    writeln!(out, "\tRET")?;
    Ok(())
}
