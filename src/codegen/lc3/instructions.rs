//! Per-instruction lowering onto LC-3 sequences.
//!
//! Every SSA value lives in its frame slot; no value is assumed live in a
//! register across an IR boundary. Operands are materialized into R1/R2
//! (R1 holds the left operand, R2 the right), loop expansions accumulate in
//! R3 and R4, and results are stored back through R5.
//!
//! Multi-word expansions (`mul`, `udiv`, `urem`, `shl`, `lshr`) mint fresh
//! temp labels from the module-wide counter, so the loops of two expansions
//! can never capture each other's branches.

use std::fmt::Write;

use super::functions::emit_epilogue;
use super::intrinsics::{generate_intrinsic_call, is_intrinsic};
use super::state::{CodegenState, ConstPool, FunctionContext, MAX_CALL_ARGS};
use super::util::{emit_branch, emit_label, emit_negate, load_negated, load_value};
use crate::codegen::CodegenError;
use crate::error::{Lc3genError, Result};
use crate::ir::{BinaryOp, Function, IcmpPred, Instruction, Module, Value};

fn unsupported(instr: &Instruction) -> Lc3genError {
    CodegenError::UnsupportedInstruction(instr.to_string()).into()
}

/// The branch that *skips* setting the compare result to true. The CC after
/// `ADD R1, R1, R2` reflects `lhs - rhs`; signed and unsigned predicates
/// share the mapping (see [`IcmpPred`]).
fn icmp_skip_branch(pred: IcmpPred) -> &'static str {
    match pred {
        IcmpPred::Eq => "BRnp",
        IcmpPred::Ne => "BRz",
        IcmpPred::Sgt | IcmpPred::Ugt => "BRnz",
        IcmpPred::Sge | IcmpPred::Uge => "BRn",
        IcmpPred::Slt | IcmpPred::Ult => "BRzp",
        IcmpPred::Sle | IcmpPred::Ule => "BRp",
    }
}

/// Generate LC-3 assembly for a single instruction.
#[allow(clippy::too_many_arguments)]
pub fn generate_instruction(
    instr: &Instruction,
    out: &mut String,
    module: &Module,
    func: &Function,
    block_label: &str,
    state: &mut CodegenState,
    fx: &mut FunctionContext,
    pool: &mut ConstPool,
) -> Result<()> {
    if !state.opts.no_comment {
        writeln!(out, ";  {}", instr)?;
    }

    match instr {
        Instruction::Binary {
            op,
            result,
            lhs,
            rhs,
            ..
        } => generate_binary(instr, out, *op, result, lhs, rhs, state, fx, pool)?,

        Instruction::Icmp {
            pred,
            result,
            lhs,
            rhs,
        } => {
            let res_off = fx.offset(result);
            writeln!(out, "\tAND\t\tR3, R3, #0")?;
            load_value(out, lhs, "R1", state, fx, pool)?;
            load_negated(out, rhs, "R2", state, fx, pool)?;
            writeln!(out, "\tADD\t\tR1, R1, R2")?;
            let end = state.temp_label("ICMP_END");
            emit_branch(out, icmp_skip_branch(*pred), &end)?;
            writeln!(out, "\tADD\t\tR3, R3, #1")?;
            emit_label(out, &end)?;
            writeln!(out, "\tSTR\t\tR3, R5, #{}", res_off)?;
        }

        Instruction::Select {
            result,
            cond,
            if_true,
            if_false,
        } => {
            let res_off = fx.offset(result);
            load_value(out, if_true, "R2", state, fx, pool)?;
            load_value(out, cond, "R1", state, fx, pool)?;
            let end = state.temp_label("SELECT_END");
            emit_branch(out, "BRp", &end)?;
            load_value(out, if_false, "R2", state, fx, pool)?;
            emit_label(out, &end)?;
            writeln!(out, "\tSTR\t\tR2, R5, #{}", res_off)?;
        }

        Instruction::Cast { result, value, .. } => {
            // 16-bit throughout: every cast is a slot-to-slot copy.
            let res_off = fx.offset(result);
            load_value(out, value, "R1", state, fx, pool)?;
            writeln!(out, "\tSTR\t\tR1, R5, #{}", res_off)?;
        }

        Instruction::Alloca { .. } => {
            // The slot the alloca names is the storage itself; loads and
            // stores through its pointer address it directly.
        }

        Instruction::Load { result, ptr } => {
            let res_off = fx.offset(result);
            let ptr_off = match ptr {
                Value::Temp(name) => fx.offset(name),
                _ => return Err(unsupported(instr)),
            };
            writeln!(out, "\tLDR\t\tR1, R5, #{}", ptr_off)?;
            writeln!(out, "\tSTR\t\tR1, R5, #{}", res_off)?;
        }

        Instruction::Store { value, ptr } => {
            load_value(out, value, "R1", state, fx, pool)?;
            let ptr_off = match ptr {
                Value::Temp(name) => fx.offset(name),
                _ => return Err(unsupported(instr)),
            };
            writeln!(out, "\tSTR\t\tR1, R5, #{}", ptr_off)?;
        }

        Instruction::Br { target } => {
            writeln!(out, "\tLEA\t\tR7, {}", block_label)?;
            let target = state.block_label(&func.name, target);
            emit_branch(out, "BR", &target)?;
        }

        Instruction::CondBr {
            cond,
            if_true,
            if_false,
        } => {
            writeln!(out, "\tLEA\t\tR7, {}", block_label)?;
            load_value(out, cond, "R1", state, fx, pool)?;
            let false_label = state.block_label(&func.name, if_false);
            let true_label = state.block_label(&func.name, if_true);
            emit_branch(out, "BRz", &false_label)?;
            emit_branch(out, "BR", &true_label)?;
        }

        Instruction::Switch {
            cond,
            default,
            cases,
        } => {
            writeln!(out, "\tLEA\t\tR7, {}", block_label)?;
            load_value(out, cond, "R1", state, fx, pool)?;
            for (value, target) in cases {
                let id = pool.intern_int(state, value.wrapping_neg())?;
                writeln!(out, "\tLD\t\tR2, VALUE_{}", id)?;
                writeln!(out, "\tADD\t\tR2, R1, R2")?;
                let target = state.block_label(&func.name, target);
                emit_branch(out, "BRz", &target)?;
            }
            let default = state.block_label(&func.name, default);
            emit_branch(out, "BR", &default)?;
        }

        Instruction::Phi { result, incomings } => {
            if incomings.is_empty() {
                return Err(unsupported(instr));
            }
            let res_off = fx.offset(result);
            // R7 still holds the label the predecessor recorded before
            // branching here; compare its negation against each candidate.
            writeln!(out, "\tNOT\t\tR0, R7")?;
            writeln!(out, "\tADD\t\tR0, R0, #1")?;
            let end = state.temp_label("PHI_NEXT");
            let last = incomings.len() - 1;
            for (i, (pred, value)) in incomings.iter().enumerate() {
                if i < last {
                    let next = state.temp_label("PHI_NEXT");
                    let pred_label = state.block_label(&func.name, pred);
                    writeln!(out, "\tLEA\t\tR1, {}", pred_label)?;
                    writeln!(out, "\tADD\t\tR1, R1, R0")?;
                    emit_branch(out, "BRnp", &next)?;
                    load_value(out, value, "R1", state, fx, pool)?;
                    writeln!(out, "\tSTR\t\tR1, R5, #{}", res_off)?;
                    emit_branch(out, "BR", &end)?;
                    emit_label(out, &next)?;
                } else {
                    load_value(out, value, "R1", state, fx, pool)?;
                    writeln!(out, "\tSTR\t\tR1, R5, #{}", res_off)?;
                }
            }
            emit_label(out, &end)?;
        }

        Instruction::Call {
            result,
            callee,
            args,
        } => {
            if is_intrinsic(callee) {
                return generate_intrinsic_call(instr, out, state, fx, pool);
            }
            let target = match module.get_function(callee) {
                Some(target) if !target.is_declaration() => target,
                _ => return Err(unsupported(instr)),
            };
            if args.len() > MAX_CALL_ARGS {
                return Err(unsupported(instr));
            }
            for (i, arg) in args.iter().enumerate() {
                let reg = format!("R{}", i);
                load_value(out, arg, &reg, state, fx, pool)?;
            }
            let entry = state.block_label(&target.name, &target.blocks[0].name);
            writeln!(out, "\tJSR\t\t{}", entry)?;
            if let Some(result) = result {
                writeln!(out, "\tSTR\t\tR0, R5, #{}", fx.offset(result))?;
            }
        }

        Instruction::Ret { value } => {
            if let Some(value) = value {
                load_value(out, value, "R0", state, fx, pool)?;
            }
            emit_epilogue(out, state, value.is_some())?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn generate_binary(
    instr: &Instruction,
    out: &mut String,
    op: BinaryOp,
    result: &str,
    lhs: &Value,
    rhs: &Value,
    state: &mut CodegenState,
    fx: &mut FunctionContext,
    pool: &mut ConstPool,
) -> Result<()> {
    let res_off = fx.offset(result);
    match op {
        BinaryOp::Add | BinaryOp::And | BinaryOp::Or => {
            load_value(out, rhs, "R2", state, fx, pool)?;
            load_value(out, lhs, "R1", state, fx, pool)?;
            match op {
                BinaryOp::Add => writeln!(out, "\tADD\t\tR1, R1, R2")?,
                BinaryOp::And => writeln!(out, "\tAND\t\tR1, R1, R2")?,
                _ => {
                    // De Morgan: a | b == ~(~a & ~b).
                    writeln!(out, "\tNOT\t\tR1, R1")?;
                    writeln!(out, "\tNOT\t\tR2, R2")?;
                    writeln!(out, "\tAND\t\tR1, R1, R2")?;
                    writeln!(out, "\tNOT\t\tR1, R1")?;
                }
            }
            writeln!(out, "\tSTR\t\tR1, R5, #{}", res_off)?;
        }

        BinaryOp::Sub => {
            load_negated(out, rhs, "R2", state, fx, pool)?;
            load_value(out, lhs, "R1", state, fx, pool)?;
            writeln!(out, "\tADD\t\tR1, R1, R2")?;
            writeln!(out, "\tSTR\t\tR1, R5, #{}", res_off)?;
        }

        BinaryOp::Shl => {
            load_value(out, rhs, "R2", state, fx, pool)?;
            load_value(out, lhs, "R1", state, fx, pool)?;
            let head = state.temp_label("SHL_LOOP");
            emit_label(out, &head)?;
            writeln!(out, "\tADD\t\tR1, R1, R1")?;
            writeln!(out, "\tADD\t\tR2, R2, #-1")?;
            emit_branch(out, "BRp", &head)?;
            writeln!(out, "\tSTR\t\tR1, R5, #{}", res_off)?;
        }

        BinaryOp::Mul => {
            writeln!(out, "\tAND\t\tR3, R3, #0")?;
            load_value(out, rhs, "R2", state, fx, pool)?;
            load_value(out, lhs, "R1", state, fx, pool)?;
            writeln!(out, "\tADD\t\tR2, R2, #0")?;
            let head = state.temp_label("MUL_LOOP");
            let end = state.temp_label("MUL_END");
            if state.opts.signed_mul {
                // Negating both operands preserves the product and makes
                // the counter nonnegative.
                emit_branch(out, "BRzp", &head)?;
                emit_negate(out, "R1")?;
                emit_negate(out, "R2")?;
            }
            emit_label(out, &head)?;
            emit_branch(out, "BRz", &end)?;
            writeln!(out, "\tADD\t\tR3, R3, R1")?;
            writeln!(out, "\tADD\t\tR2, R2, #-1")?;
            emit_branch(out, "BR", &head)?;
            emit_label(out, &end)?;
            writeln!(out, "\tSTR\t\tR3, R5, #{}", res_off)?;
        }

        BinaryOp::UDiv => {
            load_negated(out, rhs, "R2", state, fx, pool)?;
            load_value(out, lhs, "R1", state, fx, pool)?;
            writeln!(out, "\tAND\t\tR3, R3, #0")?;
            let head = state.temp_label("UDIV_LOOP");
            let end = state.temp_label("UDIV_END");
            let post = state.temp_label("UDIV_POST");
            emit_label(out, &head)?;
            writeln!(out, "\tADD\t\tR1, R1, R2")?;
            emit_branch(out, "BRnz", &end)?;
            writeln!(out, "\tADD\t\tR3, R3, #1")?;
            emit_branch(out, "BR", &head)?;
            emit_label(out, &end)?;
            // An exit on exactly zero remainder means the last subtraction
            // still counts.
            emit_branch(out, "BRn", &post)?;
            writeln!(out, "\tADD\t\tR3, R3, #1")?;
            emit_label(out, &post)?;
            writeln!(out, "\tSTR\t\tR3, R5, #{}", res_off)?;
        }

        BinaryOp::URem => {
            load_negated(out, rhs, "R2", state, fx, pool)?;
            load_value(out, lhs, "R1", state, fx, pool)?;
            let head = state.temp_label("UREM_LOOP");
            emit_label(out, &head)?;
            writeln!(out, "\tADD\t\tR1, R1, R2")?;
            emit_branch(out, "BRzp", &head)?;
            // Overshot by one divisor; add it back.
            emit_negate(out, "R2")?;
            writeln!(out, "\tADD\t\tR1, R1, R2")?;
            writeln!(out, "\tSTR\t\tR1, R5, #{}", res_off)?;
        }

        BinaryOp::LShr => {
            load_value(out, rhs, "R2", state, fx, pool)?;
            load_value(out, lhs, "R1", state, fx, pool)?;
            writeln!(out, "\tSTR\t\tR1, R5, #{}", res_off)?;
            writeln!(out, "\tADD\t\tR2, R2, #0")?;
            let head = state.temp_label("LSHR_LOOP");
            let bit = state.temp_label("LSHR_BIT");
            let skip = state.temp_label("LSHR_SKIP");
            let end = state.temp_label("LSHR_END");
            emit_branch(out, "BRnz", &end)?;
            // One pass shifts right by one: walk source bits 1..15 with a
            // doubling mask in R3, mirroring each set bit one position down
            // with the mask in R4, accumulating in R0. The value being
            // shifted stays in the result slot between passes.
            emit_label(out, &head)?;
            writeln!(out, "\tAND\t\tR0, R0, #0")?;
            writeln!(out, "\tAND\t\tR3, R3, #0")?;
            writeln!(out, "\tADD\t\tR3, R3, #2")?;
            writeln!(out, "\tAND\t\tR4, R4, #0")?;
            writeln!(out, "\tADD\t\tR4, R4, #1")?;
            emit_label(out, &bit)?;
            writeln!(out, "\tLDR\t\tR1, R5, #{}", res_off)?;
            writeln!(out, "\tAND\t\tR1, R1, R3")?;
            emit_branch(out, "BRz", &skip)?;
            writeln!(out, "\tADD\t\tR0, R0, R4")?;
            emit_label(out, &skip)?;
            writeln!(out, "\tADD\t\tR4, R4, R4")?;
            writeln!(out, "\tADD\t\tR3, R3, R3")?;
            emit_branch(out, "BRnp", &bit)?;
            writeln!(out, "\tSTR\t\tR0, R5, #{}", res_off)?;
            writeln!(out, "\tADD\t\tR2, R2, #-1")?;
            emit_branch(out, "BRp", &head)?;
            emit_label(out, &end)?;
        }

        BinaryOp::Xor
        | BinaryOp::AShr
        | BinaryOp::FAdd
        | BinaryOp::FSub
        | BinaryOp::FMul
        | BinaryOp::FDiv => return Err(unsupported(instr)),
    }
    Ok(())
}
