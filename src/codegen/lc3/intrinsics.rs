//! The runtime intrinsic bridge.
//!
//! The runtime header declares a small API whose bodies are single trap or
//! memory sequences. Calls to these names never go through the general
//! calling convention; they are pattern-matched here and expanded inline.
//! String-typed arguments must be compile-time constant strings, because
//! LC-3 has no runtime string handling; any other shape aborts emission.

use std::fmt::Write;

use super::state::{CodegenState, ConstPool, FunctionContext};
use super::util::load_value;
use crate::codegen::CodegenError;
use crate::error::{Lc3genError, Result};
use crate::ir::{Instruction, Value};

/// Reserved runtime names. Definitions and declarations carrying one of
/// these names are skipped by the module driver.
pub const INTRINSIC_NAMES: &[&str] = &[
    "printStr",
    "printStrAddr",
    "printChar",
    "printCharAddr",
    "integrateLC3Asm",
    "loadLabel",
    "loadAddr",
    "readLabelAddr",
    "storeLabel",
    "storeAddr",
];

pub fn is_intrinsic(name: &str) -> bool {
    INTRINSIC_NAMES.contains(&name)
}

fn unsupported(instr: &Instruction) -> Lc3genError {
    CodegenError::UnsupportedInstruction(instr.to_string()).into()
}

/// Expand a call to a runtime intrinsic. The caller has already matched the
/// callee name against [`is_intrinsic`].
pub fn generate_intrinsic_call(
    instr: &Instruction,
    out: &mut String,
    state: &mut CodegenState,
    fx: &mut FunctionContext,
    pool: &mut ConstPool,
) -> Result<()> {
    let (result, callee, args) = match instr {
        Instruction::Call {
            result,
            callee,
            args,
        } => (result.as_deref(), callee.as_str(), args.as_slice()),
        _ => return Err(unsupported(instr)),
    };

    match callee {
        "printStr" => {
            let [arg] = args else {
                return Err(unsupported(instr));
            };
            match arg {
                Value::Str(s) => {
                    let id = pool.intern_str(state, s)?;
                    writeln!(out, "\tLEA\t\tR0, VALUE_{}", id)?;
                }
                Value::Temp(name) => {
                    writeln!(out, "\tADD\t\tR0, R5, #{}", fx.offset(name))?;
                }
                Value::Const(_) => return Err(unsupported(instr)),
            }
            writeln!(out, "\tPUTS")?;
        }
        "printStrAddr" => {
            let [arg] = args else {
                return Err(unsupported(instr));
            };
            load_value(out, arg, "R0", state, fx, pool)?;
            writeln!(out, "\tPUTS")?;
        }
        "printChar" => {
            let [arg] = args else {
                return Err(unsupported(instr));
            };
            load_value(out, arg, "R0", state, fx, pool)?;
            writeln!(out, "\tOUT")?;
        }
        "printCharAddr" => {
            let [arg] = args else {
                return Err(unsupported(instr));
            };
            load_value(out, arg, "R1", state, fx, pool)?;
            writeln!(out, "\tLDR\t\tR0, R1, #0")?;
            writeln!(out, "\tOUT")?;
        }
        "integrateLC3Asm" => {
            let [arg] = args else {
                return Err(unsupported(instr));
            };
            match arg.as_const_str() {
                Some(content) if !content.is_empty() => {
                    writeln!(out, "{}", content)?;
                }
                _ => return Err(unsupported(instr)),
            }
        }
        "loadLabel" => {
            let [arg] = args else {
                return Err(unsupported(instr));
            };
            let res_off = result.map(|r| fx.offset(r));
            let label = require_label(instr, arg)?;
            writeln!(out, "\tLD\t\tR1, {}", label)?;
            if let Some(res_off) = res_off {
                writeln!(out, "\tSTR\t\tR1, R5, #{}", res_off)?;
            }
        }
        "loadAddr" => {
            let [arg] = args else {
                return Err(unsupported(instr));
            };
            let res_off = result.map(|r| fx.offset(r));
            load_value(out, arg, "R1", state, fx, pool)?;
            writeln!(out, "\tLDR\t\tR1, R1, #0")?;
            if let Some(res_off) = res_off {
                writeln!(out, "\tSTR\t\tR1, R5, #{}", res_off)?;
            }
        }
        "readLabelAddr" => {
            let [arg] = args else {
                return Err(unsupported(instr));
            };
            let res_off = result.map(|r| fx.offset(r));
            let label = require_label(instr, arg)?;
            writeln!(out, "\tLEA\t\tR1, {}", label)?;
            if let Some(res_off) = res_off {
                writeln!(out, "\tSTR\t\tR1, R5, #{}", res_off)?;
            }
        }
        "storeLabel" => {
            let [src, label] = args else {
                return Err(unsupported(instr));
            };
            let label = require_label(instr, label)?;
            load_value(out, src, "R1", state, fx, pool)?;
            writeln!(out, "\tST\t\tR1, {}", label)?;
        }
        "storeAddr" => {
            let [src, addr] = args else {
                return Err(unsupported(instr));
            };
            load_value(out, src, "R1", state, fx, pool)?;
            match addr {
                Value::Const(v) => {
                    let id = pool.intern_int(state, *v)?;
                    writeln!(out, "\tSTI\t\tR1, VALUE_{}", id)?;
                }
                Value::Temp(name) => {
                    writeln!(out, "\tLDR\t\tR2, R5, #{}", fx.offset(name))?;
                    writeln!(out, "\tSTR\t\tR1, R2, #0")?;
                }
                Value::Str(_) => return Err(unsupported(instr)),
            }
        }
        _ => return Err(unsupported(instr)),
    }
    Ok(())
}

/// The constant-string argument naming an LC-3 label, or the unsupported
/// diagnostic when the value has any other shape.
fn require_label<'a>(instr: &Instruction, value: &'a Value) -> Result<&'a str> {
    match value.as_const_str() {
        Some(label) if !label.is_empty() => Ok(label),
        _ => Err(unsupported(instr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CodegenOptions;
    use crate::ir::builder::{cstr, int, var};

    fn setup() -> (CodegenState, FunctionContext, ConstPool) {
        (
            CodegenState::new(CodegenOptions::default()),
            FunctionContext::new(),
            ConstPool::new(),
        )
    }

    fn call(result: Option<&str>, callee: &str, args: &[Value]) -> Instruction {
        Instruction::Call {
            result: result.map(|r| r.to_string()),
            callee: callee.to_string(),
            args: args.to_vec(),
        }
    }

    fn gen(instr: &Instruction) -> String {
        let (mut state, mut fx, mut pool) = setup();
        let mut out = String::new();
        generate_intrinsic_call(instr, &mut out, &mut state, &mut fx, &mut pool).unwrap();
        out
    }

    fn gen_err(instr: &Instruction) -> Lc3genError {
        let (mut state, mut fx, mut pool) = setup();
        let mut out = String::new();
        generate_intrinsic_call(instr, &mut out, &mut state, &mut fx, &mut pool).unwrap_err()
    }

    #[test]
    fn test_print_str_constant() {
        let asm = gen(&call(None, "printStr", &[cstr("Hi\n")]));
        assert_eq!(asm, "\tLEA\t\tR0, VALUE_1\n\tPUTS\n");
    }

    #[test]
    fn test_print_str_frame_value_takes_slot_address() {
        let asm = gen(&call(None, "printStr", &[var("buf")]));
        assert_eq!(asm, "\tADD\t\tR0, R5, #-1\n\tPUTS\n");
    }

    #[test]
    fn test_print_char_immediate() {
        let asm = gen(&call(None, "printChar", &[int(65)]));
        assert_eq!(asm, "\tLD\t\tR0, VALUE_1\n\tOUT\n");
    }

    #[test]
    fn test_print_char_addr() {
        let asm = gen(&call(None, "printCharAddr", &[int(0x5001)]));
        assert_eq!(
            asm,
            "\tLD\t\tR1, VALUE_1\n\tLDR\t\tR0, R1, #0\n\tOUT\n"
        );
    }

    #[test]
    fn test_integrate_asm_verbatim() {
        let asm = gen(&call(None, "integrateLC3Asm", &[cstr("\tHALT")]));
        assert_eq!(asm, "\tHALT\n");
    }

    #[test]
    fn test_integrate_asm_rejects_non_constant() {
        let err = gen_err(&call(None, "integrateLC3Asm", &[var("s")]));
        assert!(format!("{}", err).starts_with("Unsupported Instruction:"));
    }

    #[test]
    fn test_load_label() {
        let asm = gen(&call(Some("v"), "loadLabel", &[cstr("FONT_DATA")]));
        assert_eq!(asm, "\tLD\t\tR1, FONT_DATA\n\tSTR\t\tR1, R5, #-1\n");
    }

    #[test]
    fn test_load_addr_indirects() {
        let asm = gen(&call(Some("v"), "loadAddr", &[var("p")]));
        assert_eq!(
            asm,
            "\tLDR\t\tR1, R5, #-2\n\tLDR\t\tR1, R1, #0\n\tSTR\t\tR1, R5, #-1\n"
        );
    }

    #[test]
    fn test_read_label_addr() {
        let asm = gen(&call(Some("v"), "readLabelAddr", &[cstr("FONT_DATA")]));
        assert_eq!(asm, "\tLEA\t\tR1, FONT_DATA\n\tSTR\t\tR1, R5, #-1\n");
    }

    #[test]
    fn test_store_label() {
        let asm = gen(&call(None, "storeLabel", &[var("v"), cstr("COUNTER")]));
        assert_eq!(asm, "\tLDR\t\tR1, R5, #-1\n\tST\t\tR1, COUNTER\n");
    }

    #[test]
    fn test_store_addr_constant_goes_indirect() {
        let asm = gen(&call(None, "storeAddr", &[var("v"), int(0x5000)]));
        assert_eq!(asm, "\tLDR\t\tR1, R5, #-1\n\tSTI\t\tR1, VALUE_1\n");
    }

    #[test]
    fn test_store_addr_through_register() {
        let asm = gen(&call(None, "storeAddr", &[var("v"), var("p")]));
        assert_eq!(
            asm,
            "\tLDR\t\tR1, R5, #-1\n\tLDR\t\tR2, R5, #-2\n\tSTR\t\tR1, R2, #0\n"
        );
    }

    #[test]
    fn test_wrong_arity_is_unsupported() {
        let err = gen_err(&call(None, "printStr", &[]));
        assert!(format!("{}", err).contains("Unsupported Instruction"));
        let err = gen_err(&call(None, "storeLabel", &[var("v")]));
        assert!(format!("{}", err).contains("Unsupported Instruction"));
    }

    #[test]
    fn test_label_must_be_constant_string() {
        let err = gen_err(&call(Some("v"), "loadLabel", &[var("p")]));
        assert!(format!("{}", err).contains("Unsupported Instruction"));
        let err = gen_err(&call(Some("v"), "loadLabel", &[cstr("")]));
        assert!(format!("{}", err).contains("Unsupported Instruction"));
    }
}
