//! Operand materialization helpers.
//!
//! LC-3 has no general immediate loads: constants outside the 5-bit `ADD`
//! immediate live in the block's constant pool and reach registers through
//! PC-relative `LD`. These helpers are the single place that maps an IR
//! value onto the instruction that brings it into a register.

use std::fmt::Write;

use super::state::{CodegenState, ConstPool, FunctionContext};
use crate::error::Result;
use crate::ir::Value;

/// Emit `mnemonic target` with the tab alignment the rest of the unit uses:
/// two tabs after mnemonics of up to three characters, one after longer
/// ones.
pub fn emit_branch(out: &mut String, mnemonic: &str, target: &str) -> Result<()> {
    if mnemonic.len() <= 3 {
        writeln!(out, "\t{}\t\t{}", mnemonic, target)?;
    } else {
        writeln!(out, "\t{}\t{}", mnemonic, target)?;
    }
    Ok(())
}

pub fn emit_label(out: &mut String, label: &str) -> Result<()> {
    writeln!(out, "{}", label)?;
    Ok(())
}

/// Two's-complement negation of `reg` in place.
pub fn emit_negate(out: &mut String, reg: &str) -> Result<()> {
    writeln!(out, "\tNOT\t\t{}, {}", reg, reg)?;
    writeln!(out, "\tADD\t\t{}, {}, #1", reg, reg)?;
    Ok(())
}

/// Materialize `value` into `reg`: constants load from the block pool,
/// temporaries from their frame slot, strings as a pool address via `LEA`.
pub fn load_value(
    out: &mut String,
    value: &Value,
    reg: &str,
    state: &mut CodegenState,
    fx: &mut FunctionContext,
    pool: &mut ConstPool,
) -> Result<()> {
    match value {
        Value::Const(v) => {
            let id = pool.intern_int(state, *v)?;
            writeln!(out, "\tLD\t\t{}, VALUE_{}", reg, id)?;
        }
        Value::Temp(name) => {
            writeln!(out, "\tLDR\t\t{}, R5, #{}", reg, fx.offset(name))?;
        }
        Value::Str(s) => {
            let id = pool.intern_str(state, s)?;
            writeln!(out, "\tLEA\t\t{}, VALUE_{}", reg, id)?;
        }
    }
    Ok(())
}

/// Materialize `-value` into `reg`. A constant draws a pre-negated pool
/// entry, saving the two-op in-register negation.
pub fn load_negated(
    out: &mut String,
    value: &Value,
    reg: &str,
    state: &mut CodegenState,
    fx: &mut FunctionContext,
    pool: &mut ConstPool,
) -> Result<()> {
    if let Some(v) = value.as_const_int() {
        let id = pool.intern_int(state, v.wrapping_neg())?;
        writeln!(out, "\tLD\t\t{}, VALUE_{}", reg, id)?;
    } else {
        load_value(out, value, reg, state, fx, pool)?;
        emit_negate(out, reg)?;
    }
    Ok(())
}

/// Escape a string for a `.STRINGZ` directive.
pub fn escape_stringz(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }
    }
    escaped
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

    #[test]
    fn test_load_constant_goes_through_pool() {
        let (mut state, mut fx, mut pool) = setup();
        let mut out = String::new();
        load_value(&mut out, &int(40), "R1", &mut state, &mut fx, &mut pool).unwrap();
        assert_eq!(out, "\tLD\t\tR1, VALUE_1\n");
        assert!(pool.text().contains("\t.FILL\t#40\n"));
    }

    #[test]
    fn test_load_temp_reads_frame_slot() {
        let (mut state, mut fx, mut pool) = setup();
        let mut out = String::new();
        load_value(&mut out, &var("x"), "R2", &mut state, &mut fx, &mut pool).unwrap();
        assert_eq!(out, "\tLDR\t\tR2, R5, #-1\n");
    }

    #[test]
    fn test_load_string_takes_address() {
        let (mut state, mut fx, mut pool) = setup();
        let mut out = String::new();
        load_value(&mut out, &cstr("Hi\n"), "R0", &mut state, &mut fx, &mut pool).unwrap();
        assert_eq!(out, "\tLEA\t\tR0, VALUE_1\n");
        assert!(pool.text().contains("\t.STRINGZ\t\"Hi\\n\"\n"));
    }

    #[test]
    fn test_load_negated_constant_is_pre_negated() {
        let (mut state, mut fx, mut pool) = setup();
        let mut out = String::new();
        load_negated(&mut out, &int(5), "R2", &mut state, &mut fx, &mut pool).unwrap();
        assert_eq!(out, "\tLD\t\tR2, VALUE_1\n");
        assert!(pool.text().contains("\t.FILL\t#-5\n"));
    }

    #[test]
    fn test_load_negated_temp_negates_in_register() {
        let (mut state, mut fx, mut pool) = setup();
        let mut out = String::new();
        load_negated(&mut out, &var("y"), "R2", &mut state, &mut fx, &mut pool).unwrap();
        assert_eq!(
            out,
            "\tLDR\t\tR2, R5, #-1\n\tNOT\t\tR2, R2\n\tADD\t\tR2, R2, #1\n"
        );
    }

    #[test]
    fn test_branch_alignment() {
        let mut out = String::new();
        emit_branch(&mut out, "BR", "LOOP_1").unwrap();
        emit_branch(&mut out, "BRnp", "LOOP_1").unwrap();
        assert_eq!(out, "\tBR\t\tLOOP_1\n\tBRnp\tLOOP_1\n");
    }

    #[test]
    fn test_escape_stringz() {
        assert_eq!(escape_stringz("a\"b\\c\n\t\r"), "a\\\"b\\\\c\\n\\t\\r");
        assert_eq!(escape_stringz("plain"), "plain");
    }
}
