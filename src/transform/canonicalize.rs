//! The IR canonicalizer.
//!
//! Three passes run over every function, in order:
//!
//! 1. **Intrinsic lowering.** `smin`/`smax`/`umin`/`umax` calls become
//!    `icmp` + `select`; `lifetime_start`/`lifetime_end` markers are deleted.
//! 2. **Compare and sub canonicalization.** Compares with the constant on
//!    the left swap their operands (mirroring the predicate); `sub x, k`
//!    becomes `add x, -k`.
//! 3. **Branch and shift rewrites.** `br (icmp eq/ne x, k)` becomes a
//!    one-case `switch`, dropping the compare when the branch was its only
//!    use; `trunc` becomes `bitcast` (the target is 16-bit throughout);
//!    `lshr x, k` with a small constant becomes `udiv x, 1<<k`; `or` marked
//!    disjoint becomes `add`.
//!
//! Every rewrite keeps the rewritten instruction's result name, so no use
//! lists need patching, and running the canonicalizer twice yields the same
//! IR as running it once.

use crate::ir::{
    BinaryOp, CastKind, Function, IcmpPred, Instruction, Label, Module, Value,
};

/// Canonicalization pass over modules or single functions.
#[derive(Default)]
pub struct Canonicalize;

impl Canonicalize {
    /// Apply the pass to every function definition. Returns true if any
    /// change was made.
    pub fn run_on_module(&self, module: &mut Module) -> bool {
        let mut changed = false;
        for func in &mut module.functions {
            if self.run_on_function(func) {
                changed = true;
            }
        }
        changed
    }

    pub fn run_on_function(&self, func: &mut Function) -> bool {
        let mut changed = lower_intrinsic_calls(func);
        for block in &mut func.blocks {
            if canonicalize_compares(&mut block.instructions) {
                changed = true;
            }
        }
        if rewrite_branches_and_shifts(func) {
            changed = true;
        }
        changed
    }
}

/// Min/max intrinsics recognized by pass 1, with the compare predicate each
/// lowers through.
fn minmax_predicate(callee: &str) -> Option<IcmpPred> {
    match callee {
        "smin" => Some(IcmpPred::Slt),
        "smax" => Some(IcmpPred::Sgt),
        "umin" => Some(IcmpPred::Ult),
        "umax" => Some(IcmpPred::Ugt),
        _ => None,
    }
}

enum IntrinsicRewrite {
    Drop,
    MinMax(IcmpPred, String, Value, Value),
    Keep,
}

fn match_intrinsic_call(instr: &Instruction) -> IntrinsicRewrite {
    match instr {
        Instruction::Call { callee, .. }
            if callee == "lifetime_start" || callee == "lifetime_end" =>
        {
            IntrinsicRewrite::Drop
        }
        Instruction::Call {
            result: Some(result),
            callee,
            args,
        } if args.len() == 2 => match minmax_predicate(callee) {
            Some(pred) => {
                IntrinsicRewrite::MinMax(pred, result.clone(), args[0].clone(), args[1].clone())
            }
            None => IntrinsicRewrite::Keep,
        },
        _ => IntrinsicRewrite::Keep,
    }
}

fn lower_intrinsic_calls(func: &mut Function) -> bool {
    let mut changed = false;
    for block in &mut func.blocks {
        let mut i = 0;
        while i < block.instructions.len() {
            match match_intrinsic_call(&block.instructions[i]) {
                IntrinsicRewrite::Drop => {
                    block.instructions.remove(i);
                    changed = true;
                }
                IntrinsicRewrite::MinMax(pred, result, lhs, rhs) => {
                    let cmp = format!("{}.cmp", result);
                    block.instructions[i] = Instruction::Icmp {
                        pred,
                        result: cmp.clone(),
                        lhs: lhs.clone(),
                        rhs: rhs.clone(),
                    };
                    block.instructions.insert(
                        i + 1,
                        Instruction::Select {
                            result,
                            cond: Value::Temp(cmp),
                            if_true: lhs,
                            if_false: rhs,
                        },
                    );
                    i += 2;
                    changed = true;
                }
                IntrinsicRewrite::Keep => i += 1,
            }
        }
    }
    changed
}

fn canonicalize_compares(instructions: &mut [Instruction]) -> bool {
    let mut changed = false;
    for instr in instructions.iter_mut() {
        match instr {
            Instruction::Icmp { pred, lhs, rhs, .. }
                if lhs.as_const_int().is_some() && rhs.as_const_int().is_none() =>
            {
                std::mem::swap(lhs, rhs);
                *pred = pred.swapped();
                changed = true;
            }
            Instruction::Binary {
                op: op @ BinaryOp::Sub,
                rhs,
                ..
            } => {
                if let Some(k) = rhs.as_const_int() {
                    *op = BinaryOp::Add;
                    *rhs = Value::Const(k.wrapping_neg());
                    changed = true;
                }
            }
            _ => {}
        }
    }
    changed
}

fn rewrite_branches_and_shifts(func: &mut Function) -> bool {
    let mut changed = false;

    for block in &mut func.blocks {
        for instr in &mut block.instructions {
            match instr {
                Instruction::Cast { kind, .. } if *kind == CastKind::Trunc => {
                    *kind = CastKind::Bitcast;
                    changed = true;
                }
                Instruction::Binary {
                    op: op @ BinaryOp::LShr,
                    rhs,
                    ..
                } => {
                    // 1 << 15 does not fit a signed 16-bit pool word, so
                    // larger shift counts keep the generic loop.
                    if let Some(k) = rhs.as_const_int() {
                        if (0..=14).contains(&k) {
                            *op = BinaryOp::UDiv;
                            *rhs = Value::Const(1 << k);
                            changed = true;
                        }
                    }
                }
                Instruction::Binary { op, disjoint, .. }
                    if *op == BinaryOp::Or && *disjoint =>
                {
                    *op = BinaryOp::Add;
                    *disjoint = false;
                    changed = true;
                }
                _ => {}
            }
        }
    }

    for bi in 0..func.blocks.len() {
        let (cond, if_true, if_false) = match func.blocks[bi].instructions.last() {
            Some(Instruction::CondBr {
                cond: Value::Temp(cond),
                if_true,
                if_false,
            }) => (cond.clone(), if_true.clone(), if_false.clone()),
            _ => continue,
        };
        let compare = match find_equality_compare(func, &cond) {
            Some(compare) => compare,
            None => continue,
        };
        let (pred, scrutinee, case_value) = compare;
        let (case_target, default): (Label, Label) = if pred == IcmpPred::Eq {
            (if_true, if_false)
        } else {
            (if_false, if_true)
        };
        let last = func.blocks[bi].instructions.len() - 1;
        func.blocks[bi].instructions[last] = Instruction::Switch {
            cond: scrutinee,
            default,
            cases: vec![(case_value, case_target)],
        };
        changed = true;
        if count_uses(func, &cond) == 0 {
            remove_compare(func, &cond);
        }
    }

    changed
}

/// Find the `icmp eq/ne x, k` (constant k) defining `name`, if any.
fn find_equality_compare(func: &Function, name: &str) -> Option<(IcmpPred, Value, i32)> {
    for block in &func.blocks {
        for instr in &block.instructions {
            if let Instruction::Icmp {
                pred,
                result,
                lhs,
                rhs,
            } = instr
            {
                if result == name && matches!(pred, IcmpPred::Eq | IcmpPred::Ne) {
                    if let Some(k) = rhs.as_const_int() {
                        return Some((*pred, lhs.clone(), k));
                    }
                }
            }
        }
    }
    None
}

fn count_uses(func: &Function, name: &str) -> usize {
    func.blocks
        .iter()
        .flat_map(|block| block.instructions.iter())
        .flat_map(|instr| instr.operand_values())
        .filter(|value| matches!(value, Value::Temp(n) if n == name))
        .count()
}

fn remove_compare(func: &mut Function, name: &str) {
    for block in &mut func.blocks {
        if let Some(pos) = block.instructions.iter().position(|instr| {
            matches!(instr, Instruction::Icmp { result, .. } if result == name)
        }) {
            block.instructions.remove(pos);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::{cstr, int, var, IrBuilder};

    fn canonicalized(module: &mut Module) -> bool {
        Canonicalize.run_on_module(module)
    }

    #[test]
    fn test_swap_constant_on_left() {
        let mut b = IrBuilder::new("t.c");
        b.function("f", &["x"])
            .icmp(IcmpPred::Sgt, "c", int(3), var("x"))
            .ret(var("c"));
        let mut module = b.build();
        assert!(canonicalized(&mut module));

        let instr = &module.functions[0].blocks[0].instructions[0];
        assert_eq!(format!("{}", instr), "%c = icmp slt %x, 3");
    }

    #[test]
    fn test_sub_constant_becomes_add() {
        let mut b = IrBuilder::new("t.c");
        b.function("f", &["x"])
            .binary(BinaryOp::Sub, "d", var("x"), int(5))
            .ret(var("d"));
        let mut module = b.build();
        assert!(canonicalized(&mut module));

        let instr = &module.functions[0].blocks[0].instructions[0];
        assert_eq!(format!("{}", instr), "%d = add %x, -5");
    }

    #[test]
    fn test_minmax_lowering_keeps_result_name() {
        let mut b = IrBuilder::new("t.c");
        b.function("f", &["a", "b"])
            .call("m", "smin", &[var("a"), var("b")])
            .ret(var("m"));
        let mut module = b.build();
        assert!(canonicalized(&mut module));

        let instrs = &module.functions[0].blocks[0].instructions;
        assert_eq!(format!("{}", instrs[0]), "%m.cmp = icmp slt %a, %b");
        assert_eq!(format!("{}", instrs[1]), "%m = select %m.cmp, %a, %b");
    }

    #[test]
    fn test_lifetime_markers_dropped() {
        let mut b = IrBuilder::new("t.c");
        b.function("f", &[])
            .alloca("p")
            .call_void("lifetime_start", &[var("p")])
            .store(int(1), var("p"))
            .call_void("lifetime_end", &[var("p")])
            .ret_void();
        let mut module = b.build();
        assert!(canonicalized(&mut module));

        let instrs = &module.functions[0].blocks[0].instructions;
        assert_eq!(instrs.len(), 3);
        assert!(!instrs
            .iter()
            .any(|i| matches!(i, Instruction::Call { .. })));
    }

    #[test]
    fn test_equality_branch_becomes_switch() {
        let mut b = IrBuilder::new("t.c");
        b.function("f", &["x"])
            .icmp(IcmpPred::Eq, "z", var("x"), int(0))
            .cond_br(var("z"), "zero", "other")
            .block("zero")
            .ret(int(1))
            .block("other")
            .ret(int(0));
        let mut module = b.build();
        assert!(canonicalized(&mut module));

        let entry = &module.functions[0].blocks[0].instructions;
        assert_eq!(entry.len(), 1, "dead compare should be dropped");
        assert_eq!(
            format!("{}", entry[0]),
            "switch %x, label %other [ 0, label %zero ]"
        );
    }

    #[test]
    fn test_inequality_branch_swaps_targets() {
        let mut b = IrBuilder::new("t.c");
        b.function("f", &["x"])
            .icmp(IcmpPred::Ne, "nz", var("x"), int(7))
            .cond_br(var("nz"), "other", "seven")
            .block("seven")
            .ret(int(1))
            .block("other")
            .ret(int(0));
        let mut module = b.build();
        assert!(canonicalized(&mut module));

        let entry = &module.functions[0].blocks[0].instructions;
        assert_eq!(
            format!("{}", entry[0]),
            "switch %x, label %other [ 7, label %seven ]"
        );
    }

    #[test]
    fn test_live_compare_survives_switch_rewrite() {
        let mut b = IrBuilder::new("t.c");
        b.function("f", &["x"])
            .icmp(IcmpPred::Eq, "z", var("x"), int(0))
            .cond_br(var("z"), "zero", "other")
            .block("zero")
            .ret(var("z"))
            .block("other")
            .ret(int(0));
        let mut module = b.build();
        assert!(canonicalized(&mut module));

        let entry = &module.functions[0].blocks[0].instructions;
        assert_eq!(entry.len(), 2);
        assert!(matches!(entry[0], Instruction::Icmp { .. }));
        assert!(matches!(entry[1], Instruction::Switch { .. }));
    }

    #[test]
    fn test_shift_and_or_rewrites() {
        let mut b = IrBuilder::new("t.c");
        b.function("f", &["x", "y"])
            .cast(CastKind::Trunc, "t", var("x"))
            .binary(BinaryOp::LShr, "h", var("x"), int(3))
            .or_disjoint("o", var("x"), var("y"))
            .ret(var("o"));
        let mut module = b.build();
        assert!(canonicalized(&mut module));

        let instrs = &module.functions[0].blocks[0].instructions;
        assert_eq!(format!("{}", instrs[0]), "%t = bitcast %x");
        assert_eq!(format!("{}", instrs[1]), "%h = udiv %x, 8");
        assert_eq!(format!("{}", instrs[2]), "%o = add %x, %y");
    }

    #[test]
    fn test_large_shift_count_kept() {
        let mut b = IrBuilder::new("t.c");
        b.function("f", &["x"])
            .binary(BinaryOp::LShr, "h", var("x"), int(15))
            .ret(var("h"));
        let mut module = b.build();
        canonicalized(&mut module);

        let instr = &module.functions[0].blocks[0].instructions[0];
        assert_eq!(format!("{}", instr), "%h = lshr %x, 15");
    }

    #[test]
    fn test_idempotence() {
        let mut b = IrBuilder::new("t.c");
        b.declaration("printStr", &["s"]);
        b.function("main", &["x", "y"])
            .call("m", "umax", &[var("x"), var("y")])
            .binary(BinaryOp::Sub, "d", var("m"), int(9))
            .icmp(IcmpPred::Slt, "c", int(2), var("d"))
            .binary(BinaryOp::LShr, "h", var("d"), int(2))
            .icmp(IcmpPred::Eq, "z", var("h"), int(0))
            .cond_br(var("z"), "zero", "other")
            .block("zero")
            .call_void("printStr", &[cstr("zero\n")])
            .ret(var("c"))
            .block("other")
            .ret(int(0));
        let mut module = b.build();

        assert!(canonicalized(&mut module));
        let once = module.clone();
        assert!(!canonicalized(&mut module), "second run must be a no-op");
        assert_eq!(module, once);
    }
}
