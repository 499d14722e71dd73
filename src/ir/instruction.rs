//! Instruction and value definitions for the IR.
//!
//! The instruction set is deliberately small: binary arithmetic and logic,
//! integer compares, `select`, casts, stack slots with `load`/`store`,
//! branches, `switch`, phi nodes, calls, and `ret`. A few opcodes exist only
//! so that the code generator can name them in its "unsupported" diagnostic
//! (the floating-point arithmetic group, `xor`, `ashr`).

use std::fmt;

use super::{Identifier, Label};

/// An IR value reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// SSA temporary: an instruction result or a function argument.
    Temp(Identifier),
    /// Constant integer, signed 32-bit view.
    Const(i32),
    /// Constant string data (a read-only character array initializer).
    Str(String),
}

impl Value {
    /// The constant-int view of this value, if it has one.
    pub fn as_const_int(&self) -> Option<i32> {
        match self {
            Value::Const(v) => Some(*v),
            _ => None,
        }
    }

    /// The constant-string view of this value, with trailing NULs trimmed.
    pub fn as_const_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.trim_end_matches('\0')),
            _ => None,
        }
    }
}

/// Binary opcodes.
///
/// Only `Add`, `Sub`, `Mul`, `UDiv`, `URem`, `And`, `Or`, `Shl`, and `LShr`
/// can be lowered; the remaining opcodes are representable so that modules
/// containing them fail with a diagnostic naming the offending instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    UDiv,
    URem,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
    FAdd,
    FSub,
    FMul,
    FDiv,
}

impl BinaryOp {
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::UDiv => "udiv",
            BinaryOp::URem => "urem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Shl => "shl",
            BinaryOp::LShr => "lshr",
            BinaryOp::AShr => "ashr",
            BinaryOp::FAdd => "fadd",
            BinaryOp::FSub => "fsub",
            BinaryOp::FMul => "fmul",
            BinaryOp::FDiv => "fdiv",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Integer compare predicates.
///
/// The lowering maps signed and unsigned variants onto the same LC-3
/// condition-code test, because the CC reflects the signed sign of the ALU
/// result. Unsigned compares whose operands straddle the sign boundary are
/// therefore mis-ordered; this is a known limitation of the modeled
/// implementation and is kept rather than silently fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpPred {
    Eq,
    Ne,
    Sgt,
    Sge,
    Slt,
    Sle,
    Ugt,
    Uge,
    Ult,
    Ule,
}

impl IcmpPred {
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            IcmpPred::Eq => "eq",
            IcmpPred::Ne => "ne",
            IcmpPred::Sgt => "sgt",
            IcmpPred::Sge => "sge",
            IcmpPred::Slt => "slt",
            IcmpPred::Sle => "sle",
            IcmpPred::Ugt => "ugt",
            IcmpPred::Uge => "uge",
            IcmpPred::Ult => "ult",
            IcmpPred::Ule => "ule",
        }
    }

    /// The predicate that holds after the operands are swapped.
    pub const fn swapped(&self) -> IcmpPred {
        match self {
            IcmpPred::Eq => IcmpPred::Eq,
            IcmpPred::Ne => IcmpPred::Ne,
            IcmpPred::Sgt => IcmpPred::Slt,
            IcmpPred::Sge => IcmpPred::Sle,
            IcmpPred::Slt => IcmpPred::Sgt,
            IcmpPred::Sle => IcmpPred::Sge,
            IcmpPred::Ugt => IcmpPred::Ult,
            IcmpPred::Uge => IcmpPred::Ule,
            IcmpPred::Ult => IcmpPred::Ugt,
            IcmpPred::Ule => IcmpPred::Uge,
        }
    }
}

impl fmt::Display for IcmpPred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Cast kinds. All are width-preserving on a 16-bit target; `trunc` is
/// canonicalized to `bitcast` before lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    Zext,
    Sext,
    Trunc,
    Bitcast,
}

impl CastKind {
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            CastKind::Zext => "zext",
            CastKind::Sext => "sext",
            CastKind::Trunc => "trunc",
            CastKind::Bitcast => "bitcast",
        }
    }
}

impl fmt::Display for CastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// A single instruction in a basic block.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Binary {
        op: BinaryOp,
        /// Set on `or` when the operands have no overlapping bits.
        disjoint: bool,
        result: Identifier,
        lhs: Value,
        rhs: Value,
    },
    Icmp {
        pred: IcmpPred,
        result: Identifier,
        lhs: Value,
        rhs: Value,
    },
    Select {
        result: Identifier,
        cond: Value,
        if_true: Value,
        if_false: Value,
    },
    Cast {
        kind: CastKind,
        result: Identifier,
        value: Value,
    },
    /// Reserves one 16-bit stack word. The result temporary names the slot;
    /// `load`/`store` through it address the word directly.
    Alloca {
        result: Identifier,
    },
    Load {
        result: Identifier,
        ptr: Value,
    },
    Store {
        value: Value,
        ptr: Value,
    },
    Br {
        target: Label,
    },
    CondBr {
        cond: Value,
        if_true: Label,
        if_false: Label,
    },
    Switch {
        cond: Value,
        default: Label,
        cases: Vec<(i32, Label)>,
    },
    Phi {
        result: Identifier,
        incomings: Vec<(Label, Value)>,
    },
    Call {
        result: Option<Identifier>,
        callee: Identifier,
        args: Vec<Value>,
    },
    Ret {
        value: Option<Value>,
    },
}

impl Instruction {
    /// Name of the SSA temporary this instruction defines, if any.
    pub fn result(&self) -> Option<&str> {
        match self {
            Instruction::Binary { result, .. }
            | Instruction::Icmp { result, .. }
            | Instruction::Select { result, .. }
            | Instruction::Cast { result, .. }
            | Instruction::Alloca { result }
            | Instruction::Load { result, .. }
            | Instruction::Phi { result, .. } => Some(result.as_str()),
            Instruction::Call { result, .. } => result.as_deref(),
            _ => None,
        }
    }

    /// All value operands, in operand order. Labels are not included.
    pub fn operand_values(&self) -> Vec<&Value> {
        match self {
            Instruction::Binary { lhs, rhs, .. } | Instruction::Icmp { lhs, rhs, .. } => {
                vec![lhs, rhs]
            }
            Instruction::Select {
                cond,
                if_true,
                if_false,
                ..
            } => vec![cond, if_true, if_false],
            Instruction::Cast { value, .. } => vec![value],
            Instruction::Alloca { .. } | Instruction::Br { .. } => vec![],
            Instruction::Load { ptr, .. } => vec![ptr],
            Instruction::Store { value, ptr } => vec![value, ptr],
            Instruction::CondBr { cond, .. } | Instruction::Switch { cond, .. } => vec![cond],
            Instruction::Phi { incomings, .. } => incomings.iter().map(|(_, v)| v).collect(),
            Instruction::Call { args, .. } => args.iter().collect(),
            Instruction::Ret { value } => value.iter().collect(),
        }
    }
}

// --- Display Implementations ---

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Temp(name) => write!(f, "%{}", name),
            Value::Const(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "\"{}\"", s.escape_debug()),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Binary {
                op,
                disjoint,
                result,
                lhs,
                rhs,
            } => {
                let flag = if *disjoint { " disjoint" } else { "" };
                write!(f, "%{} = {}{} {}, {}", result, op, flag, lhs, rhs)
            }
            Instruction::Icmp {
                pred,
                result,
                lhs,
                rhs,
            } => write!(f, "%{} = icmp {} {}, {}", result, pred, lhs, rhs),
            Instruction::Select {
                result,
                cond,
                if_true,
                if_false,
            } => write!(f, "%{} = select {}, {}, {}", result, cond, if_true, if_false),
            Instruction::Cast {
                kind,
                result,
                value,
            } => write!(f, "%{} = {} {}", result, kind, value),
            Instruction::Alloca { result } => write!(f, "%{} = alloca", result),
            Instruction::Load { result, ptr } => write!(f, "%{} = load {}", result, ptr),
            Instruction::Store { value, ptr } => write!(f, "store {}, {}", value, ptr),
            Instruction::Br { target } => write!(f, "br label %{}", target),
            Instruction::CondBr {
                cond,
                if_true,
                if_false,
            } => write!(f, "br {}, label %{}, label %{}", cond, if_true, if_false),
            Instruction::Switch {
                cond,
                default,
                cases,
            } => {
                write!(f, "switch {}, label %{} [", cond, default)?;
                for (value, target) in cases {
                    write!(f, " {}, label %{}", value, target)?;
                }
                write!(f, " ]")
            }
            Instruction::Phi { result, incomings } => {
                write!(f, "%{} = phi ", result)?;
                for (i, (pred, value)) in incomings.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "[ {}, %{} ]", value, pred)?;
                }
                Ok(())
            }
            Instruction::Call {
                result,
                callee,
                args,
            } => {
                if let Some(result) = result {
                    write!(f, "%{} = ", result)?;
                }
                write!(f, "call @{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Instruction::Ret { value } => match value {
                Some(value) => write!(f, "ret {}", value),
                None => write!(f, "ret void"),
            },
        }
    }
}
