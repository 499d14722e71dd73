//! Fluent construction API for IR modules.
//!
//! The builder keeps a current function and a current block; instruction
//! methods append to the current block and return `&mut Self` so programs
//! read top to bottom:
//!
//! ```rust
//! use lc3gen::ir::{IrBuilder, BinaryOp};
//! use lc3gen::ir::builder::{int, var};
//!
//! let mut b = IrBuilder::new("demo.c");
//! b.function("main", &[])
//!     .binary(BinaryOp::Add, "sum", int(3), int(4))
//!     .ret(var("sum"));
//! let module = b.build();
//! assert_eq!(module.functions.len(), 1);
//! ```
//!
//! Misuse (emitting an instruction before opening a function) is a
//! programming error and panics.

use super::function::{BasicBlock, Function};
use super::instruction::{BinaryOp, CastKind, IcmpPred, Instruction, Value};
use super::module::Module;

/// Shorthand for a temporary reference.
pub fn var(name: impl Into<String>) -> Value {
    Value::Temp(name.into())
}

/// Shorthand for a constant integer.
pub fn int(value: i32) -> Value {
    Value::Const(value)
}

/// Shorthand for a constant string.
pub fn cstr(s: impl Into<String>) -> Value {
    Value::Str(s.into())
}

/// Builds a [`Module`] function by function, block by block.
pub struct IrBuilder {
    module: Module,
}

impl IrBuilder {
    pub fn new(source_file_name: impl Into<String>) -> Self {
        IrBuilder {
            module: Module::new(source_file_name),
        }
    }

    /// Start a function definition with an implicit `entry` block.
    pub fn function(&mut self, name: &str, params: &[&str]) -> &mut Self {
        let mut func = Function::new(name);
        func.params = params.iter().map(|p| p.to_string()).collect();
        func.blocks.push(BasicBlock::new("entry"));
        self.module.add_function(func);
        self
    }

    /// Add a function declaration (no body).
    pub fn declaration(&mut self, name: &str, params: &[&str]) -> &mut Self {
        let mut func = Function::new(name);
        func.params = params.iter().map(|p| p.to_string()).collect();
        self.module.add_function(func);
        self
    }

    /// Open a new basic block in the current function.
    pub fn block(&mut self, name: &str) -> &mut Self {
        let func = self.current_function();
        func.blocks.push(BasicBlock::new(name));
        self
    }

    pub fn binary(&mut self, op: BinaryOp, result: &str, lhs: Value, rhs: Value) -> &mut Self {
        self.push(Instruction::Binary {
            op,
            disjoint: false,
            result: result.to_string(),
            lhs,
            rhs,
        })
    }

    /// An `or` whose operands are known to have no overlapping bits.
    pub fn or_disjoint(&mut self, result: &str, lhs: Value, rhs: Value) -> &mut Self {
        self.push(Instruction::Binary {
            op: BinaryOp::Or,
            disjoint: true,
            result: result.to_string(),
            lhs,
            rhs,
        })
    }

    pub fn icmp(&mut self, pred: IcmpPred, result: &str, lhs: Value, rhs: Value) -> &mut Self {
        self.push(Instruction::Icmp {
            pred,
            result: result.to_string(),
            lhs,
            rhs,
        })
    }

    pub fn select(&mut self, result: &str, cond: Value, if_true: Value, if_false: Value) -> &mut Self {
        self.push(Instruction::Select {
            result: result.to_string(),
            cond,
            if_true,
            if_false,
        })
    }

    pub fn cast(&mut self, kind: CastKind, result: &str, value: Value) -> &mut Self {
        self.push(Instruction::Cast {
            kind,
            result: result.to_string(),
            value,
        })
    }

    pub fn alloca(&mut self, result: &str) -> &mut Self {
        self.push(Instruction::Alloca {
            result: result.to_string(),
        })
    }

    pub fn load(&mut self, result: &str, ptr: Value) -> &mut Self {
        self.push(Instruction::Load {
            result: result.to_string(),
            ptr,
        })
    }

    pub fn store(&mut self, value: Value, ptr: Value) -> &mut Self {
        self.push(Instruction::Store { value, ptr })
    }

    pub fn br(&mut self, target: &str) -> &mut Self {
        self.push(Instruction::Br {
            target: target.to_string(),
        })
    }

    pub fn cond_br(&mut self, cond: Value, if_true: &str, if_false: &str) -> &mut Self {
        self.push(Instruction::CondBr {
            cond,
            if_true: if_true.to_string(),
            if_false: if_false.to_string(),
        })
    }

    pub fn switch(&mut self, cond: Value, default: &str, cases: &[(i32, &str)]) -> &mut Self {
        self.push(Instruction::Switch {
            cond,
            default: default.to_string(),
            cases: cases
                .iter()
                .map(|(v, target)| (*v, target.to_string()))
                .collect(),
        })
    }

    pub fn phi(&mut self, result: &str, incomings: &[(&str, Value)]) -> &mut Self {
        self.push(Instruction::Phi {
            result: result.to_string(),
            incomings: incomings
                .iter()
                .map(|(pred, value)| (pred.to_string(), value.clone()))
                .collect(),
        })
    }

    pub fn call(&mut self, result: &str, callee: &str, args: &[Value]) -> &mut Self {
        self.push(Instruction::Call {
            result: Some(result.to_string()),
            callee: callee.to_string(),
            args: args.to_vec(),
        })
    }

    pub fn call_void(&mut self, callee: &str, args: &[Value]) -> &mut Self {
        self.push(Instruction::Call {
            result: None,
            callee: callee.to_string(),
            args: args.to_vec(),
        })
    }

    pub fn ret(&mut self, value: Value) -> &mut Self {
        self.push(Instruction::Ret { value: Some(value) })
    }

    pub fn ret_void(&mut self) -> &mut Self {
        self.push(Instruction::Ret { value: None })
    }

    pub fn build(self) -> Module {
        self.module
    }

    fn current_function(&mut self) -> &mut Function {
        match self.module.functions.last_mut() {
            Some(func) => func,
            None => panic!("IrBuilder: no function started"),
        }
    }

    fn push(&mut self, instr: Instruction) -> &mut Self {
        let func = self.current_function();
        match func.blocks.last_mut() {
            Some(block) => block.instructions.push(instr),
            None => panic!("IrBuilder: current function is a declaration"),
        }
        self
    }
}
