use std::fmt;

use super::instruction::Instruction;
use super::{Identifier, Label};

/// A basic block: a label and the instructions it holds.
///
/// The last instruction must be a terminator (`br`, conditional `br`,
/// `switch`, or `ret`).
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub name: Label,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(name: impl Into<Label>) -> Self {
        BasicBlock {
            name: name.into(),
            instructions: Vec::new(),
        }
    }
}

/// A function definition or declaration.
///
/// Blocks are kept in layout order; the first block is the entry and has no
/// predecessors. A function with no blocks is a declaration. At most five
/// scalar parameters are supported by the calling convention.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Identifier,
    pub params: Vec<Identifier>,
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn new(name: impl Into<Identifier>) -> Self {
        Function {
            name: name.into(),
            params: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn entry_block(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }
}

// --- Display Implementations ---

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        for instr in &self.instructions {
            writeln!(f, "  {}", instr)?;
        }
        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|p| format!("%{}", p))
            .collect::<Vec<_>>()
            .join(", ");
        if self.is_declaration() {
            return writeln!(f, "declare @{}({})", self.name, params);
        }
        writeln!(f, "define @{}({}) {{", self.name, params)?;
        for block in &self.blocks {
            write!(f, "{}", block)?;
        }
        writeln!(f, "}}")
    }
}
