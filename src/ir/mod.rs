//! # Intermediate Representation
//!
//! A small typed SSA IR in the shape the LC-3 lowering consumes: a module of
//! functions, each an ordered list of basic blocks holding instructions over
//! virtual values. The IR is constructed in memory, either directly through
//! the structs in this module or fluently through [`builder::IrBuilder`];
//! there is no textual front end.
//!
//! ## Values
//!
//! A [`Value`] is one of:
//! - a **temporary** (`%name`), the result of an instruction or an incoming
//!   function argument,
//! - a **constant integer**, viewed as a signed 32-bit value (the target is
//!   16-bit throughout, the assembler owns the final truncation),
//! - a **constant string**, the initializer of a read-only character array.
//!
//! Identity is structural equality, which is all the lowering relies on: the
//! same constant referenced twice in a block shares one pool entry, and an
//! SSA temporary names exactly one frame slot.
//!
//! ## Blocks and control flow
//!
//! The first block of a function is its entry and has no predecessors.
//! Every block ends in a terminator (`br`, conditional `br`, `switch`, or
//! `ret`). Phi nodes select among predecessor blocks by label.

pub mod builder;
pub mod function;
pub mod instruction;
pub mod module;

pub use builder::{cstr, int, var, IrBuilder};
pub use function::{BasicBlock, Function};
pub use instruction::{BinaryOp, CastKind, IcmpPred, Instruction, Value};
pub use module::Module;

/// Names of SSA temporaries, functions, and intrinsics.
///
/// Owned strings rather than borrowed slices: the canonicalizer mints fresh
/// names while rewriting, so identifiers cannot all borrow from a caller.
pub type Identifier = String;

/// Basic block labels, unique within their function.
pub type Label = String;
