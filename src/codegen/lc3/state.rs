//! Naming and interning tables for the LC-3 backend.
//!
//! Three kinds of identity are handed out here:
//!
//! - **Block labels**, module-wide, so a `JSR` in one function can name the
//!   entry block of another. Labels combine the function name, the
//!   sanitized IR block name, and a global sequence number, which keeps them
//!   unique even when block names collide across functions.
//! - **Frame slots**, per function, allocated lazily on first reference.
//!   Slot indices start at 1; the word at `R5 + 0` holds the saved frame
//!   pointer, so a value in slot k lives at `R5 - k`.
//! - **Pool entries**, per block with a module-wide id counter, so every
//!   `VALUE_<id>` in the unit is distinct while each block's pool stays
//!   within `LD`'s PC-relative reach.

use std::collections::HashMap;
use std::fmt::Write;

use super::util::escape_stringz;
use crate::codegen::CodegenOptions;
use crate::error::Result;

/// The frame of a single function may hold at most 32 slots: the prologue
/// reserves the local area with at most two `ADD R6, R6, #-16` steps.
pub const MAX_FRAME_SLOTS: usize = 32;

/// Arguments are passed in R0..R4.
pub const MAX_CALL_ARGS: usize = 5;

/// Module-wide code generation state.
pub struct CodegenState {
    pub opts: CodegenOptions,
    block_labels: HashMap<(String, String), String>,
    next_block_seq: u32,
    next_pool_id: u32,
    next_temp_label: u32,
}

impl CodegenState {
    pub fn new(opts: CodegenOptions) -> Self {
        CodegenState {
            opts,
            block_labels: HashMap::new(),
            next_block_seq: 0,
            next_pool_id: 0,
            next_temp_label: 0,
        }
    }

    /// The assembly label of a basic block, interned on first use.
    pub fn block_label(&mut self, func: &str, block: &str) -> String {
        let key = (func.to_string(), block.to_string());
        if let Some(label) = self.block_labels.get(&key) {
            return label.clone();
        }
        let label = format!(
            "{}_{}_{}",
            sanitize(func),
            sanitize(block),
            self.next_block_seq
        );
        self.next_block_seq += 1;
        self.block_labels.insert(key, label.clone());
        label
    }

    /// Mint a fresh label for an expansion-internal jump target. The counter
    /// is module-wide, so labels never collide within the assembly unit.
    pub fn temp_label(&mut self, family: &str) -> String {
        self.next_temp_label += 1;
        format!("{}_{}", family, self.next_temp_label)
    }

    fn next_pool_id(&mut self) -> u32 {
        self.next_pool_id += 1;
        self.next_pool_id
    }
}

/// LC-3 labels may not contain dots (IR block names often do).
pub fn sanitize(name: &str) -> String {
    name.replace('.', "_")
}

/// Per-function frame table.
///
/// Each SSA value gets exactly one slot, never re-assigned. Index 0 is
/// reserved to mean "not interned", so all slots are at least 1.
pub struct FunctionContext {
    slots: HashMap<String, usize>,
    pub slot_count: usize,
}

impl Default for FunctionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionContext {
    pub fn new() -> Self {
        FunctionContext {
            slots: HashMap::new(),
            slot_count: 0,
        }
    }

    /// The frame slot of an SSA value, allocated on first reference.
    pub fn slot(&mut self, name: &str) -> usize {
        if let Some(&slot) = self.slots.get(name) {
            return slot;
        }
        self.slot_count += 1;
        self.slots.insert(name.to_string(), self.slot_count);
        self.slot_count
    }

    /// The value's offset from R5.
    pub fn offset(&mut self, name: &str) -> i32 {
        -(self.slot(name) as i32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Int(i32),
    Str(String),
}

/// Per-block constant pool.
///
/// The first request for a constant appends its `.FILL`/`.STRINGZ` entry to
/// the pool text; later requests return the same id and emit nothing. The
/// buffered text is appended after the block's code.
pub struct ConstPool {
    entries: HashMap<PoolKey, u32>,
    text: String,
}

impl Default for ConstPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstPool {
    pub fn new() -> Self {
        ConstPool {
            entries: HashMap::new(),
            text: String::new(),
        }
    }

    pub fn intern_int(&mut self, state: &mut CodegenState, value: i32) -> Result<u32> {
        if let Some(&id) = self.entries.get(&PoolKey::Int(value)) {
            return Ok(id);
        }
        let id = state.next_pool_id();
        writeln!(self.text, "VALUE_{}", id)?;
        writeln!(self.text, "\t.FILL\t#{}", value)?;
        self.entries.insert(PoolKey::Int(value), id);
        Ok(id)
    }

    pub fn intern_str(&mut self, state: &mut CodegenState, s: &str) -> Result<u32> {
        let content = s.trim_end_matches('\0');
        if let Some(&id) = self.entries.get(&PoolKey::Str(content.to_string())) {
            return Ok(id);
        }
        let id = state.next_pool_id();
        writeln!(self.text, "VALUE_{}", id)?;
        writeln!(self.text, "\t.STRINGZ\t\"{}\"", escape_stringz(content))?;
        self.entries.insert(PoolKey::Str(content.to_string()), id);
        Ok(id)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> CodegenState {
        CodegenState::new(CodegenOptions::default())
    }

    #[test]
    fn test_block_labels_stable_and_unique() {
        let mut state = test_state();
        let a = state.block_label("main", "entry");
        let b = state.block_label("main", "loop.body");
        let c = state.block_label("helper", "entry");

        assert_eq!(a, "main_entry_0");
        assert_eq!(b, "main_loop_body_1");
        assert_eq!(c, "helper_entry_2");
        assert_eq!(state.block_label("main", "entry"), a);
    }

    #[test]
    fn test_temp_labels_monotonic() {
        let mut state = test_state();
        assert_eq!(state.temp_label("MUL_LOOP"), "MUL_LOOP_1");
        assert_eq!(state.temp_label("MUL_END"), "MUL_END_2");
        assert_eq!(state.temp_label("PHI_NEXT"), "PHI_NEXT_3");
    }

    #[test]
    fn test_slots_start_at_one() {
        let mut fx = FunctionContext::new();
        assert_eq!(fx.slot("a"), 1);
        assert_eq!(fx.slot("b"), 2);
        assert_eq!(fx.slot("a"), 1);
        assert_eq!(fx.offset("b"), -2);
        assert_eq!(fx.slot_count, 2);
    }

    #[test]
    fn test_pool_deduplicates() {
        let mut state = test_state();
        let mut pool = ConstPool::new();
        let a = pool.intern_int(&mut state, 42).unwrap();
        let b = pool.intern_int(&mut state, 42).unwrap();
        let c = pool.intern_int(&mut state, -3).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(
            pool.text(),
            "VALUE_1\n\t.FILL\t#42\nVALUE_2\n\t.FILL\t#-3\n"
        );
    }

    #[test]
    fn test_pool_ids_unique_across_blocks() {
        let mut state = test_state();
        let mut first = ConstPool::new();
        let mut second = ConstPool::new();
        let a = first.intern_int(&mut state, 7).unwrap();
        let b = second.intern_int(&mut state, 7).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_string_pool_trims_and_escapes() {
        let mut state = test_state();
        let mut pool = ConstPool::new();
        pool.intern_str(&mut state, "Hi\n\0\0").unwrap();
        assert_eq!(pool.text(), "VALUE_1\n\t.STRINGZ\t\"Hi\\n\"\n");
    }
}
