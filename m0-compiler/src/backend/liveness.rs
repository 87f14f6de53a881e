//! Next-use analysis for one basic block.
//!
//! A single backward pass over the block computes, for every instruction and
//! every tracked variable (locals, parameters included, then temporaries),
//! where that variable is next read. Locals are assumed live when the block
//! exits, as is any temporary read by an instruction outside the block; other
//! temporaries die with their block. Globals, strings and literals are not
//! tracked. Used by the next-use register allocator to
//! decide what to keep in registers and which value to evict.

use super::blocks::BasicBlock;
use crate::ir::Function;

/// Where a variable is next read, as seen just after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextUse {
    /// Not read again before being overwritten or the block ending.
    Dead,
    /// Not read again in this block but may be read after it.
    LiveOnExit,
    /// Read by the instruction at this (function-level) index.
    At(usize),
}

impl NextUse {
    pub fn is_dead(self) -> bool {
        self == NextUse::Dead
    }

    /// Eviction ordering: larger means needed later.
    pub fn distance(self) -> usize {
        match self {
            NextUse::Dead => 0,
            NextUse::At(i) => i,
            NextUse::LiveOnExit => usize::MAX,
        }
    }
}

/// Per-instruction next-use snapshots for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextUseTable {
    start: usize,
    /// `rows[k]` is the state just after instruction `start + k`.
    rows: Vec<Vec<NextUse>>,
}

impl NextUseTable {
    /// Snapshot after instruction `idx` (function-level index).
    pub fn after(&self, idx: usize) -> &[NextUse] {
        &self.rows[idx - self.start]
    }

    /// Next use of `slot` after instruction `idx`.
    pub fn next_use(&self, idx: usize, slot: usize) -> NextUse {
        self.rows
            .get(idx.wrapping_sub(self.start))
            .and_then(|row| row.get(slot))
            .copied()
            .unwrap_or(NextUse::LiveOnExit)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// State on exit from `block`: locals live, temps live only if some
/// instruction outside the block reads them.
fn exit_state(func: &Function, block: &BasicBlock) -> Vec<NextUse> {
    let mut state: Vec<NextUse> = (0..func.n_slots())
        .map(|slot| {
            if func.is_temp_slot(slot) {
                NextUse::Dead
            } else {
                NextUse::LiveOnExit
            }
        })
        .collect();

    let outside = func
        .instrs
        .iter()
        .enumerate()
        .filter(|(i, _)| !block.range().contains(i))
        .flat_map(|(_, instr)| instr.uses());
    for slot in outside.filter_map(|u| func.slot_of(u)) {
        state[slot] = NextUse::LiveOnExit;
    }
    state
}

/// Compute next-use snapshots for every instruction of `block`.
pub fn compute_next_use(func: &Function, block: &BasicBlock) -> NextUseTable {
    let mut rows = vec![Vec::new(); block.len];
    let mut state = exit_state(func, block);

    for i in block.range().rev() {
        rows[i - block.start] = state.clone();

        let instr = &func.instrs[i];
        // Kill the definition first so `x = x + 1` reads as a use of x.
        if let Some(slot) = instr.def().and_then(|d| func.slot_of(d)) {
            state[slot] = NextUse::Dead;
        }
        for slot in instr.uses().into_iter().filter_map(|u| func.slot_of(u)) {
            state[slot] = NextUse::At(i);
        }
    }

    NextUseTable {
        start: block.start,
        rows,
    }
}
