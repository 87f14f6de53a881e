//! Register allocation interfaces and shared infrastructure.
//!
//! This module defines:
//! - [`RegAllocator`]: the trait both allocators implement.
//! - [`AllocatorKind`]: enum for selecting an allocator at compile time.
//! - [`Placement`]: where one instruction's operands live while it runs.

mod memory;
mod next_use;

pub use memory::MemoryAllocator;
pub use next_use::NextUseAllocator;

use super::abi::Register;
use super::frame::FrameLayout;
use super::instruction::{Operand, X86Instr};
use super::liveness::NextUseTable;
use crate::ir::{Addr, Instr};

// ============================================================================
// Allocator selection
// ============================================================================

/// Which register allocator implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocatorKind {
    /// Every operand is a memory or immediate operand.
    Memory,
    /// Block-local allocation over the saved registers, driven by next use.
    #[default]
    NextUse,
}

impl AllocatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocatorKind::Memory => "memory",
            AllocatorKind::NextUse => "next-use",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "memory" => Some(AllocatorKind::Memory),
            "next-use" => Some(AllocatorKind::NextUse),
            _ => None,
        }
    }
}

// ============================================================================
// Operand placement
// ============================================================================

/// Register-resident operands of one instruction. Anything not listed is
/// addressed through the frame layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    /// Slots read from a register.
    uses: Vec<(usize, Register)>,
    /// Register receiving the definition.
    def: Option<(usize, Register)>,
}

impl Placement {
    /// All operands in memory.
    pub fn memory() -> Self {
        Self::default()
    }

    pub(crate) fn add_use(&mut self, slot: usize, reg: Register) {
        if !self.uses.iter().any(|&(s, _)| s == slot) {
            self.uses.push((slot, reg));
        }
    }

    pub(crate) fn set_def(&mut self, slot: usize, reg: Register) {
        self.def = Some((slot, reg));
    }

    pub fn use_reg(&self, slot: usize) -> Option<Register> {
        self.uses.iter().find(|&&(s, _)| s == slot).map(|&(_, r)| r)
    }

    pub fn def_reg(&self) -> Option<Register> {
        self.def.map(|(_, r)| r)
    }

    /// Operand for reading `addr`.
    pub fn src(&self, frame: &FrameLayout, addr: &Addr) -> Operand {
        match frame.slot_of(addr).and_then(|slot| self.use_reg(slot)) {
            Some(reg) => Operand::Reg(reg),
            None => frame.operand(addr),
        }
    }

    /// Operand for writing `addr`.
    pub fn dst(&self, frame: &FrameLayout, addr: &Addr) -> Operand {
        match (frame.slot_of(addr), self.def) {
            (Some(slot), Some((def_slot, reg))) if slot == def_slot => Operand::Reg(reg),
            _ => frame.operand(addr),
        }
    }
}

// ============================================================================
// Allocator trait
// ============================================================================

/// Abstract register allocation interface.
///
/// The codegen layer drives an allocator one basic block at a time:
/// `begin_block`, then for each instruction `place` (and `flush_before_branch`
/// when the instruction ends the block with a jump), then `after_instr`;
/// finally `end_block`. Any spill or reload code the allocator needs is
/// appended to `out` and emitted before the instruction itself.
pub trait RegAllocator {
    /// Reset descriptors for a new block and take its next-use table.
    fn begin_block(&mut self, table: NextUseTable);

    /// Choose operand locations for instruction `idx`.
    fn place(
        &mut self,
        idx: usize,
        instr: &Instr,
        frame: &FrameLayout,
        out: &mut Vec<X86Instr>,
    ) -> Placement;

    /// Bookkeeping once instruction `idx` has been emitted.
    fn after_instr(&mut self, idx: usize, frame: &FrameLayout, out: &mut Vec<X86Instr>);

    /// Write back anything still needed after the block, before a jump.
    fn flush_before_branch(&mut self, _idx: usize, _frame: &FrameLayout, _out: &mut Vec<X86Instr>) {}

    /// Forget every binding without writing anything (after a return).
    fn discard(&mut self) {}

    fn end_block(&mut self);
}
