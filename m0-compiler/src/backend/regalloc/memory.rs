use super::{Placement, RegAllocator};
use crate::backend::frame::FrameLayout;
use crate::backend::instruction::X86Instr;
use crate::backend::liveness::NextUseTable;
use crate::ir::Instr;

/// Always addresses operands in memory.
///
/// Next-use tables are still computed and handed over, but nothing is ever
/// kept in a register across instructions.
#[derive(Debug, Default)]
pub struct MemoryAllocator {
    blocks_seen: usize,
}

impl MemoryAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegAllocator for MemoryAllocator {
    fn begin_block(&mut self, table: NextUseTable) {
        self.blocks_seen += 1;
        log::trace!("block {} ({} instrs): memory operands only", self.blocks_seen, table.len());
    }

    fn place(
        &mut self,
        _idx: usize,
        _instr: &Instr,
        _frame: &FrameLayout,
        _out: &mut Vec<X86Instr>,
    ) -> Placement {
        Placement::memory()
    }

    fn after_instr(&mut self, _idx: usize, _frame: &FrameLayout, _out: &mut Vec<X86Instr>) {}

    fn end_block(&mut self) {}
}
