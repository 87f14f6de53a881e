//! Basic-block partitioning of a function's instruction list.

use crate::ir::Instr;
use std::ops::Range;

/// A contiguous run of instructions, by index into the function's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicBlock {
    pub start: usize,
    pub len: usize,
}

impl BasicBlock {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    /// Index of the block's last instruction.
    pub fn last(&self) -> usize {
        self.start + self.len - 1
    }

    pub fn instrs<'a>(&self, instrs: &'a [Instr]) -> &'a [Instr] {
        &instrs[self.range()]
    }
}

/// Split `instrs` into maximal straight-line blocks.
///
/// A block ends at the last instruction, before a label, or after a jump or
/// conditional branch. Every instruction lands in exactly one block.
pub fn build_blocks(instrs: &[Instr]) -> Vec<BasicBlock> {
    let mut blocks = Vec::new();
    let mut start = 0;

    for (i, instr) in instrs.iter().enumerate() {
        let is_last = i + 1 == instrs.len();
        let next_is_label = instrs.get(i + 1).is_some_and(Instr::is_label);
        if is_last || next_is_label || instr.is_branch() {
            blocks.push(BasicBlock {
                start,
                len: i + 1 - start,
            });
            start = i + 1;
        }
    }

    blocks
}
