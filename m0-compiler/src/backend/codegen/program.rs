//! Program-level code generation orchestration.
//!
//! Implements `Codegen::emit_program`, which writes the data section and then
//! every function in order, and `Codegen::emit_function`, which partitions a
//! function into basic blocks, runs next-use analysis on each, and drives the
//! allocator and instruction lowering through them.

use super::Codegen;
use crate::backend::blocks::{build_blocks, BasicBlock};
use crate::backend::frame::FrameLayout;
use crate::backend::liveness::compute_next_use;
use crate::ir::{Function, Instr, Program};

impl Codegen {
    pub fn emit_program(&mut self, program: &Program) {
        self.push_directive(".data");
        for s in &program.strings {
            self.push_directive(format!("{}:\t.string \"{}\"", s.label, s.value));
        }
        for g in &program.globals {
            self.push_directive(format!(".comm\t{g}, {}", self.target.word_size));
        }
        self.push_blank();
        self.push_directive(".text");

        for func in &program.functions {
            self.emit_function(func);
        }
    }

    pub fn emit_function(&mut self, func: &Function) {
        let frame = FrameLayout::new(func, &self.target);
        let blocks = build_blocks(&func.instrs);
        log::debug!(
            "emitting {} ({} blocks, {} bytes of frame)",
            func.name,
            blocks.len(),
            frame.frame_size()
        );

        self.push_blank();
        self.push_directive(format!(".globl {}", func.name));
        self.push_directive(format!(".type\t{}, @function", func.name));
        self.push_label(func.name.clone());
        self.emit_prologue(frame.frame_size());

        for block in &blocks {
            self.emit_block(func, block, &frame);
        }

        // Falling off the end (or an empty body) still returns.
        if !matches!(func.instrs.last(), Some(Instr::Return(_))) {
            self.emit_epilogue();
        }
    }

    fn emit_block(&mut self, func: &Function, block: &BasicBlock, frame: &FrameLayout) {
        let table = compute_next_use(func, block);
        self.reg.begin_block(table);

        for idx in block.range() {
            let instr = &func.instrs[idx];

            let mut pre = Vec::new();
            let placement = self.reg.place(idx, instr, frame, &mut pre);
            if instr.is_branch() {
                self.reg.flush_before_branch(idx, frame, &mut pre);
            }
            self.drain_regalloc(pre);

            self.emit_instr(instr, &placement, frame);

            if instr.is_return() {
                self.reg.discard();
            } else {
                let mut post = Vec::new();
                self.reg.after_instr(idx, frame, &mut post);
                self.drain_regalloc(post);
            }
        }

        self.reg.end_block();
    }
}
