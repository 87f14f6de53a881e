//! Code generation state and assembly output.
//!
//! Contains the [`Codegen`] struct (the central code-generation driver),
//! buffer helpers, and final text rendering. Program and function layout
//! live in `program`, per-opcode instruction selection in `lowering`.

mod lowering;
mod program;

use super::abi::{Register, TargetDesc};
use super::instruction::{AsmItem, X86Instr};
use super::regalloc::RegAllocator;

// ============================================================================
// Codegen state
// ============================================================================

/// Central code-generation driver.
///
/// Accumulates assembly items for a whole program, drives the register
/// allocator block by block, and renders the final text.
pub struct Codegen {
    pub(crate) out: Vec<AsmItem>,
    pub(crate) reg: Box<dyn RegAllocator>,
    pub(crate) target: TargetDesc,
    /// Next number for `.LComp_<n>_a/_b` label pairs; starts at 1.
    next_comp_label: u32,
}

impl Codegen {
    pub fn with_regalloc(reg: Box<dyn RegAllocator>, target: TargetDesc) -> Self {
        Self {
            out: Vec::new(),
            reg,
            target,
            next_comp_label: 1,
        }
    }

    // ── Item emission helpers ───────────────────────────────────────────

    pub(crate) fn push_asm(&mut self, instr: X86Instr) {
        self.out.push(AsmItem::Instr(instr));
    }

    pub(crate) fn push_label(&mut self, name: impl Into<String>) {
        self.out.push(AsmItem::Label(name.into()));
    }

    pub(crate) fn push_directive(&mut self, text: impl Into<String>) {
        self.out.push(AsmItem::Directive(text.into()));
    }

    pub(crate) fn push_blank(&mut self) {
        self.out.push(AsmItem::Blank);
    }

    /// Move allocator-emitted spill/reload code into the output.
    pub(crate) fn drain_regalloc(&mut self, instrs: Vec<X86Instr>) {
        for instr in instrs {
            self.push_asm(instr);
        }
    }

    pub(crate) fn fresh_comp_label(&mut self) -> u32 {
        let n = self.next_comp_label;
        self.next_comp_label += 1;
        n
    }

    // ── Frame entry/exit ────────────────────────────────────────────────

    pub(crate) fn emit_prologue(&mut self, frame_size: i32) {
        self.push_asm(X86Instr::push(Register::FRAME_PTR));
        self.push_asm(X86Instr::mov(Register::STACK_PTR, Register::FRAME_PTR));
        self.push_asm(X86Instr::reserve_stack(frame_size));
        for r in self.target.saved_regs.clone() {
            self.push_asm(X86Instr::push(r));
        }
    }

    /// Restore saved registers, tear down the frame and return.
    pub(crate) fn emit_epilogue(&mut self) {
        for r in self.target.saved_regs.clone().into_iter().rev() {
            self.push_asm(X86Instr::pop(r));
        }
        self.push_asm(X86Instr::mov(Register::FRAME_PTR, Register::STACK_PTR));
        self.push_asm(X86Instr::pop(Register::FRAME_PTR));
        self.push_asm(X86Instr::Ret);
    }

    // ── Output ──────────────────────────────────────────────────────────

    /// Render everything emitted so far, one item per line.
    pub fn finish(self) -> String {
        let mut text = String::new();
        for item in &self.out {
            text.push_str(&item.to_string());
            text.push('\n');
        }
        text
    }
}
