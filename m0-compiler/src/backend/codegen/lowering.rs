//! Per-opcode instruction selection.
//!
//! Every sequence works through `%eax` and `%ecx` (plus `%edx` for
//! division) and reads or writes the IR operands exactly once each, in
//! whatever location the allocator placed them.

use super::Codegen;
use crate::backend::abi::Register;
use crate::backend::frame::FrameLayout;
use crate::backend::instruction::{Cond, Operand, X86Instr};
use crate::backend::regalloc::Placement;
use crate::ir::{Addr, ArithOp, Instr, Width};

const ACC: Register = Register::Eax;
const AUX: Register = Register::Ecx;

impl Codegen {
    pub(crate) fn emit_instr(&mut self, instr: &Instr, place: &Placement, frame: &FrameLayout) {
        let src = |a: &Addr| place.src(frame, a);
        let dst = |a: &Addr| place.dst(frame, a);
        let word = self.target.word_size;

        match instr {
            Instr::Label(label) => self.push_label(label.clone()),

            Instr::Goto(label) => self.push_asm(X86Instr::Jmp(label.clone())),

            Instr::If { cond, target } => self.emit_test_branch(src(cond), Cond::Ne, target),
            Instr::IfFalse { cond, target } => self.emit_test_branch(src(cond), Cond::Eq, target),

            Instr::Param(arg) => self.push_asm(X86Instr::push(src(arg))),

            Instr::Call { func, nargs, ret } => {
                self.push_asm(X86Instr::Call(func.clone()));
                // Caller pops its pushed arguments.
                self.push_asm(X86Instr::release_stack(word * *nargs as i32));
                if let Some(r) = ret {
                    self.push_asm(X86Instr::mov(ACC, dst(r)));
                }
            }

            Instr::Return(value) => {
                if let Some(v) = value {
                    self.push_asm(X86Instr::mov(src(v), ACC));
                }
                self.emit_epilogue();
            }

            Instr::Compare { op, dst: d, left, right } => {
                let n = self.fresh_comp_label();
                let yes = format!(".LComp_{n}_a");
                let done = format!(".LComp_{n}_b");
                self.push_asm(X86Instr::mov(src(left), ACC));
                self.push_asm(X86Instr::mov(src(right), AUX));
                self.push_asm(X86Instr::Cmp { src: AUX.into(), dst: ACC.into() });
                self.push_asm(X86Instr::JumpCond { cond: Cond::from(*op), target: yes.clone() });
                self.push_asm(X86Instr::mov(Operand::Imm(0), ACC));
                self.push_asm(X86Instr::Jmp(done.clone()));
                self.push_label(yes);
                self.push_asm(X86Instr::mov(Operand::Imm(1), ACC));
                self.push_label(done);
                self.push_asm(X86Instr::mov(ACC, dst(d)));
            }

            Instr::Arith { op, dst: d, left, right } => {
                self.push_asm(X86Instr::mov(src(left), ACC));
                self.push_asm(X86Instr::mov(src(right), AUX));
                let (s, a) = (Operand::Reg(AUX), Operand::Reg(ACC));
                match op {
                    ArithOp::Add => self.push_asm(X86Instr::Add { src: s, dst: a }),
                    ArithOp::Sub => self.push_asm(X86Instr::Sub { src: s, dst: a }),
                    ArithOp::Mul => self.push_asm(X86Instr::Imul { src: s, dst: a }),
                    ArithOp::Div => {
                        self.push_asm(X86Instr::Cltd);
                        self.push_asm(X86Instr::Idiv(s));
                    }
                }
                self.push_asm(X86Instr::mov(ACC, dst(d)));
            }

            Instr::Neg { dst: d, src: s } => {
                self.push_asm(X86Instr::mov(src(s), ACC));
                self.push_asm(X86Instr::Neg(ACC.into()));
                self.push_asm(X86Instr::mov(ACC, dst(d)));
            }

            Instr::New { width, dst: d, count } => {
                let elem = element_size(*width, word);
                self.push_asm(X86Instr::mov(src(count), ACC));
                self.push_asm(X86Instr::Imul { src: Operand::Imm(elem), dst: ACC.into() });
                self.push_asm(X86Instr::push(ACC));
                self.push_asm(X86Instr::Call("malloc".to_string()));
                self.push_asm(X86Instr::release_stack(word));
                self.push_asm(X86Instr::mov(ACC, dst(d)));
            }

            Instr::Move { width, dst: d, src: s } => {
                self.push_asm(X86Instr::mov(src(s), ACC));
                if *width == Width::Byte {
                    self.push_asm(X86Instr::MovSignExtend { src: Operand::ByteReg(ACC), dst: ACC.into() });
                }
                self.push_asm(X86Instr::mov(ACC, dst(d)));
            }

            Instr::LoadIndexed { width, dst: d, base, index } => {
                self.emit_element_address(src(base), src(index), *width);
                let load = match width {
                    Width::Word => X86Instr::mov(Operand::Deref(ACC), ACC),
                    Width::Byte => X86Instr::MovSignExtend { src: Operand::Deref(ACC), dst: ACC.into() },
                };
                self.push_asm(load);
                self.push_asm(X86Instr::mov(ACC, dst(d)));
            }

            Instr::StoreIndexed { width, base, index, src: s } => {
                self.emit_element_address(src(base), src(index), *width);
                self.push_asm(X86Instr::mov(src(s), AUX));
                let store = match width {
                    Width::Word => X86Instr::mov(AUX, Operand::Deref(ACC)),
                    Width::Byte => X86Instr::MovByte { src: Operand::ByteReg(AUX), dst: Operand::Deref(ACC) },
                };
                self.push_asm(store);
            }
        }
    }

    /// `movl c, %eax; cmpl $0, %eax; jCC target`
    fn emit_test_branch(&mut self, cond: Operand, jump_if: Cond, target: &str) {
        self.push_asm(X86Instr::mov(cond, ACC));
        self.push_asm(X86Instr::Cmp { src: Operand::Imm(0), dst: ACC.into() });
        self.push_asm(X86Instr::JumpCond { cond: jump_if, target: target.to_string() });
    }

    /// Leave `base + index * element size` in `%eax`.
    fn emit_element_address(&mut self, base: Operand, index: Operand, width: Width) {
        self.push_asm(X86Instr::mov(index, ACC));
        self.push_asm(X86Instr::mov(base, AUX));
        if width == Width::Word {
            let word = self.target.word_size;
            self.push_asm(X86Instr::Imul { src: Operand::Imm(word), dst: ACC.into() });
        }
        self.push_asm(X86Instr::Add { src: AUX.into(), dst: ACC.into() });
    }
}

fn element_size(width: Width, word: i32) -> i32 {
    match width {
        Width::Word => word,
        Width::Byte => 1,
    }
}
