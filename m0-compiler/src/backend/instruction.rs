//! i386 machine-instruction types and assembly output items.
//!
//! This module defines the typed instruction subset the backend emits
//! (`X86Instr`), its operands (`Operand`), branch conditions (`Cond`), and the
//! structured assembly output type (`AsmItem`). Everything prints in AT&T
//! syntax: `op<TAB>src, dst`.

use super::abi::Register;
use crate::ir::RelOp;
use std::fmt;

// ============================================================================
// Operands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `$42`
    Imm(i32),
    /// `$label`, the address of a data label.
    AddrOf(String),
    /// `%eax`
    Reg(Register),
    /// `%al`
    ByteReg(Register),
    /// `-8(%ebp)`
    Frame(i32),
    /// `name`, a memory operand addressed by label.
    Symbol(String),
    /// `(%eax)`
    Deref(Register),
}

impl From<Register> for Operand {
    fn from(r: Register) -> Self {
        Operand::Reg(r)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Imm(n) => write!(f, "${n}"),
            Operand::AddrOf(label) => write!(f, "${label}"),
            Operand::Reg(r) => write!(f, "{r}"),
            Operand::ByteReg(r) => f.write_str(r.low_byte().unwrap_or(r.as_str())),
            Operand::Frame(offset) => write!(f, "{offset}({})", Register::FRAME_PTR),
            Operand::Symbol(name) => write!(f, "{name}"),
            Operand::Deref(r) => write!(f, "({r})"),
        }
    }
}

// ============================================================================
// Condition codes (for conditional jumps)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Cond {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Cond::Eq => "je",
            Cond::Ne => "jne",
            Cond::Lt => "jl",
            Cond::Gt => "jg",
            Cond::Le => "jle",
            Cond::Ge => "jge",
        }
    }
}

impl From<RelOp> for Cond {
    fn from(op: RelOp) -> Self {
        match op {
            RelOp::Eq => Cond::Eq,
            RelOp::Neq => Cond::Ne,
            RelOp::Lt => Cond::Lt,
            RelOp::Gt => Cond::Gt,
            RelOp::Le => Cond::Le,
            RelOp::Ge => Cond::Ge,
        }
    }
}

// ============================================================================
// Typed i386 instruction
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum X86Instr {
    // ── Data movement ───────────────────────────────────────────────────
    /// `movl src, dst`
    Mov { src: Operand, dst: Operand },
    /// `movb src, dst`
    MovByte { src: Operand, dst: Operand },
    /// `movsbl src, dst`, sign-extending byte load
    MovSignExtend { src: Operand, dst: Operand },
    /// `pushl src`
    Push(Operand),
    /// `popl dst`
    Pop(Operand),

    // ── Arithmetic ──────────────────────────────────────────────────────
    /// `addl src, dst`
    Add { src: Operand, dst: Operand },
    /// `subl src, dst`
    Sub { src: Operand, dst: Operand },
    /// `imul src, dst`
    Imul { src: Operand, dst: Operand },
    /// `negl dst`
    Neg(Operand),
    /// `cltd`, sign-extend eax into edx:eax
    Cltd,
    /// `idiv src`, quotient in eax
    Idiv(Operand),
    /// `cmpl src, dst`
    Cmp { src: Operand, dst: Operand },

    // ── Control flow ────────────────────────────────────────────────────
    /// `jmp label`
    Jmp(String),
    /// `jCC label`
    JumpCond { cond: Cond, target: String },
    /// `call label`
    Call(String),
    /// `ret`
    Ret,
}

// ── Convenience constructors ────────────────────────────────────────────

impl X86Instr {
    pub fn mov(src: impl Into<Operand>, dst: impl Into<Operand>) -> Self {
        X86Instr::Mov {
            src: src.into(),
            dst: dst.into(),
        }
    }

    pub fn push(src: impl Into<Operand>) -> Self {
        X86Instr::Push(src.into())
    }

    pub fn pop(dst: impl Into<Operand>) -> Self {
        X86Instr::Pop(dst.into())
    }

    /// `subl $n, %esp`
    pub fn reserve_stack(bytes: i32) -> Self {
        X86Instr::Sub {
            src: Operand::Imm(bytes),
            dst: Operand::Reg(Register::STACK_PTR),
        }
    }

    /// `addl $n, %esp`
    pub fn release_stack(bytes: i32) -> Self {
        X86Instr::Add {
            src: Operand::Imm(bytes),
            dst: Operand::Reg(Register::STACK_PTR),
        }
    }
}

// ── Display (assembly text) ─────────────────────────────────────────────

impl fmt::Display for X86Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            X86Instr::Mov { src, dst } => write!(f, "movl\t{src}, {dst}"),
            X86Instr::MovByte { src, dst } => write!(f, "movb\t{src}, {dst}"),
            X86Instr::MovSignExtend { src, dst } => write!(f, "movsbl\t{src}, {dst}"),
            X86Instr::Push(src) => write!(f, "pushl\t{src}"),
            X86Instr::Pop(dst) => write!(f, "popl\t{dst}"),
            X86Instr::Add { src, dst } => write!(f, "addl\t{src}, {dst}"),
            X86Instr::Sub { src, dst } => write!(f, "subl\t{src}, {dst}"),
            X86Instr::Imul { src, dst } => write!(f, "imul\t{src}, {dst}"),
            X86Instr::Neg(dst) => write!(f, "negl\t{dst}"),
            X86Instr::Cltd => write!(f, "cltd"),
            X86Instr::Idiv(src) => write!(f, "idiv\t{src}"),
            X86Instr::Cmp { src, dst } => write!(f, "cmpl\t{src}, {dst}"),
            X86Instr::Jmp(target) => write!(f, "jmp\t{target}"),
            X86Instr::JumpCond { cond, target } => write!(f, "{}\t{target}", cond.mnemonic()),
            X86Instr::Call(target) => write!(f, "call\t{target}"),
            X86Instr::Ret => write!(f, "ret"),
        }
    }
}

// ============================================================================
// Assembly output items
// ============================================================================

/// One line of assembly output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmItem {
    /// A machine instruction, tab-indented.
    Instr(X86Instr),
    /// `name:`
    Label(String),
    /// A directive or data line, printed verbatim.
    Directive(String),
    Blank,
}

impl fmt::Display for AsmItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmItem::Instr(instr) => write!(f, "\t{instr}"),
            AsmItem::Label(name) => write!(f, "{name}:"),
            AsmItem::Directive(text) => f.write_str(text),
            AsmItem::Blank => Ok(()),
        }
    }
}
