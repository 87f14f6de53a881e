//! Activation-record layout: where every IR operand lives.
//!
//! ```text
//!   +(k+2)*w(%ebp)   parameter k
//!        4(%ebp)     return address
//!        0(%ebp)     saved %ebp
//!       -w(%ebp)     first interior local
//!        ...         interior locals, then temporaries
//! ```
//!
//! The saved registers are pushed below the reserved area and never overlap
//! it. The mapping is pure index arithmetic; each variable owns its slot for
//! the whole function. The parser caps a function at
//! [`MAX_SLOTS`](crate::ir::parser::MAX_SLOTS) slots, so offsets fit in `i32`.

use super::abi::TargetDesc;
use super::instruction::Operand;
use crate::ir::{Addr, Function};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Byte offset from the frame pointer.
    Frame(i32),
    /// Word in the data section.
    Global(String),
    /// Address of a string constant.
    StringAddr(String),
    Immediate(i32),
}

impl Location {
    pub fn operand(self) -> Operand {
        match self {
            Location::Frame(offset) => Operand::Frame(offset),
            Location::Global(name) => Operand::Symbol(name),
            Location::StringAddr(label) => Operand::AddrOf(label),
            Location::Immediate(n) => Operand::Imm(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub nargs: usize,
    /// Parameters included.
    pub nlocals: usize,
    pub ntemps: usize,
    pub word_size: i32,
}

impl FrameLayout {
    pub fn new(func: &Function, target: &TargetDesc) -> Self {
        Self {
            nargs: func.nargs,
            nlocals: func.locals.len(),
            ntemps: func.n_temps,
            word_size: target.word_size,
        }
    }

    /// Bytes reserved below the frame pointer for interior locals and temps.
    pub fn frame_size(&self) -> i32 {
        let slots = (self.nlocals + self.ntemps).saturating_sub(self.nargs);
        slots as i32 * self.word_size
    }

    /// Dense slot index of a local or temp, as used by the liveness tables.
    pub fn slot_of(&self, addr: &Addr) -> Option<usize> {
        match addr {
            Addr::Local(i) => Some(*i),
            Addr::Temp(t) => Some(self.nlocals + t),
            Addr::Global(_) | Addr::Str(_) | Addr::Number(_) => None,
        }
    }

    /// Frame-pointer offset of a slot.
    pub fn slot_offset(&self, slot: usize) -> i32 {
        let w = self.word_size;
        if slot < self.nargs {
            (slot as i32 + 2) * w
        } else {
            -((slot - self.nargs) as i32 + 1) * w
        }
    }

    pub fn resolve(&self, addr: &Addr) -> Location {
        match addr {
            Addr::Global(name) => Location::Global(name.clone()),
            Addr::Str(label) => Location::StringAddr(label.clone()),
            Addr::Number(n) => Location::Immediate(*n),
            Addr::Local(i) => Location::Frame(self.slot_offset(*i)),
            Addr::Temp(t) => Location::Frame(self.slot_offset(self.nlocals + t)),
        }
    }

    /// Memory (or immediate) operand for `addr`.
    pub fn operand(&self, addr: &Addr) -> Operand {
        self.resolve(addr).operand()
    }

    /// Memory operand for a tracked slot.
    pub fn slot_operand(&self, slot: usize) -> Operand {
        Operand::Frame(self.slot_offset(slot))
    }
}
