use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Register {
    Eax, Ebx, Ecx, Edx, Esi, Edi, Esp, Ebp,
}

impl Register {
    /// Frame pointer: parameters above it, locals and temporaries below.
    pub const FRAME_PTR: Register = Register::Ebp;
    pub const STACK_PTR: Register = Register::Esp;
    /// Return values and the accumulator for every lowering sequence.
    pub const RET_REG: Register = Register::Eax;

    pub fn as_str(&self) -> &'static str {
        match self {
            Register::Eax => "%eax",
            Register::Ebx => "%ebx",
            Register::Ecx => "%ecx",
            Register::Edx => "%edx",
            Register::Esi => "%esi",
            Register::Edi => "%edi",
            Register::Esp => "%esp",
            Register::Ebp => "%ebp",
        }
    }

    /// Low 8-bit alias, where the register has one.
    pub fn low_byte(&self) -> Option<&'static str> {
        match self {
            Register::Eax => Some("%al"),
            Register::Ebx => Some("%bl"),
            Register::Ecx => Some("%cl"),
            Register::Edx => Some("%dl"),
            Register::Esi | Register::Edi | Register::Esp | Register::Ebp => None,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target machine parameters the backend is generic over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDesc {
    /// Bytes per stack slot, global and array element.
    pub word_size: i32,
    /// Saved in the prologue and restored (in reverse) before every return.
    /// The next-use allocator keeps values in these.
    pub saved_regs: Vec<Register>,
    /// Free for instruction sequences; never hold values across instructions.
    pub scratch_regs: Vec<Register>,
}

impl TargetDesc {
    pub fn i386() -> Self {
        Self {
            word_size: 4,
            saved_regs: vec![Register::Ebx, Register::Esi, Register::Edi],
            scratch_regs: vec![Register::Eax, Register::Ecx, Register::Edx],
        }
    }
}

impl Default for TargetDesc {
    fn default() -> Self {
        Self::i386()
    }
}
