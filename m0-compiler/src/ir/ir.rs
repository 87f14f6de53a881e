// Three-address IR consumed by the backend: one instruction list per function.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub functions: Vec<Function>,
    /// Word-sized globals, in declaration order.
    pub globals: Vec<String>,
    pub strings: Vec<StringConst>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringConst {
    pub label: String,
    /// Text between the quotes, unescaped.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    /// The first `nargs` entries of `locals` are the parameters.
    pub nargs: usize,
    pub locals: Vec<String>,
    pub n_temps: usize,
    pub instrs: Vec<Instr>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nargs: 0,
            locals: Vec::new(),
            n_temps: 0,
            instrs: Vec::new(),
        }
    }

    /// Number of tracked variables: locals (params included) then temps.
    pub fn n_slots(&self) -> usize {
        self.locals.len() + self.n_temps
    }

    /// Dense slot index of a local or temp; `None` for untracked operands.
    pub fn slot_of(&self, addr: &Addr) -> Option<usize> {
        match addr {
            Addr::Local(i) => Some(*i),
            Addr::Temp(t) => Some(self.locals.len() + t),
            Addr::Global(_) | Addr::Str(_) | Addr::Number(_) => None,
        }
    }

    pub fn is_temp_slot(&self, slot: usize) -> bool {
        slot >= self.locals.len()
    }

    fn operand(&self, addr: &Addr) -> String {
        match addr {
            Addr::Local(i) => match self.locals.get(*i) {
                Some(name) => name.clone(),
                None => format!("local{i}"),
            },
            other => other.to_string(),
        }
    }

    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.instrs.len() + 3);
        let params = self.locals[..self.nargs.min(self.locals.len())].join(", ");
        out.push(format!("fun {} ({params}) {{", self.name));
        if self.locals.len() > self.nargs {
            out.push(format!("  local {}", self.locals[self.nargs..].join(", ")));
        }

        let o = |a: &Addr| self.operand(a);
        for ins in &self.instrs {
            let line = match ins {
                Instr::Label(l) => format!("{l}:"),
                Instr::Goto(l) => format!("  goto {l}"),
                Instr::If { cond, target } => format!("  if {} goto {target}", o(cond)),
                Instr::IfFalse { cond, target } => format!("  ifFalse {} goto {target}", o(cond)),
                Instr::Param(a) => format!("  param {}", o(a)),
                Instr::Call { func, nargs, ret: Some(r) } => format!("  {} = call {func} {nargs}", o(r)),
                Instr::Call { func, nargs, ret: None } => format!("  call {func} {nargs}"),
                Instr::Return(Some(v)) => format!("  ret {}", o(v)),
                Instr::Return(None) => "  ret".to_string(),
                Instr::Compare { op, dst, left, right } => {
                    format!("  {} = {} {op} {}", o(dst), o(left), o(right))
                }
                Instr::Arith { op, dst, left, right } => {
                    format!("  {} = {} {op} {}", o(dst), o(left), o(right))
                }
                Instr::Neg { dst, src } => format!("  {} = - {}", o(dst), o(src)),
                Instr::New { width, dst, count } => {
                    format!("  {} = new {}{}", o(dst), width.prefix(), o(count))
                }
                Instr::Move { width, dst, src } => {
                    format!("  {} = {}{}", o(dst), width.prefix(), o(src))
                }
                Instr::LoadIndexed { width, dst, base, index } => {
                    format!("  {} = {}{}[{}]", o(dst), width.prefix(), o(base), o(index))
                }
                Instr::StoreIndexed { width, base, index, src } => {
                    format!("  {}{}[{}] = {}", width.prefix(), o(base), o(index), o(src))
                }
            };
            out.push(line);
        }
        out.push("}".to_string());
        out
    }
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Render back to the textual form the parser accepts.
    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for s in &self.strings {
            out.push(format!("string {} = \"{}\"", s.label, s.value));
        }
        for g in &self.globals {
            out.push(format!("global {g}"));
        }
        for f in &self.functions {
            out.extend(f.to_lines());
        }
        out
    }
}

/// An instruction operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Addr {
    Global(String),
    /// String constant, by label.
    Str(String),
    /// Index into the owning function's `locals`.
    Local(usize),
    Temp(usize),
    Number(i32),
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addr::Global(name) => write!(f, "{name}"),
            Addr::Str(label) => write!(f, "{label}"),
            Addr::Local(i) => write!(f, "local{i}"),
            Addr::Temp(t) => write!(f, "${t}"),
            Addr::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Element width of memory accesses and allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Word,
    Byte,
}

impl Width {
    fn prefix(self) -> &'static str {
        match self {
            Width::Word => "",
            Width::Byte => "byte ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `L:`
    Label(String),
    /// `goto L`
    Goto(String),
    /// `if c goto L`
    If { cond: Addr, target: String },
    /// `ifFalse c goto L`
    IfFalse { cond: Addr, target: String },
    /// `param a`
    Param(Addr),
    /// `call f n` / `r = call f n`
    Call { func: String, nargs: usize, ret: Option<Addr> },
    /// `ret` / `ret v`
    Return(Option<Addr>),
    /// `dst = left op right`, 1 or 0
    Compare { op: RelOp, dst: Addr, left: Addr, right: Addr },
    Arith { op: ArithOp, dst: Addr, left: Addr, right: Addr },
    /// `dst = - src`
    Neg { dst: Addr, src: Addr },
    /// `dst = new count` (heap block of `count` elements)
    New { width: Width, dst: Addr, count: Addr },
    Move { width: Width, dst: Addr, src: Addr },
    /// `dst = base[index]`
    LoadIndexed { width: Width, dst: Addr, base: Addr, index: Addr },
    /// `base[index] = src`
    StoreIndexed { width: Width, base: Addr, index: Addr, src: Addr },
}

impl Instr {
    /// The operand this instruction writes, if any.
    pub fn def(&self) -> Option<&Addr> {
        match self {
            Instr::Compare { dst, .. }
            | Instr::Arith { dst, .. }
            | Instr::Neg { dst, .. }
            | Instr::New { dst, .. }
            | Instr::Move { dst, .. }
            | Instr::LoadIndexed { dst, .. } => Some(dst),
            Instr::Call { ret, .. } => ret.as_ref(),
            Instr::Label(_)
            | Instr::Goto(_)
            | Instr::If { .. }
            | Instr::IfFalse { .. }
            | Instr::Param(_)
            | Instr::Return(_)
            | Instr::StoreIndexed { .. } => None,
        }
    }

    /// Operands this instruction reads.
    pub fn uses(&self) -> Vec<&Addr> {
        match self {
            Instr::If { cond, .. } | Instr::IfFalse { cond, .. } => vec![cond],
            Instr::Param(a) => vec![a],
            Instr::Return(Some(v)) => vec![v],
            Instr::Compare { left, right, .. } | Instr::Arith { left, right, .. } => {
                vec![left, right]
            }
            Instr::Neg { src, .. } | Instr::Move { src, .. } => vec![src],
            Instr::New { count, .. } => vec![count],
            Instr::LoadIndexed { base, index, .. } => vec![base, index],
            Instr::StoreIndexed { base, index, src, .. } => vec![base, index, src],
            Instr::Label(_) | Instr::Goto(_) | Instr::Call { .. } | Instr::Return(None) => {
                Vec::new()
            }
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Instr::Label(_))
    }

    /// Unconditional or conditional jump.
    pub fn is_branch(&self) -> bool {
        matches!(self, Instr::Goto(_) | Instr::If { .. } | Instr::IfFalse { .. })
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Instr::Return(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp { Add, Sub, Mul, Div }

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}",
            match self { ArithOp::Add => "+", ArithOp::Sub => "-", ArithOp::Mul => "*", ArithOp::Div => "/" })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp { Eq, Neq, Lt, Gt, Le, Ge }

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self { RelOp::Eq => "==", RelOp::Neq => "!=", RelOp::Lt => "<", RelOp::Gt => ">", RelOp::Le => "<=", RelOp::Ge => ">=" };
        write!(f, "{}", s)
    }
}
