//! Resolved types: a base scalar wrapped in zero or more array levels.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int,
    Bool,
    Char,
    Void,
}

impl BaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::Int => "int",
            BaseType::Bool => "bool",
            BaseType::Char => "char",
            BaseType::Void => "void",
        }
    }
}

/// A base type plus its indirection count (array nesting depth).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Type {
    pub base: BaseType,
    pub indirection: u32,
}

impl Type {
    pub const INT: Type = Type::scalar(BaseType::Int);
    pub const BOOL: Type = Type::scalar(BaseType::Bool);
    pub const CHAR: Type = Type::scalar(BaseType::Char);
    pub const VOID: Type = Type::scalar(BaseType::Void);

    pub const fn scalar(base: BaseType) -> Self {
        Self {
            base,
            indirection: 0,
        }
    }

    pub const fn new(base: BaseType, indirection: u32) -> Self {
        Self { base, indirection }
    }

    /// One more level of array around `self`.
    pub const fn array_of(self) -> Self {
        Self {
            base: self.base,
            indirection: self.indirection + 1,
        }
    }

    /// The element type after one index application, or `None` for scalars.
    pub fn element(self) -> Option<Self> {
        self.indirection.checked_sub(1).map(|indirection| Self {
            base: self.base,
            indirection,
        })
    }

    pub fn is_void(self) -> bool {
        self == Type::VOID
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.indirection {
            f.write_str("[]")?;
        }
        f.write_str(self.base.as_str())
    }
}
