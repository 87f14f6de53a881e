use crate::CompileError;
use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    AlreadyDeclared,
    Undeclared,
    NotAFunction,
    NotAVariable,
    TypeMismatch,
    ConditionNotBool,
    IndexNotInt,
    ReturnMismatch,
}

impl fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticErrorKind::AlreadyDeclared => write!(f, "AlreadyDeclared"),
            SemanticErrorKind::Undeclared => write!(f, "Undeclared"),
            SemanticErrorKind::NotAFunction => write!(f, "NotAFunction"),
            SemanticErrorKind::NotAVariable => write!(f, "NotAVariable"),
            SemanticErrorKind::TypeMismatch => write!(f, "TypeMismatch"),
            SemanticErrorKind::ConditionNotBool => write!(f, "ConditionNotBool"),
            SemanticErrorKind::IndexNotInt => write!(f, "IndexNotInt"),
            SemanticErrorKind::ReturnMismatch => write!(f, "ReturnMismatch"),
        }
    }
}

/// One semantic error, tied to a source line and the name that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub line: u32,
    pub name: String,
    pub message: String,
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.name, self.message)
    }
}

/// Errors collected over one type-checking pass.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    errors: Vec<SemanticError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: SemanticError) {
        log::warn!("{error}");
        self.errors.push(error);
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    /// How many errors of one kind were reported.
    pub fn count_of(&self, kind: SemanticErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    /// Write one line per error.
    pub fn write_to(&self, out: &mut impl io::Write) -> io::Result<()> {
        for error in &self.errors {
            writeln!(out, "{error}")?;
        }
        Ok(())
    }

    /// `Err` when anything was reported, so later stages refuse to run.
    pub fn into_result(self) -> Result<(), CompileError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CompileError::Semantic {
                count: self.errors.len(),
                errors: self.errors,
            })
        }
    }
}
