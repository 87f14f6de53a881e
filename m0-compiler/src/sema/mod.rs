//! Semantic analysis: scopes, types, and the checker that ties them together.

mod checker;
mod diagnostics;
mod symbol_table;
mod types;

pub use checker::{annotate, TypeChecker};
pub use diagnostics::{Diagnostics, SemanticError, SemanticErrorKind};
pub use symbol_table::{Symbol, SymbolKind, SymbolTable};
pub use types::{BaseType, Type};
