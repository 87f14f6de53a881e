//! Intermediate representation consumed by the backend.
//!
//! This module contains the IR model, the lexer and parser for its textual
//! form, and the printer (`Program::to_lines`) that writes it back out.

pub mod ir;
pub use ir::*;
pub mod lexer;
pub mod parser;
