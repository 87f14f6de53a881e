pub mod tree;
pub mod sema;
pub mod ir;
pub mod backend;

use thiserror::Error;

pub use backend::{compile_program, AllocatorKind, CodegenOptions};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexical error: {0}")]
    Lexical(#[from] ir::lexer::LexicalError),

    #[error("Parse error at line {line}, column {col}: {message}\n  Context: {context}")]
    Parse {
        line: usize,
        col: usize,
        context: String,
        message: String,
    },

    #[error("{count} semantic error(s)")]
    Semantic {
        count: usize,
        errors: Vec<sema::SemanticError>,
    },
}

/// Type-check a tree in place; `Err` if anything was reported.
pub fn check_tree(tree: &mut tree::SyntaxTree, root: tree::NodeId) -> Result<(), CompileError> {
    sema::annotate(tree, root).into_result()
}

/// Parse textual IR into the program model.
pub fn parse_ir(source: &str) -> Result<ir::Program, CompileError> {
    ir::parser::parse_program(source)
}

/// Compile textual IR directly to i386 assembly.
pub fn compile_ir_text(source: &str, options: &CodegenOptions) -> Result<String, CompileError> {
    let program = parse_ir(source)?;
    Ok(compile_program(&program, options))
}
