//! i386 backend: lowers IR to AT&T-syntax assembly.
//!
//! Module layout:
//! - `abi`        : registers and the target description
//! - `instruction`: typed machine instructions and assembly output items
//! - `blocks`     : basic-block partitioning
//! - `liveness`   : per-block next-use analysis
//! - `frame`      : activation-record layout and operand addressing
//! - `regalloc`   : register allocation trait and implementations
//! - `codegen`    : code generation driver (IR → assembly)

pub mod abi;
pub mod blocks;
pub mod frame;
pub mod instruction;
pub mod liveness;
pub mod regalloc;
mod codegen;

// Re-export the public API at `backend::` level.
pub use abi::TargetDesc;
pub use codegen::Codegen;
pub use regalloc::AllocatorKind;

use crate::ir::Program;
use regalloc::{MemoryAllocator, NextUseAllocator, RegAllocator};

/// Knobs for one code-generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodegenOptions {
    pub allocator: AllocatorKind,
    pub target: TargetDesc,
}

impl CodegenOptions {
    pub fn with_allocator(allocator: AllocatorKind) -> Self {
        Self {
            allocator,
            ..Self::default()
        }
    }
}

/// Compile an IR program to assembly text.
pub fn compile_program(program: &Program, options: &CodegenOptions) -> String {
    let reg: Box<dyn RegAllocator> = match options.allocator {
        AllocatorKind::Memory => Box::new(MemoryAllocator::new()),
        AllocatorKind::NextUse => Box::new(NextUseAllocator::new(&options.target)),
    };
    log::debug!(
        "compiling {} functions with the {} allocator",
        program.functions.len(),
        options.allocator.as_str()
    );
    let mut cg = Codegen::with_regalloc(reg, options.target.clone());
    cg.emit_program(program);
    cg.finish()
}
