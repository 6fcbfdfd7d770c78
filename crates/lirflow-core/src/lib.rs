/*! Core LIR types and the dataflow engines that run over them.
 *
 * A low-level IR is only useful to an analyst once you can ask which blocks dominate which and
 * which writes may reach a read. This crate holds the program model, the type-based alias table
 * and the fixpoint engines that answer those questions one function at a time.
 */

pub mod analysis;
pub mod block;
pub mod builder;
pub mod format;
pub mod function;
pub mod instructions;
pub mod program;
pub mod types;
pub mod values;

pub use analysis::{
    AliasTable, AnalysisContext, ConstValue, Constants, ControlFlowGraph, DominatorTree,
    ReachState, ReachingDefinitions,
};
pub use block::BasicBlock;
pub use builder::{BlockBuilder, FunctionBuilder};
pub use function::{Function, Parameter, ENTRY_BLOCK};
pub use instructions::{
    ArithOp, Call, CallKind, CmpOp, Instruction, Opcode, Operation, ProgramPoint, Terminator,
};
pub use program::Program;
pub use types::{FunctionType, StructDef, Type};
pub use values::{Operand, PointsTo, Variable, VariableKind};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Function not found: {0}")]
    FunctionNotFound(String),
    #[error("Function {0} has no entry block")]
    MissingEntryBlock(String),
    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;
