/*! Fluent API for constructing LIR functions in memory.
 *
 * Writing `Instruction` values by hand means tracking per-block indices and terminator placement.
 * These builders do that bookkeeping so tests and tools can describe a CFG in a few chained calls.
 */

pub mod block_builder;
pub mod function_builder;

pub use block_builder::BlockBuilder;
pub use function_builder::FunctionBuilder;
