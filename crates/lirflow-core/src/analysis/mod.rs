/*! Dominance, reaching definitions and constant propagation over one function.
 *
 * Every engine starts from an [`AnalysisContext`], which owns the variable table, the type-based
 * alias table and the CFG of the function being analyzed. The dataflow engines share one
 * worklist solver and differ only in their state lattice and transfer functions.
 */

pub mod alias;
pub mod cfg;
pub mod constants;
pub mod context;
pub mod dominator;
pub mod lattice;
pub mod reaching;
pub mod solver;

pub use alias::{AliasTable, TypeReachability};
pub use cfg::ControlFlowGraph;
pub use constants::{ConstState, ConstValue, ConstantPropagation, Constants};
pub use context::AnalysisContext;
pub use dominator::DominatorTree;
pub use lattice::JoinSemiLattice;
pub use reaching::{ReachState, ReachingDefinitions, ReachingDefinitionsAnalysis};
pub use solver::{solve, Fixpoint, ForwardAnalysis};
