/*! Dominance, reaching-definitions and constant analyses over LIR programs.
 *
 * Single import for the whole pipeline: loading LIR text, building the per-function analysis
 * context, running the engines and rendering reports. [`Driver`] strings these together for
 * callers that just want report text.
 */

pub use lirflow_core as core;
pub use lirflow_emit as emit;
pub use lirflow_parser as parser;

pub mod driver;

pub use driver::{AnalysisKind, Driver, DriverConfig};

pub use lirflow_core::{
    AliasTable, AnalysisContext, Constants, DominatorTree, Function, Instruction, Program,
    ProgramPoint, ReachingDefinitions, Type,
};

pub use lirflow_emit::{OutputFormat, ReportConfig};

pub use lirflow_parser::{load, load_file};
