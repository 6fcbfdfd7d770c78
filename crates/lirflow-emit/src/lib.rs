/*! Render analysis results as text or JSON.
 *
 * Each analysis gets an emitter that prints one line per program point or block in a stable
 * order, so reports can be diffed between runs. The JSON form carries the same content keyed the
 * same way, for tools that consume results.
 */

pub mod config;
pub mod emitter;
pub mod reports;

pub use config::{OutputFormat, ReportConfig};
pub use emitter::{EmitHelper, EmitResult, Emitter};
pub use reports::{ConstantsEmitter, DominanceEmitter, DominanceView, ReachingDefsEmitter};
