use anyhow::{Context, Result};
use lirflow_core::{AnalysisContext, Constants, DominatorTree, Program, ReachingDefinitions};
use lirflow_emit::{
    ConstantsEmitter, DominanceEmitter, Emitter, ReachingDefsEmitter, ReportConfig,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

pub const DEFAULT_FUNCTION: &str = "test";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    /// Reaching definitions used at each program point.
    Rdef,
    /// Dominance frontier of each block.
    Dom,
    /// Dominator set of each block.
    Dominators,
    /// Integer constants at each block exit.
    Constants,
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rdef" => Ok(AnalysisKind::Rdef),
            "dom" => Ok(AnalysisKind::Dom),
            "dominators" => Ok(AnalysisKind::Dominators),
            "constants" => Ok(AnalysisKind::Constants),
            other => Err(format!("unknown analysis: {}", other)),
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisKind::Rdef => "rdef",
            AnalysisKind::Dom => "dom",
            AnalysisKind::Dominators => "dominators",
            AnalysisKind::Constants => "constants",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub function: String,
    pub analyses: Vec<AnalysisKind>,
    pub report: ReportConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            function: DEFAULT_FUNCTION.to_string(),
            analyses: vec![AnalysisKind::Rdef],
            report: ReportConfig::default(),
        }
    }
}

impl DriverConfig {
    /// An empty name selects the default function.
    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.function = if name.is_empty() {
            DEFAULT_FUNCTION.to_string()
        } else {
            name
        };
        self
    }

    pub fn with_analyses(mut self, analyses: Vec<AnalysisKind>) -> Self {
        self.analyses = analyses;
        self
    }

    pub fn with_report(mut self, report: ReportConfig) -> Self {
        self.report = report;
        self
    }
}

/// Runs the configured analyses over one function and renders their reports.
pub struct Driver {
    config: DriverConfig,
}

impl Driver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn run_file<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        let program = lirflow_parser::load_file(path)
            .with_context(|| format!("cannot load {}", path.display()))?;
        self.run_program(&program)
    }

    pub fn run_source(&self, source: &str) -> Result<String> {
        let program = lirflow_parser::load(source);
        self.run_program(&program)
    }

    /// Reports are concatenated in the order the analyses were requested.
    pub fn run_program(&self, program: &Program) -> Result<String> {
        let ctx = AnalysisContext::new(program, &self.config.function)?;
        info!(
            function = %self.config.function,
            blocks = ctx.function().blocks.len(),
            "analysing function"
        );

        let report = self.config.report.clone();
        let mut output = String::new();
        for kind in &self.config.analyses {
            debug!(analysis = %kind, "running analysis");
            let text = match kind {
                AnalysisKind::Rdef => {
                    let result = ReachingDefinitions::compute(&ctx);
                    ReachingDefsEmitter::new(report.clone()).emit_to_string(&result)?
                }
                AnalysisKind::Dom => {
                    let tree = DominatorTree::build(ctx.cfg());
                    DominanceEmitter::frontiers(report.clone()).emit_to_string(&tree)?
                }
                AnalysisKind::Dominators => {
                    let tree = DominatorTree::build(ctx.cfg());
                    DominanceEmitter::dominators(report.clone()).emit_to_string(&tree)?
                }
                AnalysisKind::Constants => {
                    let result = Constants::compute(&ctx);
                    ConstantsEmitter::new(report.clone()).emit_to_string(&result)?
                }
            };
            output.push_str(&text);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_kind_parsing() {
        assert_eq!("rdef".parse::<AnalysisKind>(), Ok(AnalysisKind::Rdef));
        assert_eq!("DOM".parse::<AnalysisKind>(), Ok(AnalysisKind::Dom));
        assert_eq!(
            "dominators".parse::<AnalysisKind>(),
            Ok(AnalysisKind::Dominators)
        );
        assert!("liveness".parse::<AnalysisKind>().is_err());
        assert_eq!(AnalysisKind::Constants.to_string(), "constants");
    }

    #[test]
    fn test_empty_function_name_falls_back() {
        let config = DriverConfig::default().with_function("");
        assert_eq!(config.function, "test");
        let config = DriverConfig::default().with_function("main");
        assert_eq!(config.function, "main");
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: DriverConfig = serde_json::from_str(r#"{"analyses":["dom"]}"#).unwrap();
        assert_eq!(config.function, "test");
        assert_eq!(config.analyses, vec![AnalysisKind::Dom]);
    }
}
