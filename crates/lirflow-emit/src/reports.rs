use crate::{
    config::{OutputFormat, ReportConfig},
    emitter::{EmitHelper, EmitResult, Emitter},
};
use lirflow_core::{Constants, DominatorTree, ReachingDefinitions};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

/// `point -> {definitions}` for every instruction that reads a definition.
///
/// Points and definitions are ordered by their printed form.
pub struct ReachingDefsEmitter {
    config: ReportConfig,
}

impl ReachingDefsEmitter {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    fn rows(&self, result: &ReachingDefinitions) -> BTreeMap<String, BTreeSet<String>> {
        result
            .solution()
            .iter()
            .filter(|(_, defs)| self.config.include_empty || !defs.is_empty())
            .map(|(point, defs)| {
                (
                    point.to_string(),
                    defs.iter().map(ToString::to_string).collect(),
                )
            })
            .collect()
    }
}

impl Emitter for ReachingDefsEmitter {
    type Item = ReachingDefinitions;

    fn emit<W: Write>(&self, item: &ReachingDefinitions, writer: &mut W) -> EmitResult {
        let rows = self.rows(item);
        match self.config.format {
            OutputFormat::Text => {
                for (point, defs) in &rows {
                    EmitHelper::write_set_line(writer, point, defs)?;
                }
                Ok(())
            }
            OutputFormat::Json => EmitHelper::write_json(writer, &rows),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DominanceView {
    Frontiers,
    Dominators,
}

/// `block -> {blocks}` for every block, sorted by name.
pub struct DominanceEmitter {
    config: ReportConfig,
    view: DominanceView,
}

impl DominanceEmitter {
    pub fn new(config: ReportConfig, view: DominanceView) -> Self {
        Self { config, view }
    }

    pub fn frontiers(config: ReportConfig) -> Self {
        Self::new(config, DominanceView::Frontiers)
    }

    pub fn dominators(config: ReportConfig) -> Self {
        Self::new(config, DominanceView::Dominators)
    }
}

impl Emitter for DominanceEmitter {
    type Item = DominatorTree;

    fn emit<W: Write>(&self, item: &DominatorTree, writer: &mut W) -> EmitResult {
        let sets = match self.view {
            DominanceView::Frontiers => item.all_frontiers(),
            DominanceView::Dominators => item.all_dominators(),
        };
        match self.config.format {
            OutputFormat::Text => {
                for (block, set) in sets {
                    EmitHelper::write_set_line(writer, block, set)?;
                }
                Ok(())
            }
            OutputFormat::Json => EmitHelper::write_json(writer, sets),
        }
    }
}

/// `block -> {var -> value, ...}` with the exit value of each `int`
/// variable the block mentions.
pub struct ConstantsEmitter {
    config: ReportConfig,
}

impl ConstantsEmitter {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }
}

impl Emitter for ConstantsEmitter {
    type Item = Constants;

    fn emit<W: Write>(&self, item: &Constants, writer: &mut W) -> EmitResult {
        let rows: BTreeMap<String, BTreeMap<String, String>> = item
            .block_values()
            .into_iter()
            .filter(|(_, values)| self.config.include_empty || !values.is_empty())
            .map(|(block, values)| {
                let values = values
                    .into_iter()
                    .map(|(var, value)| (var, value.to_string()))
                    .collect();
                (block, values)
            })
            .collect();

        match self.config.format {
            OutputFormat::Text => {
                for (block, values) in &rows {
                    EmitHelper::write_set_line(
                        writer,
                        block,
                        values.iter().map(|(var, value)| format!("{} -> {}", var, value)),
                    )?;
                }
                Ok(())
            }
            OutputFormat::Json => EmitHelper::write_json(writer, &rows),
        }
    }
}
