use super::{alias::AliasTable, cfg::ControlFlowGraph};
use crate::{
    function::Function,
    program::Program,
    types::Type,
    values::{Operand, Variable},
    IrError, Result,
};
use indexmap::IndexMap;
use tracing::debug;

/// Everything the engines need to analyze one function: the variable table
/// (globals, parameters, locals and fake heap cells), the alias table and
/// the CFG. Built once per run and read-only afterwards.
#[derive(Debug, Clone)]
pub struct AnalysisContext<'p> {
    program: &'p Program,
    function: &'p Function,
    variables: IndexMap<String, Variable>,
    aliases: AliasTable,
    cfg: ControlFlowGraph,
}

impl<'p> AnalysisContext<'p> {
    pub fn new(program: &'p Program, function_name: &str) -> Result<Self> {
        let function = program
            .get_function(function_name)
            .ok_or_else(|| IrError::FunctionNotFound(function_name.to_string()))?;
        if function.entry_block().is_none() {
            return Err(IrError::MissingEntryBlock(function_name.to_string()));
        }

        let mut variables = IndexMap::new();
        for (name, ty) in &program.globals {
            variables.insert(name.clone(), Variable::global(name, ty.clone()));
        }
        for param in &function.params {
            variables.insert(
                param.name.clone(),
                Variable::parameter(&param.name, param.param_type.clone()),
            );
        }
        for (name, ty) in &function.locals {
            variables.insert(name.clone(), Variable::local(name, ty.clone()));
        }

        let aliases = AliasTable::build(program, function, &mut variables);
        let cfg = ControlFlowGraph::from_function(function);

        debug!(
            function = function_name,
            variables = variables.len(),
            blocks = cfg.blocks.len(),
            "analysis context ready"
        );

        Ok(Self {
            program,
            function,
            variables,
            aliases,
            cfg,
        })
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn function(&self) -> &'p Function {
        self.function
    }

    pub fn variables(&self) -> &IndexMap<String, Variable> {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn type_of(&self, name: &str) -> Option<&Type> {
        self.variables.get(name).map(|v| &v.ty)
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn cfg(&self) -> &ControlFlowGraph {
        &self.cfg
    }

    /// Type of the cell written by `$store ptr value`: the value's type, `int`
    /// for a literal, or the pointee of `ptr` when the value is unknown.
    pub fn store_type(&self, ptr: &str, value: &Operand) -> Option<Type> {
        match value {
            Operand::Const(_) => Some(Type::Int),
            Operand::Var(name) => self
                .type_of(name)
                .or_else(|| self.type_of(ptr).and_then(Type::pointee))
                .cloned(),
        }
    }
}
