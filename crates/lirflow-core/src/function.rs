use crate::block::BasicBlock;
use crate::types::{FunctionType, Type};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const ENTRY_BLOCK: &str = "entry";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Parameter>,
    pub ret: Option<Type>,
    pub locals: IndexMap<String, Type>,
    pub blocks: IndexMap<String, BasicBlock>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            ret: None,
            locals: IndexMap::new(),
            blocks: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> FunctionType {
        FunctionType {
            params: self.params.iter().map(|p| p.param_type.clone()).collect(),
            ret: self.ret.clone(),
        }
    }

    pub fn entry_block(&self) -> Option<&BasicBlock> {
        self.blocks.get(ENTRY_BLOCK)
    }

    pub fn get_block(&self, name: &str) -> Option<&BasicBlock> {
        self.blocks.get(name)
    }

    /// Returns the named block, creating an empty one if needed.
    pub fn block_mut(&mut self, name: &str) -> &mut BasicBlock {
        self.blocks
            .entry(name.to_string())
            .or_insert_with(|| BasicBlock::new(name))
    }

    pub fn add_local(&mut self, name: impl Into<String>, ty: Type) {
        self.locals.insert(name.into(), ty);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: Type,
}

impl Parameter {
    pub fn new(name: impl Into<String>, param_type: Type) -> Self {
        Self {
            name: name.into(),
            param_type,
        }
    }
}
