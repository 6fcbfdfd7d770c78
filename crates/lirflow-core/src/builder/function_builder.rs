use super::BlockBuilder;
use crate::{
    function::{Function, Parameter},
    types::Type,
    IrError, Result,
};

/// Builds a [`Function`] in memory, block by block.
///
/// Instruction errors (anything added after a block's terminator) are
/// collected and reported by [`FunctionBuilder::build`], so block calls can
/// be chained freely.
pub struct FunctionBuilder {
    function: Function,
    errors: Vec<IrError>,
}

impl FunctionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            function: Function::new(name),
            errors: Vec::new(),
        }
    }

    pub fn param(&mut self, name: &str, ty: Type) -> &mut Self {
        self.function.params.push(Parameter::new(name, ty));
        self
    }

    pub fn returns(&mut self, ty: Type) -> &mut Self {
        self.function.ret = Some(ty);
        self
    }

    pub fn local(&mut self, name: &str, ty: Type) -> &mut Self {
        self.function.add_local(name, ty);
        self
    }

    pub fn entry_block(&mut self) -> BlockBuilder<'_> {
        self.block(crate::function::ENTRY_BLOCK)
    }

    /// Positions at the named block, creating it on first use.
    pub fn block(&mut self, name: &str) -> BlockBuilder<'_> {
        self.function.block_mut(name);
        BlockBuilder::new(self, name)
    }

    pub(super) fn function_mut(&mut self) -> &mut Function {
        &mut self.function
    }

    pub(super) fn record_error(&mut self, error: IrError) {
        self.errors.push(error);
    }

    pub fn build(mut self) -> Result<Function> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }
        if self.function.entry_block().is_none() {
            return Err(IrError::MissingEntryBlock(self.function.name.clone()));
        }
        Ok(self.function)
    }
}
