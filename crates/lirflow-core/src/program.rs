use crate::function::Function;
use crate::types::{FunctionType, StructDef, Type};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Everything one LIR file declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub structs: IndexMap<String, StructDef>,
    pub globals: IndexMap<String, Type>,
    pub externs: IndexMap<String, FunctionType>,
    pub functions: IndexMap<String, Function>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_struct(&mut self, def: StructDef) {
        self.structs.insert(def.name.clone(), def);
    }

    pub fn add_global(&mut self, name: impl Into<String>, ty: Type) {
        self.globals.insert(name.into(), ty);
    }

    pub fn add_extern(&mut self, name: impl Into<String>, sig: FunctionType) {
        self.externs.insert(name.into(), sig);
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.insert(function.name.clone(), function);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn get_struct(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name)
    }

    /// Declared signature of a function defined in the program or declared
    /// `extern`. Function-typed globals count too.
    pub fn signature(&self, name: &str) -> Option<FunctionType> {
        if let Some(function) = self.functions.get(name) {
            return Some(function.signature());
        }
        if let Some(sig) = self.externs.get(name) {
            return Some(sig.clone());
        }
        self.globals
            .get(name)
            .and_then(Type::as_function)
            .cloned()
    }
}
