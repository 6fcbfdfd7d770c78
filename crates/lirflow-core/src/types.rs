use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
    Int,
    Struct(String),
    Pointer(Box<Type>),
    Function(Box<FunctionType>),
}

impl Type {
    pub fn pointer(pointee: Type) -> Self {
        Type::Pointer(Box::new(pointee))
    }

    pub fn function(params: Vec<Type>, ret: Option<Type>) -> Self {
        Type::Function(Box::new(FunctionType { params, ret }))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Function types and any chain of pointers ending in one. These never
    /// name a memory cell.
    pub fn is_function_like(&self) -> bool {
        match self {
            Type::Function(_) => true,
            Type::Pointer(inner) => inner.is_function_like(),
            Type::Int | Type::Struct(_) => false,
        }
    }

    /// Signature of a callee whose declared type is this one, looking
    /// through function pointers.
    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(sig) => Some(sig),
            Type::Pointer(inner) => inner.as_function(),
            Type::Int | Type::Struct(_) => None,
        }
    }

    /// Identifier-safe spelling, used to name fake heap cells.
    pub fn mangled(&self) -> String {
        match self {
            Type::Int => "int".to_string(),
            Type::Struct(name) => name.clone(),
            Type::Pointer(inner) => format!("ptr_{}", inner.mangled()),
            Type::Function(sig) => {
                let params: Vec<String> = sig.params.iter().map(Type::mangled).collect();
                let ret = sig
                    .ret
                    .as_ref()
                    .map(Type::mangled)
                    .unwrap_or_else(|| "void".to_string());
                format!("fn_{}_to_{}", params.join("_"), ret)
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Struct(name) => write!(f, "{}", name),
            Type::Pointer(inner) => write!(f, "&{}", inner),
            Type::Function(sig) => write!(f, "{}", sig),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Option<Type>,
}

impl FunctionType {
    /// Pointee types of the pointer-typed parameters.
    pub fn pointer_params(&self) -> impl Iterator<Item = &Type> {
        self.params.iter().filter_map(Type::pointee)
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        match &self.ret {
            Some(ret) => write!(f, "({}) -> {}", params.join(", "), ret),
            None => write!(f, "({}) -> _", params.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    pub fields: IndexMap<String, Type>,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.fields.insert(name.into(), ty);
        self
    }

    pub fn field_types(&self) -> impl Iterator<Item = &Type> {
        self.fields.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let node = Type::Struct("Node".to_string());
        assert_eq!(Type::pointer(node.clone()).to_string(), "&Node");
        assert_eq!(
            Type::function(vec![Type::Int, Type::pointer(Type::Int)], None).to_string(),
            "(int, &int) -> _"
        );
        assert_eq!(
            Type::pointer(Type::function(vec![], Some(Type::Int))).to_string(),
            "&() -> int"
        );
    }

    #[test]
    fn test_function_like() {
        let fp = Type::pointer(Type::function(vec![Type::Int], Some(Type::Int)));
        assert!(fp.is_function_like());
        assert!(Type::pointer(fp.clone()).is_function_like());
        assert!(!Type::pointer(Type::Int).is_function_like());
        assert_eq!(fp.as_function().map(|sig| sig.params.len()), Some(1));
    }

    #[test]
    fn test_mangled_names_are_distinct() {
        let int = Type::Int;
        let ptr = Type::pointer(Type::Int);
        let ptr_ptr = Type::pointer(ptr.clone());
        assert_eq!(int.mangled(), "int");
        assert_eq!(ptr.mangled(), "ptr_int");
        assert_eq!(ptr_ptr.mangled(), "ptr_ptr_int");
    }
}
