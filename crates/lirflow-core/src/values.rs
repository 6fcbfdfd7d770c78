use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An instruction operand as written in the source: either an integer
/// literal or a name. Names are not resolved here; a name that is not in the
/// analysis' variable table is treated as external.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operand {
    Const(i32),
    Var(String),
}

impl Operand {
    pub fn var(name: impl Into<String>) -> Self {
        Operand::Var(name.into())
    }

    pub fn as_var(&self) -> Option<&str> {
        match self {
            Operand::Var(name) => Some(name),
            Operand::Const(_) => None,
        }
    }

    pub fn as_const(&self) -> Option<i32> {
        match self {
            Operand::Const(value) => Some(*value),
            Operand::Var(_) => None,
        }
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Const(value)
    }
}

impl From<&str> for Operand {
    fn from(name: &str) -> Self {
        Operand::Var(name.to_string())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Const(value) => write!(f, "{}", value),
            Operand::Var(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointsTo {
    /// Only the declared pointee type is known.
    Type(Type),
    /// Address of a named variable, from `$addrof`.
    Variable(String),
    /// A synthetic heap cell, from `$alloc` or a caller-provided pointer.
    FakeCell(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKind {
    Local,
    Parameter,
    Global,
    FakeHeap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
    pub kind: VariableKind,
    pub points_to: Option<PointsTo>,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Type, kind: VariableKind) -> Self {
        let points_to = ty.pointee().cloned().map(PointsTo::Type);
        Self {
            name: name.into(),
            ty,
            kind,
            points_to,
        }
    }

    pub fn local(name: impl Into<String>, ty: Type) -> Self {
        Self::new(name, ty, VariableKind::Local)
    }

    pub fn parameter(name: impl Into<String>, ty: Type) -> Self {
        Self::new(name, ty, VariableKind::Parameter)
    }

    pub fn global(name: impl Into<String>, ty: Type) -> Self {
        Self::new(name, ty, VariableKind::Global)
    }

    pub fn fake_heap(ty: Type) -> Self {
        Self::new(fake_cell_name(&ty), ty, VariableKind::FakeHeap)
    }

    pub fn is_global(&self) -> bool {
        self.kind == VariableKind::Global
    }

    pub fn is_parameter(&self) -> bool {
        self.kind == VariableKind::Parameter
    }

    pub fn is_fake(&self) -> bool {
        self.kind == VariableKind::FakeHeap
    }
}

pub fn fake_cell_name(ty: &Type) -> String {
    format!("fake_{}", ty.mangled())
}
