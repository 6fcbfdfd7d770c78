use crate::values::Operand;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A program point: one instruction occurrence.
///
/// Points are ordered by block name, then non-terminals by index, and the
/// block's terminal last.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgramPoint {
    NonTerminal { block: String, index: usize },
    Terminal { block: String },
}

impl ProgramPoint {
    pub fn at(block: impl Into<String>, index: usize) -> Self {
        ProgramPoint::NonTerminal {
            block: block.into(),
            index,
        }
    }

    pub fn terminal(block: impl Into<String>) -> Self {
        ProgramPoint::Terminal {
            block: block.into(),
        }
    }

    pub fn block(&self) -> &str {
        match self {
            ProgramPoint::NonTerminal { block, .. } | ProgramPoint::Terminal { block } => block,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgramPoint::Terminal { .. })
    }
}

impl Ord for ProgramPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.block().cmp(other.block()).then_with(|| match (self, other) {
            (
                ProgramPoint::NonTerminal { index: a, .. },
                ProgramPoint::NonTerminal { index: b, .. },
            ) => a.cmp(b),
            (ProgramPoint::NonTerminal { .. }, ProgramPoint::Terminal { .. }) => Ordering::Less,
            (ProgramPoint::Terminal { .. }, ProgramPoint::NonTerminal { .. }) => {
                Ordering::Greater
            }
            (ProgramPoint::Terminal { .. }, ProgramPoint::Terminal { .. }) => Ordering::Equal,
        })
    }
}

impl PartialOrd for ProgramPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Copy,
    Arith,
    Cmp,
    Gep,
    Gfp,
    Alloc,
    AddrOf,
    Load,
    Store,
    CallExt,
    CallDir,
    CallIdr,
    Jump,
    Branch,
    Ret,
}

impl Opcode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Opcode::Copy => "$copy",
            Opcode::Arith => "$arith",
            Opcode::Cmp => "$cmp",
            Opcode::Gep => "$gep",
            Opcode::Gfp => "$gfp",
            Opcode::Alloc => "$alloc",
            Opcode::AddrOf => "$addrof",
            Opcode::Load => "$load",
            Opcode::Store => "$store",
            Opcode::CallExt => "$call_ext",
            Opcode::CallDir => "$call_dir",
            Opcode::CallIdr => "$call_idr",
            Opcode::Jump => "$jump",
            Opcode::Branch => "$branch",
            Opcode::Ret => "$ret",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Self::Add),
            "sub" => Some(Self::Sub),
            "mul" => Some(Self::Mul),
            "div" => Some(Self::Div),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CmpOp {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Self::Eq),
            "neq" => Some(Self::Neq),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
        }
    }

    pub fn evaluate(&self, lhs: i32, rhs: i32) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Neq => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Lte => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Gte => lhs >= rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    /// `$call_ext`: a function declared outside the program.
    External,
    /// `$call_dir`: a function defined in the program.
    Direct,
    /// `$call_idr`: through a function pointer variable.
    Indirect,
}

impl CallKind {
    pub fn opcode(&self) -> Opcode {
        match self {
            CallKind::External => Opcode::CallExt,
            CallKind::Direct => Opcode::CallDir,
            CallKind::Indirect => Opcode::CallIdr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    pub dst: Option<String>,
    pub kind: CallKind,
    pub callee: String,
    pub args: Vec<Operand>,
    /// Continuation block of `... then <block>`.
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Copy {
        dst: String,
        src: Operand,
    },
    Arith {
        dst: String,
        op: ArithOp,
        lhs: Operand,
        rhs: Operand,
    },
    Cmp {
        dst: String,
        op: CmpOp,
        lhs: Operand,
        rhs: Operand,
    },
    Gep {
        dst: String,
        base: String,
        index: Operand,
    },
    Gfp {
        dst: String,
        base: String,
        field: String,
    },
    Alloc {
        dst: String,
        size: Operand,
        id: Option<String>,
    },
    AddrOf {
        dst: String,
        src: String,
    },
    Load {
        dst: String,
        src: String,
    },
    Store {
        dst: String,
        value: Operand,
    },
    Call(Call),
}

impl Operation {
    pub fn opcode(&self) -> Opcode {
        match self {
            Operation::Copy { .. } => Opcode::Copy,
            Operation::Arith { .. } => Opcode::Arith,
            Operation::Cmp { .. } => Opcode::Cmp,
            Operation::Gep { .. } => Opcode::Gep,
            Operation::Gfp { .. } => Opcode::Gfp,
            Operation::Alloc { .. } => Opcode::Alloc,
            Operation::AddrOf { .. } => Opcode::AddrOf,
            Operation::Load { .. } => Opcode::Load,
            Operation::Store { .. } => Opcode::Store,
            Operation::Call(call) => call.kind.opcode(),
        }
    }

    /// The variable this operation assigns by name. `$store` writes through
    /// a pointer and has none.
    pub fn def(&self) -> Option<&str> {
        match self {
            Operation::Copy { dst, .. }
            | Operation::Arith { dst, .. }
            | Operation::Cmp { dst, .. }
            | Operation::Gep { dst, .. }
            | Operation::Gfp { dst, .. }
            | Operation::Alloc { dst, .. }
            | Operation::AddrOf { dst, .. }
            | Operation::Load { dst, .. } => Some(dst),
            Operation::Store { .. } => None,
            Operation::Call(call) => call.dst.as_deref(),
        }
    }

    /// Names read by this operation, in operand order. `$addrof` does not
    /// read its source and `$gfp` field names are not variables.
    pub fn uses(&self) -> Vec<&str> {
        match self {
            Operation::Copy { src, .. } => src.as_var().into_iter().collect(),
            Operation::Arith { lhs, rhs, .. } | Operation::Cmp { lhs, rhs, .. } => {
                [lhs, rhs].into_iter().filter_map(Operand::as_var).collect()
            }
            Operation::Gep { base, index, .. } => std::iter::once(base.as_str())
                .chain(index.as_var())
                .collect(),
            Operation::Gfp { base, .. } => vec![base.as_str()],
            Operation::Alloc { size, .. } => size.as_var().into_iter().collect(),
            Operation::AddrOf { .. } => Vec::new(),
            Operation::Load { src, .. } => vec![src.as_str()],
            Operation::Store { dst, value } => std::iter::once(dst.as_str())
                .chain(value.as_var())
                .collect(),
            Operation::Call(call) => {
                let callee = match call.kind {
                    CallKind::Indirect => Some(call.callee.as_str()),
                    CallKind::External | CallKind::Direct => None,
                };
                callee
                    .into_iter()
                    .chain(call.args.iter().filter_map(Operand::as_var))
                    .collect()
            }
        }
    }

    pub fn successor(&self) -> Option<&str> {
        match self {
            Operation::Call(call) => call.next.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terminator {
    Jump(String),
    Branch {
        cond: Operand,
        then_block: String,
        else_block: String,
    },
    Ret(Option<Operand>),
}

impl Terminator {
    pub fn opcode(&self) -> Opcode {
        match self {
            Terminator::Jump(_) => Opcode::Jump,
            Terminator::Branch { .. } => Opcode::Branch,
            Terminator::Ret(_) => Opcode::Ret,
        }
    }

    pub fn successors(&self) -> Vec<&str> {
        match self {
            Terminator::Jump(target) => vec![target.as_str()],
            Terminator::Branch {
                then_block,
                else_block,
                ..
            } => vec![then_block.as_str(), else_block.as_str()],
            Terminator::Ret(_) => Vec::new(),
        }
    }

    pub fn uses(&self) -> Vec<&str> {
        match self {
            Terminator::Jump(_) => Vec::new(),
            Terminator::Branch { cond, .. } => cond.as_var().into_iter().collect(),
            Terminator::Ret(value) => value.iter().filter_map(Operand::as_var).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    NonTerminal {
        block: String,
        index: usize,
        op: Operation,
    },
    Terminal {
        block: String,
        term: Terminator,
    },
}

impl Instruction {
    pub fn point(&self) -> ProgramPoint {
        match self {
            Instruction::NonTerminal { block, index, .. } => ProgramPoint::at(block.clone(), *index),
            Instruction::Terminal { block, .. } => ProgramPoint::terminal(block.clone()),
        }
    }

    pub fn block(&self) -> &str {
        match self {
            Instruction::NonTerminal { block, .. } | Instruction::Terminal { block, .. } => block,
        }
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::NonTerminal { op, .. } => op.opcode(),
            Instruction::Terminal { term, .. } => term.opcode(),
        }
    }

    pub fn def(&self) -> Option<&str> {
        match self {
            Instruction::NonTerminal { op, .. } => op.def(),
            Instruction::Terminal { .. } => None,
        }
    }

    pub fn uses(&self) -> Vec<&str> {
        match self {
            Instruction::NonTerminal { op, .. } => op.uses(),
            Instruction::Terminal { term, .. } => term.uses(),
        }
    }

    /// Every name the instruction mentions as a variable, definition first.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.def().into_iter().collect();
        names.extend(self.uses());
        if let Instruction::NonTerminal {
            op: Operation::AddrOf { src, .. },
            ..
        } = self
        {
            names.push(src);
        }
        names
    }

    pub fn successors(&self) -> Vec<&str> {
        match self {
            Instruction::NonTerminal { op, .. } => op.successor().into_iter().collect(),
            Instruction::Terminal { term, .. } => term.successors(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Instruction::Terminal { .. })
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Instruction::NonTerminal {
                op: Operation::Call(call),
                ..
            } => Some(call),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_point_order() {
        let mut points = vec![
            ProgramPoint::terminal("entry"),
            ProgramPoint::at("bb1", 0),
            ProgramPoint::at("entry", 10),
            ProgramPoint::at("entry", 2),
        ];
        points.sort();
        assert_eq!(
            points,
            vec![
                ProgramPoint::at("bb1", 0),
                ProgramPoint::at("entry", 2),
                ProgramPoint::at("entry", 10),
                ProgramPoint::terminal("entry"),
            ]
        );
    }

    #[test]
    fn test_store_uses_pointer_and_value() {
        let op = Operation::Store {
            dst: "p".to_string(),
            value: Operand::var("v"),
        };
        assert_eq!(op.def(), None);
        assert_eq!(op.uses(), vec!["p", "v"]);
    }

    #[test]
    fn test_direct_call_does_not_use_callee() {
        let call = |kind| {
            Operation::Call(Call {
                dst: Some("r".to_string()),
                kind,
                callee: "f".to_string(),
                args: vec![Operand::var("a"), Operand::Const(1)],
                next: Some("bb2".to_string()),
            })
        };
        assert_eq!(call(CallKind::Direct).uses(), vec!["a"]);
        assert_eq!(call(CallKind::Indirect).uses(), vec!["f", "a"]);
        assert_eq!(call(CallKind::Direct).successor(), Some("bb2"));
        assert_eq!(call(CallKind::External).opcode(), Opcode::CallExt);
    }

    #[test]
    fn test_addrof_mentions_source_but_does_not_read_it() {
        let inst = Instruction::NonTerminal {
            block: "entry".to_string(),
            index: 0,
            op: Operation::AddrOf {
                dst: "p".to_string(),
                src: "x".to_string(),
            },
        };
        assert!(inst.uses().is_empty());
        assert_eq!(inst.variables(), vec!["p", "x"]);
    }
}
