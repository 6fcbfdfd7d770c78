use crate::instructions::{Instruction, Operation, ProgramPoint, Terminator};
use crate::{IrError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub name: String,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
        }
    }

    /// Appends a non-terminal and returns its program point.
    pub fn add_operation(&mut self, op: Operation) -> Result<ProgramPoint> {
        if self.is_terminated() {
            return Err(IrError::InvalidInstruction(format!(
                "block {} already has a terminator",
                self.name
            )));
        }
        let index = self
            .instructions
            .iter()
            .filter(|inst| !inst.is_terminal())
            .count();
        self.instructions.push(Instruction::NonTerminal {
            block: self.name.clone(),
            index,
            op,
        });
        Ok(ProgramPoint::at(self.name.clone(), index))
    }

    pub fn set_terminator(&mut self, term: Terminator) -> Result<ProgramPoint> {
        if self.is_terminated() {
            return Err(IrError::InvalidInstruction(format!(
                "block {} already has a terminator",
                self.name
            )));
        }
        self.instructions.push(Instruction::Terminal {
            block: self.name.clone(),
            term,
        });
        Ok(ProgramPoint::terminal(self.name.clone()))
    }

    pub fn is_terminated(&self) -> bool {
        self.instructions.last().is_some_and(Instruction::is_terminal)
    }

    pub fn terminator(&self) -> Option<&Terminator> {
        match self.instructions.last() {
            Some(Instruction::Terminal { term, .. }) => Some(term),
            _ => None,
        }
    }

    /// Successor block names in edge order: `then` continuations of calls
    /// first, then the terminator's targets. Duplicates are dropped.
    pub fn successors(&self) -> Vec<String> {
        let mut succs: Vec<String> = Vec::new();
        for inst in &self.instructions {
            for succ in inst.successors() {
                if !succs.iter().any(|s| s == succ) {
                    succs.push(succ.to_string());
                }
            }
        }
        succs
    }

    pub fn get(&self, point: &ProgramPoint) -> Option<&Instruction> {
        self.instructions.iter().find(|inst| &inst.point() == point)
    }
}
