use super::{
    context::AnalysisContext,
    lattice::JoinSemiLattice,
    solver::{solve, Fixpoint, ForwardAnalysis},
};
use crate::{
    instructions::{ArithOp, Instruction, Operation},
    types::Type,
    values::{Operand, VariableKind},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace};

/// Flat integer lattice: `Bottom` below every constant, `Top` above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstValue {
    Bottom,
    Const(i32),
    Top,
}

impl JoinSemiLattice for ConstValue {
    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (ConstValue::Bottom, v) | (v, ConstValue::Bottom) => *v,
            (ConstValue::Const(a), ConstValue::Const(b)) if a == b => *self,
            _ => ConstValue::Top,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bottom => write!(f, "Bottom"),
            ConstValue::Const(value) => write!(f, "{}", value),
            ConstValue::Top => write!(f, "Top"),
        }
    }
}

impl ConstValue {
    pub fn as_const(&self) -> Option<i32> {
        match self {
            ConstValue::Const(value) => Some(*value),
            _ => None,
        }
    }

    /// Folds `lhs op rhs` with 32-bit wrapping arithmetic. Division by zero
    /// cannot be determined and yields `Bottom`.
    pub fn arith(op: ArithOp, lhs: Self, rhs: Self) -> Self {
        use ConstValue::*;

        if lhs == Bottom || rhs == Bottom {
            return Bottom;
        }
        match op {
            ArithOp::Mul if lhs == Const(0) || rhs == Const(0) => return Const(0),
            ArithOp::Div if rhs == Const(0) => return Bottom,
            ArithOp::Div if lhs == Const(0) => return Const(0),
            _ => {}
        }
        match (lhs, rhs) {
            (Const(a), Const(b)) => Const(match op {
                ArithOp::Add => a.wrapping_add(b),
                ArithOp::Sub => a.wrapping_sub(b),
                ArithOp::Mul => a.wrapping_mul(b),
                ArithOp::Div => a.wrapping_div(b),
            }),
            _ => Top,
        }
    }
}

pub type ConstState = BTreeMap<String, ConstValue>;

/// Intraprocedural constant propagation over `int` variables.
pub struct ConstantPropagation;

impl ConstantPropagation {
    fn tracks(ctx: &AnalysisContext<'_>, name: &str) -> bool {
        ctx.type_of(name).map_or(true, Type::is_int)
    }

    fn value_of(state: &ConstState, operand: &Operand) -> ConstValue {
        match operand {
            Operand::Const(value) => ConstValue::Const(*value),
            Operand::Var(name) => state.get(name).copied().unwrap_or(ConstValue::Top),
        }
    }
}

impl ForwardAnalysis for ConstantPropagation {
    type State = ConstState;

    fn name(&self) -> &'static str {
        "constants"
    }

    fn entry_state(&self, ctx: &AnalysisContext<'_>) -> ConstState {
        ctx.variables()
            .values()
            .filter(|var| var.ty.is_int())
            .map(|var| {
                let value = match var.kind {
                    VariableKind::Local => ConstValue::Bottom,
                    VariableKind::Parameter | VariableKind::Global | VariableKind::FakeHeap => {
                        ConstValue::Top
                    }
                };
                (var.name.clone(), value)
            })
            .collect()
    }

    fn transfer(&self, ctx: &AnalysisContext<'_>, inst: &Instruction, state: &mut ConstState) {
        let Instruction::NonTerminal { op, .. } = inst else {
            return;
        };

        let (dst, value) = match op {
            Operation::Copy { dst, src } => {
                if src.as_var().is_some_and(|name| !state.contains_key(name))
                    && ctx.type_of(dst).is_none()
                {
                    return;
                }
                (dst, Self::value_of(state, src))
            }
            Operation::Arith { dst, op, lhs, rhs } => (
                dst,
                ConstValue::arith(*op, Self::value_of(state, lhs), Self::value_of(state, rhs)),
            ),
            Operation::Cmp { dst, op, lhs, rhs } => {
                let value = match (Self::value_of(state, lhs), Self::value_of(state, rhs)) {
                    (ConstValue::Bottom, _) | (_, ConstValue::Bottom) => ConstValue::Bottom,
                    (ConstValue::Const(a), ConstValue::Const(b)) => {
                        ConstValue::Const(op.evaluate(a, b) as i32)
                    }
                    _ => ConstValue::Top,
                };
                (dst, value)
            }
            Operation::Load { dst, .. } => (dst, ConstValue::Top),
            Operation::Store { dst, value } => {
                if ctx.store_type(dst, value) == Some(Type::Int) {
                    let stored = Self::value_of(state, value);
                    for member in ctx.aliases().members(&Type::Int) {
                        if let Some(current) = state.get_mut(member) {
                            *current = current.join(&stored);
                        }
                    }
                }
                return;
            }
            Operation::Call(call) => {
                let point = inst.point();
                for clobbered in ctx.aliases().call_clobbers(&point) {
                    if let Some(current) = state.get_mut(clobbered) {
                        *current = ConstValue::Top;
                    }
                }
                match &call.dst {
                    Some(dst) => (dst, ConstValue::Top),
                    None => return,
                }
            }
            Operation::Gep { .. }
            | Operation::Gfp { .. }
            | Operation::Alloc { .. }
            | Operation::AddrOf { .. } => return,
        };

        if Self::tracks(ctx, dst) {
            trace!(point = %inst.point(), var = %dst, value = %value, "constant");
            state.insert(dst.clone(), value);
        }
    }
}

/// Constant propagation result for one function.
#[derive(Debug, Clone)]
pub struct Constants {
    fixpoint: Fixpoint<ConstState>,
    mentioned: BTreeMap<String, Vec<String>>,
}

impl Constants {
    pub fn compute(ctx: &AnalysisContext<'_>) -> Self {
        let fixpoint = solve(&ConstantPropagation, ctx);

        let mentioned = ctx
            .function()
            .blocks
            .iter()
            .map(|(name, block)| {
                let mut vars: Vec<String> = block
                    .instructions
                    .iter()
                    .flat_map(Instruction::variables)
                    .map(str::to_string)
                    .collect();
                vars.sort();
                vars.dedup();
                (name.clone(), vars)
            })
            .collect();

        debug!(visits = fixpoint.visits, "constants computed");
        Self { fixpoint, mentioned }
    }

    pub fn exit_value(&self, block: &str, var: &str) -> Option<ConstValue> {
        self.fixpoint.exit_of(block)?.get(var).copied()
    }

    pub fn entry_value(&self, block: &str, var: &str) -> Option<ConstValue> {
        self.fixpoint.entry_of(block)?.get(var).copied()
    }

    /// Exit values of the `int` variables each block mentions, leaving out
    /// those that are still `Bottom`.
    pub fn block_values(&self) -> BTreeMap<String, BTreeMap<String, ConstValue>> {
        let mut result = BTreeMap::new();
        for (block, exit) in &self.fixpoint.post {
            let values: BTreeMap<String, ConstValue> = self
                .mentioned
                .get(block)
                .into_iter()
                .flatten()
                .filter_map(|var| {
                    exit.get(var)
                        .filter(|value| **value != ConstValue::Bottom)
                        .map(|value| (var.clone(), *value))
                })
                .collect();
            result.insert(block.clone(), values);
        }
        result
    }

    pub fn fixpoint(&self) -> &Fixpoint<ConstState> {
        &self.fixpoint
    }
}
