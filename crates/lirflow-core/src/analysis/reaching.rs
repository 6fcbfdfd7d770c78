use super::{
    context::AnalysisContext,
    lattice::JoinSemiLattice,
    solver::{solve, Fixpoint, ForwardAnalysis},
};
use crate::{
    instructions::{Instruction, Operation, ProgramPoint},
    types::Type,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// Which program points may have last defined each variable.
///
/// A variable missing from the map is unknown to the analysis; one mapped to
/// the empty set is known but not yet defined on any path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachState(BTreeMap<String, BTreeSet<ProgramPoint>>);

impl ReachState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: impl Into<String>) {
        self.0.entry(name.into()).or_default();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn defs(&self, name: &str) -> Option<&BTreeSet<ProgramPoint>> {
        self.0.get(name)
    }

    /// Replaces the definitions of `name` with `point` alone.
    pub fn strong_update(&mut self, name: &str, point: &ProgramPoint) {
        self.0
            .insert(name.to_string(), BTreeSet::from([point.clone()]));
    }

    /// Adds `point` to the definitions of `name` if the variable is known.
    pub fn weak_update(&mut self, name: &str, point: &ProgramPoint) -> bool {
        match self.0.get_mut(name) {
            Some(defs) => defs.insert(point.clone()),
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<ProgramPoint>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl JoinSemiLattice for ReachState {
    fn join(&self, other: &Self) -> Self {
        Self(self.0.join(&other.0))
    }

    fn join_assign(&mut self, other: &Self) -> bool {
        self.0.join_assign(&other.0)
    }
}

/// Reaching definitions with type-based handling of indirect writes.
pub struct ReachingDefinitionsAnalysis;

impl ForwardAnalysis for ReachingDefinitionsAnalysis {
    type State = ReachState;

    fn name(&self) -> &'static str {
        "reaching-definitions"
    }

    fn entry_state(&self, ctx: &AnalysisContext<'_>) -> ReachState {
        let mut state = ReachState::new();
        for name in ctx.variables().keys() {
            state.declare(name.as_str());
        }
        state
    }

    fn transfer(&self, ctx: &AnalysisContext<'_>, inst: &Instruction, state: &mut ReachState) {
        let Instruction::NonTerminal { op, .. } = inst else {
            return;
        };
        let point = inst.point();

        match op {
            Operation::Store { dst, value } => {
                if let Some(ty) = ctx.store_type(dst, value) {
                    for member in ctx.aliases().members(&ty) {
                        state.weak_update(member, &point);
                    }
                }
            }
            Operation::Call(call) => {
                for clobbered in ctx.aliases().call_clobbers(&point) {
                    state.weak_update(clobbered, &point);
                }
                if let Some(dst) = &call.dst {
                    state.strong_update(dst, &point);
                }
            }
            _ => {
                if let Some(dst) = op.def() {
                    state.strong_update(dst, &point);
                }
            }
        }
        trace!(point = %point, "transfer {}", op.opcode().as_str());
    }
}

/// Definitions that may reach each read, plus the state before and after
/// every program point.
#[derive(Debug, Clone)]
pub struct ReachingDefinitions {
    fixpoint: Fixpoint<ReachState>,
    before: BTreeMap<ProgramPoint, ReachState>,
    after: BTreeMap<ProgramPoint, ReachState>,
    solution: BTreeMap<ProgramPoint, BTreeSet<ProgramPoint>>,
}

impl ReachingDefinitions {
    pub fn compute(ctx: &AnalysisContext<'_>) -> Self {
        let analysis = ReachingDefinitionsAnalysis;
        let fixpoint = solve(&analysis, ctx);

        let mut before = BTreeMap::new();
        let mut after = BTreeMap::new();
        let mut solution = BTreeMap::new();

        for (name, block) in &ctx.function().blocks {
            let Some(entry) = fixpoint.entry_of(name) else {
                continue;
            };
            let mut state = entry.clone();
            for inst in &block.instructions {
                let point = inst.point();
                solution.insert(point.clone(), used_definitions(ctx, inst, &state));
                before.insert(point.clone(), state.clone());
                analysis.transfer(ctx, inst, &mut state);
                after.insert(point, state.clone());
            }
        }

        debug!(
            points = solution.len(),
            visits = fixpoint.visits,
            "reaching definitions computed"
        );

        Self {
            fixpoint,
            before,
            after,
            solution,
        }
    }

    /// Definitions that may reach the reads of the instruction at `point`.
    pub fn at(&self, point: &ProgramPoint) -> Option<&BTreeSet<ProgramPoint>> {
        self.solution.get(point)
    }

    pub fn solution(&self) -> &BTreeMap<ProgramPoint, BTreeSet<ProgramPoint>> {
        &self.solution
    }

    pub fn before(&self, point: &ProgramPoint) -> Option<&ReachState> {
        self.before.get(point)
    }

    pub fn after(&self, point: &ProgramPoint) -> Option<&ReachState> {
        self.after.get(point)
    }

    /// Definitions of `var` reaching `point`, before it executes.
    pub fn reaching(&self, point: &ProgramPoint, var: &str) -> BTreeSet<ProgramPoint> {
        self.before
            .get(point)
            .and_then(|state| state.defs(var))
            .cloned()
            .unwrap_or_default()
    }

    /// Definitions of `var` right after `point` executes.
    pub fn reaching_after(&self, point: &ProgramPoint, var: &str) -> BTreeSet<ProgramPoint> {
        self.after
            .get(point)
            .and_then(|state| state.defs(var))
            .cloned()
            .unwrap_or_default()
    }

    pub fn fixpoint(&self) -> &Fixpoint<ReachState> {
        &self.fixpoint
    }
}

fn used_definitions(
    ctx: &AnalysisContext<'_>,
    inst: &Instruction,
    state: &ReachState,
) -> BTreeSet<ProgramPoint> {
    let mut names: Vec<&str> = inst.uses();

    if let Instruction::NonTerminal { op, .. } = inst {
        match op {
            Operation::Load { dst, src } => {
                let loaded = ctx
                    .type_of(dst)
                    .or_else(|| ctx.type_of(src).and_then(Type::pointee));
                if let Some(ty) = loaded {
                    names.extend(ctx.aliases().members(ty));
                }
            }
            Operation::AddrOf { dst, .. } => names.push(dst),
            _ => {}
        }
    }

    names
        .into_iter()
        .filter_map(|name| state.defs(name))
        .flatten()
        .cloned()
        .collect()
}
