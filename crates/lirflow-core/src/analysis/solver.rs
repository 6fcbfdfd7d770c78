use super::{context::AnalysisContext, lattice::JoinSemiLattice};
use crate::{block::BasicBlock, instructions::Instruction};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// A forward dataflow problem over one function's CFG.
pub trait ForwardAnalysis {
    type State: JoinSemiLattice + std::fmt::Debug;

    fn name(&self) -> &'static str;

    /// State on entry to the `entry` block.
    fn entry_state(&self, ctx: &AnalysisContext<'_>) -> Self::State;

    fn transfer(&self, ctx: &AnalysisContext<'_>, inst: &Instruction, state: &mut Self::State);

    fn transfer_block(
        &self,
        ctx: &AnalysisContext<'_>,
        block: &BasicBlock,
        state: &mut Self::State,
    ) {
        for inst in &block.instructions {
            self.transfer(ctx, inst, state);
        }
    }
}

/// Block entry and exit states at the fixpoint. Blocks the worklist never
/// reached have no entry.
#[derive(Debug, Clone)]
pub struct Fixpoint<S> {
    pub pre: BTreeMap<String, S>,
    pub post: BTreeMap<String, S>,
    pub visits: usize,
}

impl<S> Fixpoint<S> {
    pub fn entry_of(&self, block: &str) -> Option<&S> {
        self.pre.get(block)
    }

    pub fn exit_of(&self, block: &str) -> Option<&S> {
        self.post.get(block)
    }
}

/// Runs `analysis` to a fixpoint with a worklist of block names.
///
/// The smallest queued name is popped first, which makes every run visit
/// blocks in the same order.
pub fn solve<A: ForwardAnalysis>(analysis: &A, ctx: &AnalysisContext<'_>) -> Fixpoint<A::State> {
    let cfg = ctx.cfg();
    let mut pre: BTreeMap<String, A::State> = BTreeMap::new();
    let mut post: BTreeMap<String, A::State> = BTreeMap::new();
    let mut worklist: BTreeSet<String> = BTreeSet::new();
    let mut visits = 0;

    pre.insert(cfg.entry.clone(), analysis.entry_state(ctx));
    worklist.insert(cfg.entry.clone());

    while let Some(name) = worklist.pop_first() {
        let Some(block) = ctx.function().get_block(&name) else {
            continue;
        };
        visits += 1;
        debug!(analysis = analysis.name(), block = %name, visits, "worklist step");

        let mut state = pre[&name].clone();
        analysis.transfer_block(ctx, block, &mut state);

        for succ in cfg.successors(&name) {
            let changed = match pre.get_mut(succ) {
                Some(existing) => existing.join_assign(&state),
                None => {
                    pre.insert(succ.clone(), state.clone());
                    true
                }
            };
            if changed {
                trace!(analysis = analysis.name(), from = %name, to = %succ, "successor grew");
                worklist.insert(succ.clone());
            }
        }

        post.insert(name, state);
    }

    debug!(analysis = analysis.name(), visits, "fixpoint reached");
    Fixpoint { pre, post, visits }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;
    use crate::program::Program;

    /// Collects the names of blocks on some path to each block.
    struct Paths;

    impl ForwardAnalysis for Paths {
        type State = BTreeSet<String>;

        fn name(&self) -> &'static str {
            "paths"
        }

        fn entry_state(&self, _ctx: &AnalysisContext<'_>) -> Self::State {
            BTreeSet::new()
        }

        fn transfer(&self, _ctx: &AnalysisContext<'_>, inst: &Instruction, state: &mut Self::State) {
            if inst.is_terminal() {
                state.insert(inst.block().to_string());
            }
        }
    }

    #[test]
    fn test_loop_reaches_fixpoint() {
        let mut builder = FunctionBuilder::new("test");
        builder.entry_block().jump("header");
        builder.block("header").branch("c", "body", "exit");
        builder.block("body").jump("header");
        builder.block("exit").ret(None);
        builder.block("dead").jump("exit");
        let mut program = Program::new();
        program.add_function(builder.build().unwrap());
        let ctx = AnalysisContext::new(&program, "test").unwrap();

        let result = solve(&Paths, &ctx);

        let header: Vec<&str> = result.entry_of("header").unwrap().iter().map(String::as_str).collect();
        assert_eq!(header, vec!["body", "entry", "header"]);
        let exit: Vec<&str> = result.exit_of("exit").unwrap().iter().map(String::as_str).collect();
        assert_eq!(exit, vec!["body", "entry", "exit", "header"]);
        assert!(result.entry_of("dead").is_none());
        assert!(result.visits >= 5);
    }
}
