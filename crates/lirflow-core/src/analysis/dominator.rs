use super::cfg::ControlFlowGraph;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Dominator sets, immediate dominators and dominance frontiers of one CFG.
///
/// Unreachable blocks dominate only themselves, have an empty frontier and
/// are never counted as predecessors.
#[derive(Debug, Clone)]
pub struct DominatorTree {
    doms: BTreeMap<String, BTreeSet<String>>,
    idom: BTreeMap<String, String>,
    children: BTreeMap<String, Vec<String>>,
    frontiers: BTreeMap<String, BTreeSet<String>>,
}

impl DominatorTree {
    pub fn build(cfg: &ControlFlowGraph) -> Self {
        let blocks = cfg.reverse_postorder();
        let reachable: BTreeSet<String> = blocks.iter().cloned().collect();
        let mut doms: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        if let Some(entry) = blocks.first() {
            doms.insert(entry.clone(), BTreeSet::from([entry.clone()]));
        }
        for block in blocks.iter().skip(1) {
            doms.insert(block.clone(), reachable.clone());
        }

        let mut changed = true;
        let mut rounds = 0;
        while changed {
            changed = false;
            rounds += 1;

            for block in blocks.iter().skip(1) {
                let mut new_dom: Option<BTreeSet<String>> = None;
                for pred in cfg.predecessors(block) {
                    let Some(pred_dom) = doms.get(pred) else {
                        continue;
                    };
                    new_dom = Some(match new_dom {
                        Some(acc) => acc.intersection(pred_dom).cloned().collect(),
                        None => pred_dom.clone(),
                    });
                }

                let mut new_dom = new_dom.unwrap_or_default();
                new_dom.insert(block.clone());

                if doms[block] != new_dom {
                    doms.insert(block.clone(), new_dom);
                    changed = true;
                }
            }
        }
        debug!(blocks = blocks.len(), rounds, "dominator sets converged");

        for block in &cfg.blocks {
            doms.entry(block.clone())
                .or_insert_with(|| BTreeSet::from([block.clone()]));
        }

        let mut idom = BTreeMap::new();
        let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for block in &reachable {
            let strict = doms[block].iter().filter(|d| *d != block);
            // The closest strict dominator is the one dominated by all the others.
            if let Some(parent) = strict.max_by_key(|d| doms[*d].len()) {
                idom.insert(block.clone(), parent.clone());
                children.entry(parent.clone()).or_default().push(block.clone());
            }
        }

        let mut frontiers: BTreeMap<String, BTreeSet<String>> = cfg
            .blocks
            .iter()
            .map(|block| (block.clone(), BTreeSet::new()))
            .collect();
        for join in &blocks {
            for pred in cfg.predecessors(join) {
                if !reachable.contains(pred) {
                    continue;
                }
                for runner in &doms[pred] {
                    if runner == join || !doms[join].contains(runner) {
                        if let Some(frontier) = frontiers.get_mut(runner) {
                            frontier.insert(join.clone());
                        }
                    }
                }
            }
        }

        Self {
            doms,
            idom,
            children,
            frontiers,
        }
    }

    pub fn dominators(&self, block: &str) -> Option<&BTreeSet<String>> {
        self.doms.get(block)
    }

    pub fn frontier(&self, block: &str) -> Option<&BTreeSet<String>> {
        self.frontiers.get(block)
    }

    pub fn all_dominators(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.doms
    }

    pub fn all_frontiers(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.frontiers
    }

    pub fn dominates(&self, dominator: &str, dominated: &str) -> bool {
        self.doms
            .get(dominated)
            .is_some_and(|set| set.contains(dominator))
    }

    pub fn strictly_dominates(&self, dominator: &str, dominated: &str) -> bool {
        dominator != dominated && self.dominates(dominator, dominated)
    }

    pub fn idom(&self, block: &str) -> Option<&str> {
        self.idom.get(block).map(String::as_str)
    }

    pub fn children(&self, block: &str) -> &[String] {
        self.children
            .get(block)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;
    use pretty_assertions::assert_eq;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn diamond() -> DominatorTree {
        let mut builder = FunctionBuilder::new("test");
        builder.entry_block().branch("c", "bb1", "bb2");
        builder.block("bb1").jump("bb3");
        builder.block("bb2").jump("bb3");
        builder.block("bb3").ret(None);
        DominatorTree::build(&ControlFlowGraph::from_function(&builder.build().unwrap()))
    }

    #[test]
    fn test_diamond_dominance() {
        let tree = diamond();
        assert_eq!(tree.dominators("entry"), Some(&set(&["entry"])));
        assert_eq!(tree.dominators("bb3"), Some(&set(&["entry", "bb3"])));
        assert_eq!(tree.idom("bb3"), Some("entry"));
        assert_eq!(tree.idom("entry"), None);
        assert_eq!(tree.children("entry"), ["bb1", "bb2", "bb3"].map(String::from));
        assert!(tree.strictly_dominates("entry", "bb1"));
        assert!(!tree.strictly_dominates("bb1", "bb1"));
        assert!(!tree.dominates("bb1", "bb3"));
    }

    #[test]
    fn test_diamond_frontier() {
        let tree = diamond();
        assert_eq!(tree.frontier("bb1"), Some(&set(&["bb3"])));
        assert_eq!(tree.frontier("bb2"), Some(&set(&["bb3"])));
        assert_eq!(tree.frontier("entry"), Some(&set(&[])));
        assert_eq!(tree.frontier("bb3"), Some(&set(&[])));
    }

    #[test]
    fn test_loop_header_is_in_its_own_frontier() {
        let mut builder = FunctionBuilder::new("test");
        builder.entry_block().jump("header");
        builder.block("header").branch("c", "body", "exit");
        builder.block("body").jump("header");
        builder.block("exit").ret(None);
        let tree =
            DominatorTree::build(&ControlFlowGraph::from_function(&builder.build().unwrap()));

        assert_eq!(tree.frontier("header"), Some(&set(&["header"])));
        assert_eq!(tree.frontier("body"), Some(&set(&["header"])));
        assert_eq!(tree.frontier("exit"), Some(&set(&[])));
        assert_eq!(tree.dominators("body"), Some(&set(&["entry", "header", "body"])));
        assert_eq!(tree.idom("exit"), Some("header"));
    }

    #[test]
    fn test_unreachable_block() {
        let mut builder = FunctionBuilder::new("test");
        builder.entry_block().jump("bb1");
        builder.block("bb1").ret(None);
        builder.block("dead").jump("bb1");
        let tree =
            DominatorTree::build(&ControlFlowGraph::from_function(&builder.build().unwrap()));

        assert_eq!(tree.dominators("dead"), Some(&set(&["dead"])));
        assert_eq!(tree.frontier("dead"), Some(&set(&[])));
        assert_eq!(tree.dominators("bb1"), Some(&set(&["entry", "bb1"])));
        assert_eq!(tree.idom("dead"), None);
    }
}
