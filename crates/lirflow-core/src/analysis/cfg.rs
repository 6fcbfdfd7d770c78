use crate::function::{Function, ENTRY_BLOCK};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use tracing::warn;

/// Block-level control flow of one function. Predecessors are the inverted
/// successor edges, computed once at construction.
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    /// Block names in source order.
    pub blocks: Vec<String>,
    pub edges: BTreeMap<String, Vec<String>>,
    pub reverse_edges: BTreeMap<String, Vec<String>>,
    pub entry: String,
}

impl ControlFlowGraph {
    pub fn from_function(function: &Function) -> Self {
        let mut edges = BTreeMap::new();
        let mut reverse_edges: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (name, block) in &function.blocks {
            let mut successors = Vec::new();
            for succ in block.successors() {
                if !function.blocks.contains_key(&succ) {
                    warn!(
                        function = %function.name,
                        block = %name,
                        target = %succ,
                        "edge to undefined block ignored"
                    );
                    continue;
                }
                reverse_edges.entry(succ.clone()).or_default().push(name.clone());
                successors.push(succ);
            }
            edges.insert(name.clone(), successors);
        }

        Self {
            blocks: function.blocks.keys().cloned().collect(),
            edges,
            reverse_edges,
            entry: ENTRY_BLOCK.to_string(),
        }
    }

    pub fn contains(&self, block: &str) -> bool {
        self.edges.contains_key(block)
    }

    pub fn predecessors(&self, block: &str) -> &[String] {
        self.reverse_edges
            .get(block)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn successors(&self, block: &str) -> &[String] {
        self.edges.get(block).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn is_reachable(&self, block: &str) -> bool {
        self.reachable_blocks().contains(block)
    }

    pub fn reachable_blocks(&self) -> BTreeSet<String> {
        let mut visited = BTreeSet::new();
        if !self.contains(&self.entry) {
            return visited;
        }

        let mut queue = VecDeque::new();
        queue.push_back(self.entry.clone());

        while let Some(current) = queue.pop_front() {
            if visited.insert(current.clone()) {
                for succ in self.successors(&current) {
                    queue.push_back(succ.clone());
                }
            }
        }

        visited
    }

    /// Reachable blocks in reverse postorder from the entry.
    /// The walk is iterative; each frame is a block and the index of its next
    /// successor.
    pub fn reverse_postorder(&self) -> Vec<String> {
        let mut postorder = Vec::new();
        if !self.contains(&self.entry) {
            return postorder;
        }

        let mut visited: HashSet<&str> = HashSet::from([self.entry.as_str()]);
        let mut stack: Vec<(&str, usize)> = vec![(self.entry.as_str(), 0)];

        while let Some(top) = stack.last_mut() {
            let (block, index) = *top;
            match self.successors(block).get(index) {
                Some(succ) => {
                    top.1 += 1;
                    if visited.insert(succ.as_str()) {
                        stack.push((succ.as_str(), 0));
                    }
                }
                None => {
                    postorder.push(block.to_string());
                    stack.pop();
                }
            }
        }

        postorder.reverse();
        postorder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;

    #[test]
    fn test_edges_and_predecessors() {
        let mut builder = FunctionBuilder::new("test");
        builder.entry_block().branch("c", "bb1", "bb2");
        builder.block("bb1").jump("bb3");
        builder.block("bb2").jump("bb3");
        builder.block("bb3").ret(None);
        builder.block("dead").jump("bb3");
        let cfg = ControlFlowGraph::from_function(&builder.build().unwrap());

        assert_eq!(cfg.successors("entry"), ["bb1", "bb2"]);
        assert_eq!(cfg.predecessors("bb3"), ["bb1", "bb2", "dead"]);
        assert!(cfg.predecessors("entry").is_empty());
        assert!(cfg.is_reachable("bb3"));
        assert!(!cfg.is_reachable("dead"));
        assert_eq!(cfg.reverse_postorder().first().map(String::as_str), Some("entry"));
        assert_eq!(cfg.reverse_postorder().len(), 4);
    }

    #[test]
    fn test_dangling_edge_is_dropped() {
        let mut builder = FunctionBuilder::new("test");
        builder.entry_block().jump("nowhere");
        let cfg = ControlFlowGraph::from_function(&builder.build().unwrap());
        assert!(cfg.successors("entry").is_empty());
    }

    #[test]
    fn test_long_chain_reverse_postorder() {
        let n = 100_000;
        let mut builder = FunctionBuilder::new("test");
        builder.entry_block().jump("b0");
        for i in 0..n - 1 {
            builder.block(&format!("b{}", i)).jump(&format!("b{}", i + 1));
        }
        builder.block(&format!("b{}", n - 1)).ret(None);
        let cfg = ControlFlowGraph::from_function(&builder.build().unwrap());

        let order = cfg.reverse_postorder();
        assert_eq!(order.len(), n + 1);
        assert_eq!(order[0], "entry");
        assert_eq!(order[1], "b0");
        assert_eq!(order[n], format!("b{}", n - 1));
    }
}
