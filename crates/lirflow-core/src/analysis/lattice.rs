use std::collections::{BTreeMap, BTreeSet};

/// A join semilattice of finite height, the state domain of a forward
/// dataflow analysis.
pub trait JoinSemiLattice: Clone + PartialEq {
    fn join(&self, other: &Self) -> Self;

    /// Joins `other` into `self`, returning whether `self` grew.
    fn join_assign(&mut self, other: &Self) -> bool {
        let joined = self.join(other);
        if joined == *self {
            false
        } else {
            *self = joined;
            true
        }
    }
}

impl<T: Ord + Clone> JoinSemiLattice for BTreeSet<T> {
    fn join(&self, other: &Self) -> Self {
        self.union(other).cloned().collect()
    }

    fn join_assign(&mut self, other: &Self) -> bool {
        let before = self.len();
        self.extend(other.iter().cloned());
        self.len() != before
    }
}

/// Pointwise join. A key present on only one side keeps that side's value.
impl<K: Ord + Clone, V: JoinSemiLattice> JoinSemiLattice for BTreeMap<K, V> {
    fn join(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.join_assign(other);
        result
    }

    fn join_assign(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (key, value) in other {
            match self.get_mut(key) {
                Some(existing) => changed |= existing.join_assign(value),
                None => {
                    self.insert(key.clone(), value.clone());
                    changed = true;
                }
            }
        }
        changed
    }
}
