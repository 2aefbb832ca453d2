// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Static HEFT-style priority for the catchment DAG (section 4.3).
//!
//! Every reach gets an "upward rank": the length, in edges, of the longest path from it down to
//! a leaf, with a unit compute cost per reach and zero communication cost on each edge (neither
//! is known ahead of a run, so both are treated as constants rather than modeled). Reaches with
//! a longer remaining path downstream are dispatched first, since stalling them blocks more of
//! the graph. Ties are broken lexicographically by [`ReachId`], ascending, for a priority order
//! that depends only on the topology, not on iteration order.

use std::cmp::Reverse;

use fnv::FnvHashMap as HashMap;
use reach_graph::ReachId;

/// A total order over reaches driven entirely by topology: `Ord` on this type sorts "dispatch
/// first" to the maximum, so it drops straight into a [`std::collections::BinaryHeap`].
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct PriorityKey(u32, Reverse<ReachId>);

/// Precomputed upward-rank priorities for one (already-finalized) catchment topology.
///
/// Computed once, from the static downstream adjacency, before the first reach is dispatched.
/// Nothing about dispatch order or runtime state feeds back into it.
pub struct PriorityOracle {
    ranks: HashMap<ReachId, u32>,
}

impl PriorityOracle {
    /// Computes the upward rank of every id appearing as a key in `children`, given its
    /// downstream adjacency. Assumes `children` is acyclic; this is guaranteed for a
    /// successfully finalized [`reach_graph::Catchment`].
    pub fn compute(children: &HashMap<ReachId, Vec<ReachId>>) -> Self {
        let mut ranks: HashMap<ReachId, u32> = HashMap::default();
        let mut ids: Vec<&ReachId> = children.keys().collect();
        // Sort purely so traversal order (and therefore nothing observable) is deterministic.
        ids.sort();
        for id in ids {
            compute_rank(id, children, &mut ranks);
        }
        PriorityOracle { ranks }
    }

    /// The upward rank of `id`, or `0` if it is unknown to this oracle.
    pub fn rank(&self, id: &ReachId) -> u32 {
        self.ranks.get(id).copied().unwrap_or(0)
    }

    /// The sort key to dispatch `id` by: larger sorts first.
    pub fn key(&self, id: &ReachId) -> PriorityKey {
        PriorityKey(self.rank(id), Reverse(id.clone()))
    }
}

/// Iterative post-order traversal: a reach's rank depends only on its children's ranks, so we
/// walk the subtree rooted at `start` with an explicit stack instead of recursing, which would
/// otherwise bound the deepest supported catchment by the thread's stack size.
fn compute_rank(start: &ReachId, children: &HashMap<ReachId, Vec<ReachId>>, ranks: &mut HashMap<ReachId, u32>) {
    if ranks.contains_key(start) {
        return;
    }
    let mut stack: Vec<(ReachId, usize)> = vec![(start.clone(), 0)];
    while let Some((id, next_child)) = stack.pop() {
        let kids: &[ReachId] = children.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        if let Some(child) = kids.get(next_child) {
            stack.push((id, next_child + 1));
            if !ranks.contains_key(child) {
                stack.push((child.clone(), 0));
            }
            continue;
        }
        let rank = 1 + kids.iter().map(|c| ranks[c]).max().unwrap_or(0);
        ranks.insert(id, rank);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &[&str])]) -> HashMap<ReachId, Vec<ReachId>> {
        pairs
            .iter()
            .map(|(id, kids)| (ReachId::new(*id), kids.iter().map(|k| ReachId::new(*k)).collect()))
            .collect()
    }

    #[test]
    fn single_reach_has_rank_one() {
        let oracle = PriorityOracle::compute(&map(&[("A", &[])]));
        assert_eq!(oracle.rank(&ReachId::new("A")), 1);
    }

    #[test]
    fn linear_chain_ranks_decrease_downstream() {
        let oracle = PriorityOracle::compute(&map(&[("A", &["B"]), ("B", &["C"]), ("C", &[])]));
        assert_eq!(oracle.rank(&ReachId::new("A")), 3);
        assert_eq!(oracle.rank(&ReachId::new("B")), 2);
        assert_eq!(oracle.rank(&ReachId::new("C")), 1);
    }

    #[test]
    fn diamond_takes_the_longer_path() {
        // A -> B -> D, A -> C -> E -> D: the A->C->E->D arm is longer, so A's rank counts it.
        let oracle = PriorityOracle::compute(&map(&[
            ("A", &["B", "C"]),
            ("B", &["D"]),
            ("C", &["E"]),
            ("E", &["D"]),
            ("D", &[]),
        ]));
        assert_eq!(oracle.rank(&ReachId::new("D")), 1);
        assert_eq!(oracle.rank(&ReachId::new("B")), 2);
        assert_eq!(oracle.rank(&ReachId::new("E")), 2);
        assert_eq!(oracle.rank(&ReachId::new("C")), 3);
        assert_eq!(oracle.rank(&ReachId::new("A")), 4);
    }

    #[test]
    fn ties_break_ascending_by_id() {
        let oracle = PriorityOracle::compute(&map(&[("zzz", &[]), ("aaa", &[])]));
        let zzz = oracle.key(&ReachId::new("zzz"));
        let aaa = oracle.key(&ReachId::new("aaa"));
        // Equal rank, but "aaa" must sort as the greater key (dispatched first).
        assert!(aaa > zzz);
    }

    #[test]
    fn deep_chain_does_not_overflow_the_stack() {
        let n = 5_000;
        let pairs: Vec<(String, Vec<String>)> = (0..n)
            .map(|i| {
                let downstream = if i + 1 < n { vec![format!("r{}", i + 1)] } else { vec![] };
                (format!("r{i}"), downstream)
            })
            .collect();
        let children: HashMap<ReachId, Vec<ReachId>> = pairs
            .iter()
            .map(|(id, kids)| (ReachId::new(id.as_str()), kids.iter().map(|k| ReachId::new(k.as_str())).collect()))
            .collect();
        let oracle = PriorityOracle::compute(&children);
        assert_eq!(oracle.rank(&ReachId::new("r0")), n as u32);
        assert_eq!(oracle.rank(&ReachId::new(format!("r{}", n - 1).as_str())), 1);
    }
}
