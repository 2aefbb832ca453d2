// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use fnv::{FnvHashMap as HashMap, FnvHashSet as HashSet};
use log::{debug, trace, warn};
use parking_lot::Mutex;
use petgraph::Direction;
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::attributes::ReachAttributes;
use crate::error::TopologyError;
use crate::id::ReachId;
use crate::node::{ReachNode, ReachSnapshot};
use crate::state::ReachState;

type PGraph = DiGraph<ReachNode, (), u32>;

struct Inner {
    pg: PGraph,
    nodes: HashMap<ReachId, NodeIndex<u32>>,
    can_start: HashSet<ReachId>,
    can_be_cleaned: HashSet<ReachId>,
    failed: Vec<ReachId>,
    failed_set: HashSet<ReachId>,
    completed_count: usize,
    finalized: bool,
}

impl Inner {
    fn idx(&self, id: &ReachId) -> Option<NodeIndex<u32>> {
        self.nodes.get(id).copied()
    }
}

/// Owns every [`ReachNode`] of one simulation and is the single point of mutation for their
/// state machine (section 4.1/4.2). All mutations are serialized behind one lock: workers never
/// touch this structure directly, they only ever see [`ReachSnapshot`]s and report back through
/// the scheduler, which is the only caller of the mutating methods below.
pub struct Catchment {
    inner: Mutex<Inner>,
}

impl Default for Catchment {
    fn default() -> Self {
        Self::new()
    }
}

impl Catchment {
    pub fn new() -> Self {
        Catchment {
            inner: Mutex::new(Inner {
                pg: DiGraph::default(),
                nodes: HashMap::default(),
                can_start: HashSet::default(),
                can_be_cleaned: HashSet::default(),
                failed: Vec::new(),
                failed_set: HashSet::default(),
                completed_count: 0,
                finalized: false,
            }),
        }
    }

    /// Inserts a reach in the `Waiting` state. Fails if `id` was already added.
    pub fn add_reach(
        &self,
        id: ReachId,
        attributes: ReachAttributes,
        downstream_ids: Vec<ReachId>,
        has_direct_loading: bool,
    ) -> Result<(), TopologyError> {
        let mut inner = self.inner.lock();
        if inner.nodes.contains_key(&id) {
            return Err(TopologyError::DuplicateReach(id));
        }
        let node = ReachNode::new(id.clone(), attributes, downstream_ids, has_direct_loading);
        let idx = inner.pg.add_node(node);
        inner.nodes.insert(id, idx);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().pg.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prunes dangling downstream ids, links upstream ids, verifies acyclicity, computes
    /// `has_upstream_loading` and `mass_outflow_file_needed`, and performs the initial state
    /// check from every root. Idempotent: calling it again on an already-finalized catchment is
    /// a no-op.
    pub fn finalize(&self) -> Result<(), TopologyError> {
        let mut inner = self.inner.lock();
        if inner.finalized {
            return Ok(());
        }

        // Prune dangling children and add the surviving edges.
        let all_ids: Vec<ReachId> = inner.nodes.keys().cloned().collect();
        for id in &all_ids {
            let idx = inner.idx(id).expect("id came from the node map");
            let downstream_ids = inner.pg[idx].downstream_ids.clone();
            let mut surviving = Vec::with_capacity(downstream_ids.len());
            for d in downstream_ids {
                if let Some(d_idx) = inner.idx(&d) {
                    inner.pg.add_edge(idx, d_idx, ());
                    surviving.push(d);
                } else {
                    warn!("reach {id} references unknown downstream reach {d}; pruning");
                }
            }
            inner.pg[idx].downstream_ids = surviving;
        }

        if is_cyclic_directed(&inner.pg) {
            // Undo the edges we just added so that a retry after the caller fixes the input
            // does not see a half-finalized graph holding stale edges.
            inner.pg.clear_edges();
            return Err(TopologyError::Cycle);
        }

        let order = toposort(&inner.pg, None).map_err(|_| TopologyError::Cycle)?;

        // Reverse-link upstream ids.
        for &idx in &order {
            let downstream: Vec<NodeIndex<u32>> =
                inner.pg.neighbors_directed(idx, Direction::Outgoing).collect();
            let upstream_id = inner.pg[idx].id.clone();
            for d in downstream {
                inner.pg[d].upstream_ids.push(upstream_id.clone());
            }
        }

        // Forward pass (topological order): has_upstream_loading.
        for &idx in &order {
            let upstream: Vec<NodeIndex<u32>> =
                inner.pg.neighbors_directed(idx, Direction::Incoming).collect();
            let loaded = upstream
                .iter()
                .any(|&u| inner.pg[u].has_direct_loading || inner.pg[u].has_upstream_loading);
            inner.pg[idx].has_upstream_loading = loaded;
        }

        // Backward pass (reverse topological order, leaves first): mass_outflow_file_needed.
        for &idx in order.iter().rev() {
            let downstream: Vec<NodeIndex<u32>> =
                inner.pg.neighbors_directed(idx, Direction::Outgoing).collect();
            let needed = downstream.iter().any(|&d| !inner.pg[d].skip());
            inner.pg[idx].mass_outflow_file_needed = needed;
        }

        // Initial state check: every root (no upstream) is immediately eligible to start.
        let roots: Vec<NodeIndex<u32>> = order
            .iter()
            .copied()
            .filter(|&idx| inner.pg[idx].upstream_ids.is_empty())
            .collect();
        for idx in roots {
            recheck(&mut inner, idx);
        }

        inner.finalized = true;
        debug!("catchment finalized with {} reaches", inner.pg.node_count());
        Ok(())
    }

    /// Roots of the (finalized) DAG: reaches with no upstream.
    pub fn roots(&self) -> Vec<ReachId> {
        let inner = self.inner.lock();
        inner
            .pg
            .node_indices()
            .filter(|&idx| inner.pg.neighbors_directed(idx, Direction::Incoming).next().is_none())
            .map(|idx| inner.pg[idx].id.clone())
            .collect()
    }

    /// Leaves of the (finalized) DAG: reaches with no downstream.
    pub fn leaves(&self) -> Vec<ReachId> {
        let inner = self.inner.lock();
        inner
            .pg
            .node_indices()
            .filter(|&idx| inner.pg.neighbors_directed(idx, Direction::Outgoing).next().is_none())
            .map(|idx| inner.pg[idx].id.clone())
            .collect()
    }

    pub fn all_ids(&self) -> Vec<ReachId> {
        let inner = self.inner.lock();
        inner.pg.node_indices().map(|idx| inner.pg[idx].id.clone()).collect()
    }

    /// Snapshot of the downstream adjacency, for consumption by the priority oracle.
    pub fn children_map(&self) -> HashMap<ReachId, Vec<ReachId>> {
        let inner = self.inner.lock();
        inner
            .pg
            .node_indices()
            .map(|idx| (inner.pg[idx].id.clone(), inner.pg[idx].downstream_ids.clone()))
            .collect()
    }

    pub fn snapshot_of(&self, id: &ReachId) -> Option<ReachSnapshot> {
        let inner = self.inner.lock();
        inner.idx(id).map(|idx| inner.pg[idx].snapshot())
    }

    pub fn state_of(&self, id: &ReachId) -> Option<ReachState> {
        let inner = self.inner.lock();
        inner.idx(id).map(|idx| inner.pg[idx].state)
    }

    /// Non-mutating peek at the set of reaches currently eligible to start.
    pub fn eligible_to_start(&self) -> Vec<ReachId> {
        self.inner.lock().can_start.iter().cloned().collect()
    }

    /// Non-mutating peek at the set of reaches currently eligible for cleanup.
    pub fn eligible_to_clean(&self) -> Vec<ReachId> {
        self.inner.lock().can_be_cleaned.iter().cloned().collect()
    }

    /// Atomically transitions every `CanStart` reach to `Running` and returns their snapshots
    /// for the scheduler to enqueue as `run` commands.
    pub fn dispatch_startable(&self) -> Vec<ReachSnapshot> {
        let mut inner = self.inner.lock();
        let ids: Vec<ReachId> = inner.can_start.drain().collect();
        ids.into_iter()
            .map(|id| {
                let idx = inner.idx(&id).expect("can_start only ever holds live ids");
                inner.pg[idx].state = ReachState::Running;
                inner.pg[idx].snapshot()
            })
            .collect()
    }

    /// Atomically transitions every `CanBeCleaned` reach to `Cleaning` and returns their
    /// snapshots for the scheduler to enqueue as `cleanup` commands.
    pub fn dispatch_cleanable(&self) -> Vec<ReachSnapshot> {
        let mut inner = self.inner.lock();
        let ids: Vec<ReachId> = inner.can_be_cleaned.drain().collect();
        ids.into_iter()
            .map(|id| {
                let idx = inner.idx(&id).expect("can_be_cleaned only ever holds live ids");
                inner.pg[idx].state = ReachState::Cleaning;
                inner.pg[idx].snapshot()
            })
            .collect()
    }

    /// Applies the outcome of a `run` report: `ok` moves the reach to `RunDone` and cascades
    /// re-checks to its neighbors; `!ok` moves it (and every transitive downstream) to `Error`
    /// / `UpstreamError`.
    pub fn apply_run_report(&self, id: &ReachId, ok: bool) -> Result<(), TopologyError> {
        if !ok {
            return self.mark_failed(id);
        }
        let mut inner = self.inner.lock();
        let idx = inner.idx(id).ok_or(TopologyError::NotFinalized)?;
        inner.pg[idx].state = ReachState::RunDone;
        trace!("reach {id} run done");
        let upstream: Vec<NodeIndex<u32>> =
            inner.pg.neighbors_directed(idx, Direction::Incoming).collect();
        let downstream: Vec<NodeIndex<u32>> =
            inner.pg.neighbors_directed(idx, Direction::Outgoing).collect();
        recheck(&mut inner, idx);
        for u in upstream {
            recheck(&mut inner, u);
        }
        for d in downstream {
            recheck(&mut inner, d);
        }
        Ok(())
    }

    /// Marks a reach (and every transitive downstream reach) as failed. Used both for a failed
    /// `run` report and for an `init` failure detected during the init barrier, before the
    /// reach ever reaches `Running`.
    pub fn mark_failed(&self, id: &ReachId) -> Result<(), TopologyError> {
        let mut inner = self.inner.lock();
        let idx = inner.idx(id).ok_or(TopologyError::NotFinalized)?;
        set_error(&mut inner, idx, false);
        Ok(())
    }

    /// Applies the outcome of a `cleanup` report: the reach moves from `Cleaning` to `Done`.
    pub fn apply_cleanup_report(&self, id: &ReachId) -> Result<(), TopologyError> {
        let mut inner = self.inner.lock();
        let idx = inner.idx(id).ok_or(TopologyError::NotFinalized)?;
        inner.pg[idx].state = ReachState::Done;
        inner.completed_count += 1;
        trace!("reach {id} done");
        Ok(())
    }

    pub fn completed_count(&self) -> usize {
        self.inner.lock().completed_count
    }

    pub fn failed_count(&self) -> usize {
        self.inner.lock().failed.len()
    }

    pub fn failed_ids(&self) -> Vec<ReachId> {
        self.inner.lock().failed.clone()
    }

    /// True iff every reach has reached a terminal state (`Done`, `Error` or `UpstreamError`).
    pub fn is_done(&self) -> bool {
        let inner = self.inner.lock();
        inner.pg.node_indices().all(|idx| inner.pg[idx].state.is_terminal())
    }
}

fn recheck(inner: &mut Inner, idx: NodeIndex<u32>) {
    match inner.pg[idx].state {
        ReachState::Waiting => {
            let any_failed = inner
                .pg
                .neighbors_directed(idx, Direction::Incoming)
                .any(|u| inner.pg[u].state.is_failed());
            if any_failed {
                set_error(inner, idx, true);
                return;
            }
            let upstream_ready = inner
                .pg
                .neighbors_directed(idx, Direction::Incoming)
                .all(|u| inner.pg[u].state.satisfies_dependency());
            if upstream_ready {
                inner.pg[idx].state = ReachState::CanStart;
                let id = inner.pg[idx].id.clone();
                inner.can_start.insert(id);
            }
        }
        ReachState::RunDone => {
            // A downstream reach that has itself terminally failed will never read this
            // reach's output, so it counts as "ready" too: a failure must not pin a finished
            // upstream reach's output on disk forever.
            let downstream_ready = inner
                .pg
                .neighbors_directed(idx, Direction::Outgoing)
                .all(|d| inner.pg[d].state.satisfies_dependency() || inner.pg[d].state.is_failed());
            if downstream_ready {
                inner.pg[idx].state = ReachState::CanBeCleaned;
                let id = inner.pg[idx].id.clone();
                inner.can_be_cleaned.insert(id);
            }
        }
        _ => {}
    }
}

/// Marks `idx` as failed (`Error` if this is the origin of the failure, `UpstreamError` if it is
/// being propagated to a descendant) and propagates to every transitive downstream. Idempotent: a
/// node that has already reached a terminal state is left alone.
///
/// Walks the downstream subtree with an explicit worklist rather than recursing, the same
/// discipline `priority_oracle::compute_rank` uses for its own traversal: a failure at the root
/// of a multi-thousand-reach chain must not bound the deepest supported catchment by the
/// coordinator thread's stack size.
fn set_error(inner: &mut Inner, origin: NodeIndex<u32>, origin_is_upstream: bool) {
    let mut to_fail: Vec<(NodeIndex<u32>, bool)> = vec![(origin, origin_is_upstream)];
    let mut to_recheck: Vec<NodeIndex<u32>> = Vec::new();

    while let Some((idx, is_upstream)) = to_fail.pop() {
        if inner.pg[idx].state.is_terminal() {
            continue;
        }
        inner.pg[idx].state = if is_upstream {
            ReachState::UpstreamError
        } else {
            ReachState::Error
        };
        let id = inner.pg[idx].id.clone();
        inner.can_start.remove(&id);
        inner.can_be_cleaned.remove(&id);
        if inner.failed_set.insert(id.clone()) {
            inner.failed.push(id);
        }
        for d in inner.pg.neighbors_directed(idx, Direction::Outgoing).collect::<Vec<_>>() {
            to_fail.push((d, true));
        }
        for u in inner.pg.neighbors_directed(idx, Direction::Incoming).collect::<Vec<_>>() {
            to_recheck.push(u);
        }
    }

    // An upstream reach sitting in RunDone may have been waiting only on a reach that just
    // failed for good; recheck whether it is now free to be cleaned up. Deferred until the whole
    // failure cascade above has settled, so every downstream state it might inspect is final.
    for idx in to_recheck {
        recheck(inner, idx);
    }
}
