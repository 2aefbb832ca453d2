// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use crate::attributes::ReachAttributes;
use crate::id::ReachId;
use crate::state::ReachState;

/// A node in the catchment DAG, as it lives inside [`crate::Catchment`].
///
/// Cross-references to other nodes are carried as [`ReachId`]s, never as direct pointers: the
/// `Catchment` is the sole owner of all nodes, and all mutation of `state` goes through it.
#[derive(Clone, Debug)]
pub(crate) struct ReachNode {
    pub(crate) id: ReachId,
    pub(crate) attributes: ReachAttributes,
    pub(crate) downstream_ids: Vec<ReachId>,
    pub(crate) upstream_ids: Vec<ReachId>,
    pub(crate) has_direct_loading: bool,
    pub(crate) has_upstream_loading: bool,
    pub(crate) mass_outflow_file_needed: bool,
    pub(crate) state: ReachState,
}

impl ReachNode {
    pub(crate) fn new(
        id: ReachId,
        attributes: ReachAttributes,
        downstream_ids: Vec<ReachId>,
        has_direct_loading: bool,
    ) -> Self {
        ReachNode {
            id,
            attributes,
            downstream_ids,
            upstream_ids: Vec::new(),
            has_direct_loading,
            has_upstream_loading: false,
            mass_outflow_file_needed: false,
            state: ReachState::Waiting,
        }
    }

    pub(crate) fn skip(&self) -> bool {
        !(self.has_direct_loading || self.has_upstream_loading)
    }

    pub(crate) fn snapshot(&self) -> ReachSnapshot {
        ReachSnapshot {
            id: self.id.clone(),
            attributes: self.attributes.clone(),
            upstream_ids: self.upstream_ids.clone(),
            skip: self.skip(),
            mass_outflow_file_needed: self.mass_outflow_file_needed,
        }
    }
}

/// A value-type copy of a reach's static attributes, detached from the graph and from any
/// callback hooks. Safe to hand to a worker thread (or, for a subprocess-backed driver,
/// to serialize across a process boundary): it carries no reference back to the
/// [`crate::Catchment`] it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct ReachSnapshot {
    pub id: ReachId,
    pub attributes: ReachAttributes,
    pub upstream_ids: Vec<ReachId>,
    pub skip: bool,
    pub mass_outflow_file_needed: bool,
}
