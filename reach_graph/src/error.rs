// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fmt;

use crate::id::ReachId;

/// Fatal, pre-run errors detected while building or finalizing a [`crate::Catchment`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TopologyError {
    /// `add_reach` was called twice with the same id.
    DuplicateReach(ReachId),
    /// The downstream relation contains a cycle; no commands were ever enqueued.
    Cycle,
    /// An operation that requires `finalize()` to have run was attempted first.
    NotFinalized,
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::DuplicateReach(id) => {
                write!(f, "reach {id} was added more than once")
            }
            TopologyError::Cycle => write!(f, "catchment topology contains a cycle"),
            TopologyError::NotFinalized => write!(f, "catchment has not been finalized yet"),
        }
    }
}

impl std::error::Error for TopologyError {}
