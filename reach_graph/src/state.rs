// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

/// The per-reach state machine of section 4.1: `Waiting` is the only entry state, `Done`,
/// `Error` and `UpstreamError` are the only terminal ones.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReachState {
    Waiting,
    CanStart,
    Running,
    RunDone,
    CanBeCleaned,
    Cleaning,
    Done,
    Error,
    UpstreamError,
}

impl ReachState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ReachState::Done | ReachState::Error | ReachState::UpstreamError
        )
    }

    pub fn is_failed(self) -> bool {
        matches!(self, ReachState::Error | ReachState::UpstreamError)
    }

    /// True for the states a node must be in for a downstream/upstream dependant to treat it
    /// as "finished producing the output it will ever produce".
    pub fn satisfies_dependency(self) -> bool {
        matches!(self, ReachState::RunDone | ReachState::Done)
    }
}
