// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use reach_graph::ReachSnapshot;

use crate::error::DriverError;

/// Result of a successful `run` command.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunOutcome {
    /// The sediment timestep the solver settled on, after any halving retries. `None` for a
    /// reach that was skipped outright (loading-skip, `SkipReach`, or `SkipExist`).
    pub last_timestep: Option<f64>,
    pub retries: u32,
}

/// The three solver-driving operations the scheduler dispatches against one reach
/// (section 4.6). Implementations must be safe to call concurrently for distinct reaches: the
/// scheduler calls these from worker threads with no shared mutable state beyond what the
/// implementation itself provides.
pub trait ReachDriver: Send + Sync {
    fn init(&self, reach: &ReachSnapshot) -> Result<(), DriverError>;
    fn run(&self, reach: &ReachSnapshot) -> Result<RunOutcome, DriverError>;
    fn cleanup(&self, reach: &ReachSnapshot) -> Result<(), DriverError>;
}
