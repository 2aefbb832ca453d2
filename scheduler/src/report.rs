// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::time::Duration;

use reach_driver::{DriverError, RunOutcome};
use reach_graph::ReachId;

/// What a worker sends back to the coordinator after performing one [`crate::Command`].
#[derive(Debug)]
pub enum Report {
    InitDone { id: ReachId, elapsed: Duration },
    InitFailed { id: ReachId, error: DriverError },
    RunDone { id: ReachId, elapsed: Duration, outcome: RunOutcome },
    RunFailed { id: ReachId, error: DriverError },
    CleanupDone { id: ReachId, elapsed: Duration },
    CleanupFailed { id: ReachId, error: DriverError },
}
