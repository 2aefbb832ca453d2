// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use reach_graph::ReachSnapshot;

/// A unit of work for a worker to perform. `Shutdown` is a poison pill: one is enqueued per
/// worker once the catchment is fully done.
#[derive(Clone, Debug)]
pub enum Command {
    Init(ReachSnapshot),
    Run(ReachSnapshot),
    Cleanup(ReachSnapshot),
    Shutdown,
}
