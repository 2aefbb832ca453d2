// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fmt;

/// Fatal, mid-run infrastructure failures (section 7): these are distinct from a per-reach
/// [`reach_driver::DriverError`], which is local and never aborts the catchment. An
/// `InfrastructureError` means the scheduler itself can no longer make progress; it drains what
/// it can, joins every worker it still can, and surfaces this to its caller instead of returning
/// a [`diagnostics::RunSummary`] as if the run had completed normally.
#[derive(Debug)]
pub enum InfrastructureError {
    /// Every sender on the report channel was dropped (every worker thread exited or panicked)
    /// while reaches were still outstanding.
    ReportChannelDisconnected,
    /// A worker thread panicked rather than returning normally.
    WorkerPanicked,
}

impl fmt::Display for InfrastructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfrastructureError::ReportChannelDisconnected => {
                write!(f, "report channel disconnected with reaches still outstanding")
            }
            InfrastructureError::WorkerPanicked => write!(f, "a worker thread panicked"),
        }
    }
}

impl std::error::Error for InfrastructureError {}
