// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::sync::Mutex;

use fnv::FnvHashSet as HashSet;
use reach_graph::ReachSnapshot;

use crate::driver::{ReachDriver, RunOutcome};
use crate::error::DriverError;

/// An in-memory driver for scheduler tests: no subprocess, no filesystem, configurable to fail
/// a fixed set of reaches so failure propagation can be exercised deterministically.
#[derive(Default)]
pub struct FakeDriver {
    fail_on_run: HashSet<String>,
    calls: Mutex<Vec<(String, &'static str)>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        FakeDriver::default()
    }

    pub fn failing(mut self, id: impl Into<String>) -> Self {
        self.fail_on_run.insert(id.into());
        self
    }

    /// The `(reach id, command)` pairs this driver has been asked to perform, in call order.
    pub fn calls(&self) -> Vec<(String, &'static str)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ReachDriver for FakeDriver {
    fn init(&self, reach: &ReachSnapshot) -> Result<(), DriverError> {
        self.calls.lock().unwrap().push((reach.id.to_string(), "init"));
        Ok(())
    }

    fn run(&self, reach: &ReachSnapshot) -> Result<RunOutcome, DriverError> {
        self.calls.lock().unwrap().push((reach.id.to_string(), "run"));
        if reach.skip {
            return Ok(RunOutcome::default());
        }
        if self.fail_on_run.contains(reach.id.as_str()) {
            return Err(DriverError::SolverFailed { reach: reach.id.to_string(), timestep: 1.0 });
        }
        Ok(RunOutcome { last_timestep: Some(1.0), retries: 0 })
    }

    fn cleanup(&self, reach: &ReachSnapshot) -> Result<(), DriverError> {
        self.calls.lock().unwrap().push((reach.id.to_string(), "cleanup"));
        Ok(())
    }
}
