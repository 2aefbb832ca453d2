// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Sender;
use log::trace;
use reach_driver::ReachDriver;

use crate::command::Command;
use crate::queue::CommandQueue;
use crate::report::Report;

/// The body of one worker thread: pop a command, run it against the driver, report back, and
/// repeat until a `Shutdown` poison pill arrives.
pub fn worker_loop<D: ReachDriver>(queue: Arc<CommandQueue>, driver: Arc<D>, reports: Sender<Report>) {
    loop {
        match queue.pop_blocking() {
            Command::Init(reach) => {
                let started = Instant::now();
                trace!("worker: init {}", reach.id);
                let report = match driver.init(&reach) {
                    Ok(()) => Report::InitDone { id: reach.id, elapsed: started.elapsed() },
                    Err(error) => Report::InitFailed { id: reach.id, error },
                };
                if reports.send(report).is_err() {
                    return;
                }
            }
            Command::Run(reach) => {
                let started = Instant::now();
                trace!("worker: run {}", reach.id);
                let report = match driver.run(&reach) {
                    Ok(outcome) => Report::RunDone { id: reach.id, elapsed: started.elapsed(), outcome },
                    Err(error) => Report::RunFailed { id: reach.id, error },
                };
                if reports.send(report).is_err() {
                    return;
                }
            }
            Command::Cleanup(reach) => {
                let started = Instant::now();
                trace!("worker: cleanup {}", reach.id);
                let report = match driver.cleanup(&reach) {
                    Ok(()) => Report::CleanupDone { id: reach.id, elapsed: started.elapsed() },
                    Err(error) => Report::CleanupFailed { id: reach.id, error },
                };
                if reports.send(report).is_err() {
                    return;
                }
            }
            Command::Shutdown => return,
        }
    }
}
