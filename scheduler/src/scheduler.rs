// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::unbounded;
use diagnostics::RunSummary;
use log::{error, info, warn};
use priority_oracle::PriorityOracle;
use reach_driver::ReachDriver;
use reach_graph::Catchment;

use crate::command::Command;
use crate::config::SchedulerConfig;
use crate::error::InfrastructureError;
use crate::queue::CommandQueue;
use crate::report::Report;
use crate::worker::worker_loop;

/// Coordinates one catchment's run to completion: the init barrier (section 4.4), then the
/// dispatch loop that alternates dispatching newly-eligible `run`/`cleanup` commands with
/// applying the reports that come back, until every reach is terminal.
///
/// There is exactly one coordinator, holding the only write access to the shared [`Catchment`];
/// workers only ever see [`reach_graph::ReachSnapshot`]s and report back through a channel, never
/// touching the graph directly.
pub struct Scheduler<D: ReachDriver> {
    catchment: Arc<Catchment>,
    oracle: PriorityOracle,
    driver: Arc<D>,
    config: SchedulerConfig,
}

impl<D: ReachDriver + 'static> Scheduler<D> {
    pub fn new(catchment: Arc<Catchment>, oracle: PriorityOracle, driver: Arc<D>, config: SchedulerConfig) -> Self {
        Scheduler { catchment, oracle, driver, config }
    }

    /// Runs the catchment to completion. Returns `Err` only for an [`InfrastructureError`]
    /// (section 7): a local driver failure is folded into the returned [`RunSummary`] instead,
    /// since it never aborts the run.
    pub fn run(&self) -> Result<RunSummary, InfrastructureError> {
        if self.config.is_serial() {
            Ok(self.run_serial())
        } else {
            self.run_parallel()
        }
    }

    fn run_serial(&self) -> RunSummary {
        let mut summary = RunSummary::new();
        info!("running {} reaches serially", self.catchment.len());

        let mut ids = self.catchment.all_ids();
        ids.sort_by_key(|id| std::cmp::Reverse(self.oracle.key(id)));
        for id in &ids {
            let snapshot = match self.catchment.snapshot_of(id) {
                Some(s) => s,
                None => continue,
            };
            let started = Instant::now();
            if let Err(e) = self.driver.init(&snapshot) {
                error!("init failed for reach {id}: {e}");
                let _ = self.catchment.mark_failed(id);
                summary.record_failure(id);
                continue;
            }
            summary.record_init(id, started.elapsed());
        }

        loop {
            if self.catchment.is_done() {
                break;
            }
            let mut startable = self.catchment.dispatch_startable();
            startable.sort_by_key(|s| std::cmp::Reverse(self.oracle.key(&s.id)));
            for reach in startable {
                let started = Instant::now();
                match self.driver.run(&reach) {
                    Ok(outcome) => {
                        summary.record_run(&reach.id, started.elapsed(), outcome.last_timestep, outcome.retries);
                        let _ = self.catchment.apply_run_report(&reach.id, true);
                    }
                    Err(e) => {
                        error!("run failed for reach {}: {e}", reach.id);
                        summary.record_failure(&reach.id);
                        let _ = self.catchment.apply_run_report(&reach.id, false);
                    }
                }
            }

            let mut cleanable = self.catchment.dispatch_cleanable();
            cleanable.sort_by_key(|s| std::cmp::Reverse(self.oracle.key(&s.id)));
            for reach in cleanable {
                let started = Instant::now();
                match self.driver.cleanup(&reach) {
                    Ok(()) => {
                        summary.record_cleanup(&reach.id, started.elapsed());
                        let _ = self.catchment.apply_cleanup_report(&reach.id);
                    }
                    Err(e) => {
                        warn!("cleanup failed for reach {}: {e}", reach.id);
                        let _ = self.catchment.apply_cleanup_report(&reach.id);
                    }
                }
            }
        }

        summary.log_report();
        summary
    }

    fn run_parallel(&self) -> Result<RunSummary, InfrastructureError> {
        let worker_count = self.config.workers;
        info!("running {} reaches across {worker_count} workers", self.catchment.len());
        let queue = Arc::new(CommandQueue::new());
        let (report_tx, report_rx) = unbounded::<Report>();

        let handles: Vec<JoinHandle<()>> = (0..worker_count)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let driver = Arc::clone(&self.driver);
                let reports = report_tx.clone();
                thread::spawn(move || worker_loop(queue, driver, reports))
            })
            .collect();

        let mut summary = RunSummary::new();
        let mut disconnected = false;

        // Init barrier: dispatch every reach's init and wait for all of them before the first
        // run/cleanup command is ever enqueued (section 4.4, pinned in section 9).
        let all_ids = self.catchment.all_ids();
        for id in &all_ids {
            if let Some(snapshot) = self.catchment.snapshot_of(id) {
                queue.push(self.oracle.key(id), Command::Init(snapshot));
            }
        }
        let mut init_remaining = all_ids.len();
        while init_remaining > 0 {
            match report_rx.recv() {
                Ok(Report::InitDone { id, elapsed }) => {
                    summary.record_init(&id, elapsed);
                    init_remaining -= 1;
                }
                Ok(Report::InitFailed { id, error }) => {
                    error!("init failed for reach {id}: {error}");
                    let _ = self.catchment.mark_failed(&id);
                    summary.record_failure(&id);
                    init_remaining -= 1;
                }
                Ok(_) => unreachable!("no run/cleanup command is enqueued before the init barrier clears"),
                Err(_) => {
                    disconnected = true;
                    break;
                }
            }
        }

        // Dispatch loop: after the barrier, any reach the init phase already failed is terminal
        // and will simply never appear among dispatch_startable()'s results.
        while !disconnected {
            if self.catchment.is_done() {
                break;
            }
            for reach in self.catchment.dispatch_startable() {
                let key = self.oracle.key(&reach.id);
                queue.push(key, Command::Run(reach));
            }
            for reach in self.catchment.dispatch_cleanable() {
                let key = self.oracle.key(&reach.id);
                queue.push(key, Command::Cleanup(reach));
            }
            if self.catchment.is_done() {
                break;
            }
            match report_rx.recv() {
                Ok(Report::RunDone { id, elapsed, outcome }) => {
                    summary.record_run(&id, elapsed, outcome.last_timestep, outcome.retries);
                    let _ = self.catchment.apply_run_report(&id, true);
                }
                Ok(Report::RunFailed { id, error }) => {
                    error!("run failed for reach {id}: {error}");
                    summary.record_failure(&id);
                    let _ = self.catchment.apply_run_report(&id, false);
                }
                Ok(Report::CleanupDone { id, elapsed }) => {
                    summary.record_cleanup(&id, elapsed);
                    let _ = self.catchment.apply_cleanup_report(&id);
                }
                Ok(Report::CleanupFailed { id, error }) => {
                    warn!("cleanup failed for reach {id}: {error}");
                    let _ = self.catchment.apply_cleanup_report(&id);
                }
                Ok(Report::InitDone { .. } | Report::InitFailed { .. }) => {
                    unreachable!("init barrier already cleared")
                }
                Err(_) => disconnected = true,
            }
        }

        // Best-effort shutdown even after a disconnect: any worker still alive exits cleanly
        // instead of being left blocked on the queue forever.
        for _ in 0..worker_count {
            queue.push_shutdown();
        }
        let mut any_panicked = false;
        for handle in handles {
            if handle.join().is_err() {
                any_panicked = true;
            }
        }

        if disconnected {
            error!("report channel disconnected with reaches still outstanding; aborting run");
            return Err(InfrastructureError::ReportChannelDisconnected);
        }
        if any_panicked {
            error!("a worker thread panicked during the run");
            return Err(InfrastructureError::WorkerPanicked);
        }

        summary.log_report();
        Ok(summary)
    }
}
