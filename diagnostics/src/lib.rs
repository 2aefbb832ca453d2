// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! A small, in-process run report: per-reach timings and a final pass/fail summary.
//!
//! This is deliberately much lighter than a build-observability tracer: there is no live
//! streaming UI to update and no workunit hierarchy to maintain, just one record per reach that
//! the scheduler fills in as `init`/`run`/`cleanup` commands complete, plus a severity `Level`
//! for the one-line-per-reach report emitted at the end of a run.
use std::time::Duration;

use fnv::FnvHashMap as HashMap;
use reach_graph::ReachId;

/// Severity of a single reach's outcome, for the closing report. Distinct from [`log::Level`]:
/// this classifies an *outcome* (did it need retries, did it fail) rather than a log line, but
/// [`Level::as_log_level`] gives the obvious mapping for emitting it through `log`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_log_level(self) -> log::Level {
        match self {
            Level::Info => log::Level::Info,
            Level::Warn => log::Level::Warn,
            Level::Error => log::Level::Error,
        }
    }
}

/// Timing and retry detail for one reach's pass through the driver.
#[derive(Clone, Debug, Default)]
pub struct ReachTiming {
    pub init: Option<Duration>,
    pub run: Option<Duration>,
    pub cleanup: Option<Duration>,
    /// The sediment timestep the solver had settled on when `run` last reported, after any
    /// halving retries (section 4.6).
    pub last_timestep: Option<f64>,
    pub run_retries: u32,
}

impl ReachTiming {
    fn level(&self, failed: bool) -> Level {
        if failed {
            Level::Error
        } else if self.run_retries > 0 {
            Level::Warn
        } else {
            Level::Info
        }
    }
}

/// Aggregates one run's worth of per-reach timings into a final summary.
#[derive(Default)]
pub struct RunSummary {
    timings: HashMap<ReachId, ReachTiming>,
    failed: Vec<ReachId>,
    completed: usize,
}

impl RunSummary {
    pub fn new() -> Self {
        RunSummary::default()
    }

    fn entry(&mut self, id: &ReachId) -> &mut ReachTiming {
        self.timings.entry(id.clone()).or_default()
    }

    pub fn record_init(&mut self, id: &ReachId, elapsed: Duration) {
        self.entry(id).init = Some(elapsed);
    }

    pub fn record_run(&mut self, id: &ReachId, elapsed: Duration, last_timestep: Option<f64>, retries: u32) {
        let entry = self.entry(id);
        entry.run = Some(elapsed);
        entry.last_timestep = last_timestep;
        entry.run_retries = retries;
    }

    pub fn record_cleanup(&mut self, id: &ReachId, elapsed: Duration) {
        self.entry(id).cleanup = Some(elapsed);
        self.completed += 1;
    }

    pub fn record_failure(&mut self, id: &ReachId) {
        self.failed.push(id.clone());
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn failed(&self) -> &[ReachId] {
        &self.failed
    }

    pub fn timing(&self, id: &ReachId) -> Option<&ReachTiming> {
        self.timings.get(id)
    }

    /// Emits one log line per reach that ever had timing recorded, at the severity its outcome
    /// earned, followed by a single closing totals line.
    pub fn log_report(&self) {
        let mut ids: Vec<&ReachId> = self.timings.keys().collect();
        ids.sort();
        for id in ids {
            let timing = &self.timings[id];
            let failed = self.failed.contains(id);
            let level = timing.level(failed);
            log::log!(
                level.as_log_level(),
                "reach {id}: init={init:?} run={run:?} cleanup={cleanup:?} retries={retries}",
                id = id,
                init = timing.init,
                run = timing.run,
                cleanup = timing.cleanup,
                retries = timing.run_retries,
            );
        }
        log::info!(
            "run summary: {} completed, {} failed ({})",
            self.completed,
            self.failed.len(),
            self.failed.iter().map(ReachId::as_str).collect::<Vec<_>>().join(", "),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_completion_and_failure_counts() {
        let mut summary = RunSummary::new();
        let a = ReachId::new("A");
        let b = ReachId::new("B");
        summary.record_run(&a, Duration::from_secs(1), Some(60.0), 0);
        summary.record_cleanup(&a, Duration::from_millis(5));
        summary.record_run(&b, Duration::from_secs(1), Some(7.5), 3);
        summary.record_failure(&b);

        assert_eq!(summary.completed(), 1);
        assert_eq!(summary.failed(), &[b.clone()]);
        assert_eq!(summary.timing(&b).unwrap().run_retries, 3);
    }

    #[test]
    fn retried_but_successful_reach_is_a_warning() {
        let mut summary = RunSummary::new();
        let a = ReachId::new("A");
        summary.record_run(&a, Duration::from_secs(1), Some(1.0), 2);
        summary.record_cleanup(&a, Duration::from_millis(1));
        let timing = summary.timing(&a).unwrap();
        assert_eq!(timing.level(false), Level::Warn);
    }
}
