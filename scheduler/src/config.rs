// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use serde::Deserialize;

/// Run-time shape of the scheduler (section 4.9): how many worker threads to run the catchment
/// with. `workers <= 1` runs the serial, single-threaded mode of section 4.5.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    1
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig { workers: default_workers() }
    }
}

impl SchedulerConfig {
    pub fn is_serial(&self) -> bool {
        self.workers <= 1
    }
}
