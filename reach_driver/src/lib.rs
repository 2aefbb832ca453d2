// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Drives the three solver operations (`init`, `run`, `cleanup`) the scheduler dispatches
//! against each reach (section 4.6).

mod config;
mod driver;
mod error;
mod external;
pub mod fake;

pub use config::DriverConfig;
pub use driver::{ReachDriver, RunOutcome};
pub use error::{ConfigurationError, DriverError};
pub use external::ExternalSolverDriver;
pub use fake::FakeDriver;
