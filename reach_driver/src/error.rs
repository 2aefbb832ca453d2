// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fmt;
use std::path::PathBuf;

/// Failures a [`crate::ReachDriver`] can report back to the scheduler as a failed `run`/`init`/
/// `cleanup` command. Local and per-reach: the scheduler folds these into the reach's own
/// `Error` state and never aborts the run over one (section 7).
#[derive(Debug)]
pub enum DriverError {
    Io(std::io::Error),
    /// The solver exited non-zero, or left a `.ERR` sentinel behind, after exhausting every
    /// timestep-halving retry.
    SolverFailed { reach: String, timestep: f64 },
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Io(e) => write!(f, "io error: {e}"),
            DriverError::SolverFailed { reach, timestep } => write!(
                f,
                "solver failed for reach {reach} even at timestep {timestep}"
            ),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Io(e) => Some(e),
            DriverError::SolverFailed { .. } => None,
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        DriverError::Io(e)
    }
}

/// Fatal, pre-run errors (section 7): detected while validating configuration, before a
/// catchment is ever dispatched. Unlike [`DriverError`], this aborts the whole run rather than
/// being folded into one reach's outcome.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigurationError {
    /// A configured working directory's path contains whitespace; the external solver cannot
    /// be trusted to quote its paths correctly.
    WhitespaceInPath(PathBuf),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::WhitespaceInPath(p) => {
                write!(f, "working directory {} contains whitespace", p.display())
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}
