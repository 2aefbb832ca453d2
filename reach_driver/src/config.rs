// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::path::PathBuf;

use fnv::FnvHashSet as HashSet;
use serde::Deserialize;

use crate::error::ConfigurationError;

/// Solver invocation parameters, loaded from the TOML run configuration (section 4.9).
#[derive(Clone, Debug, Deserialize)]
pub struct DriverConfig {
    /// Path to the external solver binary.
    pub solver_binary: PathBuf,
    /// Root directory under which each reach gets its own working subdirectory.
    pub working_root: PathBuf,
    /// Sediment timestep (seconds) a fresh run starts from.
    #[serde(default = "default_initial_timestep")]
    pub initial_timestep: f64,
    /// Lower bound on the sediment timestep: a run that has halved below this gives up rather
    /// than retrying further.
    #[serde(default = "default_min_timestep")]
    pub min_timestep: f64,
    /// Scales a reach's water residence time into the mass-flow timestep written into its
    /// upstream-flux placeholder (`Toxswa.reach_massFlowTimestep` in the reference driver).
    #[serde(default = "default_mass_flow_timestep_param")]
    pub mass_flow_timestep_param: f64,
    /// Lower bound on the mass-flow timestep computed above.
    #[serde(default = "default_min_mass_flow_timestep")]
    pub min_mass_flow_timestep: f64,
    /// Reach ids to force-skip regardless of loading (`SkipReach`): useful to re-run a subset
    /// of a catchment without re-running everything upstream of it.
    #[serde(default)]
    pub skip_reaches: HashSet<String>,
    /// If false, a reach's raw solver output is removed once its post-processed result has been
    /// written, to cap peak disk usage (section 4.7/6). Mirrors `processOutputFiles`'s
    /// `keepOrig` flag in the reference driver, defaulting the same way it does.
    #[serde(default = "default_keep_original_outputs")]
    pub keep_original_outputs: bool,
    /// If true, `cleanup` deletes a reach's upstream-flux file once no live downstream still
    /// needs it (section 6's `deleteUpstreamFluxFiles`; `deleteMfuFiles` in the reference
    /// driver). If false, `cleanup` leaves the file in place.
    #[serde(default)]
    pub delete_upstream_flux_files: bool,
}

fn default_initial_timestep() -> f64 {
    86_400.0
}

fn default_min_timestep() -> f64 {
    1.0
}

fn default_mass_flow_timestep_param() -> f64 {
    1.0
}

fn default_min_mass_flow_timestep() -> f64 {
    60.0
}

fn default_keep_original_outputs() -> bool {
    true
}

impl DriverConfig {
    pub fn is_forced_skip(&self, id: &str) -> bool {
        self.skip_reaches.contains(id)
    }

    /// Fatal, pre-run validation (section 7's `ConfigurationError`): rejects a working root
    /// whose path contains whitespace before the catchment is ever dispatched, since the
    /// external solver cannot be trusted to quote its paths correctly.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.working_root.to_string_lossy().chars().any(char::is_whitespace) {
            return Err(ConfigurationError::WhitespaceInPath(self.working_root.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(working_root: PathBuf) -> DriverConfig {
        DriverConfig {
            solver_binary: "/bin/true".into(),
            working_root,
            initial_timestep: default_initial_timestep(),
            min_timestep: default_min_timestep(),
            mass_flow_timestep_param: default_mass_flow_timestep_param(),
            min_mass_flow_timestep: default_min_mass_flow_timestep(),
            skip_reaches: HashSet::default(),
            keep_original_outputs: default_keep_original_outputs(),
            delete_upstream_flux_files: false,
        }
    }

    #[test]
    fn whitespace_in_working_root_is_rejected_before_any_work_starts() {
        let err = config(PathBuf::from("/tmp/bad dir")).validate().unwrap_err();
        assert!(matches!(err, ConfigurationError::WhitespaceInPath(_)));
    }

    #[test]
    fn clean_working_root_validates() {
        config(PathBuf::from("/tmp/clean-dir")).validate().unwrap();
    }
}
