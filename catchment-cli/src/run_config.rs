// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use reach_driver::DriverConfig;
use reach_graph::{ReachAttributes, ReachId};
use scheduler::SchedulerConfig;
use serde::Deserialize;

/// The run configuration TOML file (section 4.9): one `[scheduler]` table, one `[driver]`
/// table, and the reach table itself.
#[derive(Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub driver: DriverConfig,
    pub reach: Vec<ReachSpec>,
}

#[derive(Deserialize)]
pub struct ReachSpec {
    pub id: String,
    #[serde(default)]
    pub downstream: Vec<String>,
    #[serde(default)]
    pub has_direct_loading: bool,
    #[serde(default)]
    pub attributes: ReachAttributesSpec,
}

impl ReachSpec {
    pub fn downstream_ids(&self) -> Vec<ReachId> {
        self.downstream.iter().map(|d| ReachId::new(d.as_str())).collect()
    }
}

#[derive(Deserialize, Default, Clone)]
pub struct ReachAttributesSpec {
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub bank_slope: f64,
    #[serde(default)]
    pub suspended_solids_concentration: f64,
    #[serde(default)]
    pub organic_matter_content: f64,
    #[serde(default)]
    pub bulk_density: f64,
    #[serde(default)]
    pub porosity: f64,
    #[serde(default)]
    pub centroid_x: f64,
    #[serde(default)]
    pub centroid_y: f64,
}

impl From<ReachAttributesSpec> for ReachAttributes {
    fn from(spec: ReachAttributesSpec) -> Self {
        ReachAttributes {
            length: spec.length,
            width: spec.width,
            bank_slope: spec.bank_slope,
            suspended_solids_concentration: spec.suspended_solids_concentration,
            organic_matter_content: spec.organic_matter_content,
            bulk_density: spec.bulk_density,
            porosity: spec.porosity,
            centroid_x: spec.centroid_x,
            centroid_y: spec.centroid_y,
        }
    }
}
