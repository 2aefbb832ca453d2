// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fs;
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use clap::Parser;
use fnv::FnvHashMap as HashMap;
use log::info;
use priority_oracle::PriorityOracle;
use reach_driver::ExternalSolverDriver;
use reach_graph::{Catchment, ReachAttributes, ReachId};
use scheduler::Scheduler;

mod run_config;

use run_config::RunConfig;

/// Runs a catchment of per-reach hydrological-solver simulations, respecting their
/// upstream/downstream dependencies and cleaning each reach's intermediate output as soon as
/// nothing downstream still needs it.
#[derive(Parser)]
#[command(name = "catchment")]
struct Opt {
    /// Path to the TOML run configuration: scheduler, driver and reach table.
    #[arg(long)]
    config: PathBuf,
}

fn main() {
    env_logger::init();
    let opt = Opt::parse();
    if let Err(e) = run(opt) {
        log::error!("{e}");
        exit(1);
    }
}

fn run(opt: Opt) -> Result<(), String> {
    let raw = fs::read_to_string(&opt.config)
        .map_err(|e| format!("reading {}: {e}", opt.config.display()))?;
    let config: RunConfig = toml::from_str(&raw).map_err(|e| format!("parsing {}: {e}", opt.config.display()))?;
    config.driver.validate().map_err(|e| e.to_string())?;

    let catchment = Catchment::new();
    for spec in &config.reach {
        catchment
            .add_reach(
                ReachId::new(spec.id.as_str()),
                ReachAttributes::from(spec.attributes.clone()),
                spec.downstream_ids(),
                spec.has_direct_loading,
            )
            .map_err(|e| e.to_string())?;
    }
    catchment.finalize().map_err(|e| e.to_string())?;
    info!("loaded catchment with {} reaches", catchment.len());

    let children: HashMap<ReachId, Vec<ReachId>> = catchment.children_map();
    let oracle = PriorityOracle::compute(&children);

    let driver = Arc::new(ExternalSolverDriver::new(config.driver));
    let scheduler = Scheduler::new(Arc::new(catchment), oracle, driver, config.scheduler);
    let summary = scheduler.run().map_err(|e| e.to_string())?;

    if summary.failed().is_empty() {
        Ok(())
    } else {
        Err(format!("{} reach(es) failed", summary.failed().len()))
    }
}
