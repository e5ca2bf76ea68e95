//! The analyze command: config → repositories → aggregation → cluster probe
//! → analysis schedule → report.
//!
//! Aggregation errors abort the run. Cluster unavailability never does: it
//! downgrades the dynamic capability and the run proceeds with whatever is
//! left enabled.

use crate::aggregator::Aggregator;
use crate::analysis::AnalysisScheduler;
use crate::cluster::{ClusterContext, SessionSource};
use crate::config::AppConfig;
use crate::io::{create_writer, OutputFormat, SmellReport};
use crate::repository::acquire_repositories;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub struct AnalyzeConfig {
    pub context: PathBuf,
    pub config: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub no_dynamic: bool,
    pub no_static: bool,
    pub jobs: Option<usize>,
}

pub fn handle_analyze(options: AnalyzeConfig) -> Result<()> {
    if let Some(jobs) = options.jobs {
        // a pool may already exist when called twice in-process; keep going
        let _ = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global();
    }

    let config = AppConfig::load(&options.config)?;
    let repositories = acquire_repositories(&config, &options.context)?;

    let aggregator = Aggregator::new(&config, &repositories);
    let (objects, services) = aggregator.build()?;
    log::info!(
        "application model ready: {} objects, {} services",
        objects.len(),
        services.len()
    );

    let static_enabled = !options.no_static;
    let cluster = if options.no_dynamic {
        None
    } else {
        ClusterContext::acquire()
    };
    let dynamic_enabled = cluster.is_some();

    let scheduler = AnalysisScheduler::new();
    let outcome = scheduler.run(
        &objects,
        static_enabled,
        dynamic_enabled,
        cluster.as_ref().map(|c| c as &dyn SessionSource),
    );

    let report = SmellReport::from_outcome(outcome);
    let mut writer = create_writer(options.format, options.output.as_deref())?;
    writer
        .write_report(&report)
        .context("failed to write report")?;

    Ok(())
}
