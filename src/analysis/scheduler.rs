//! The analysis scheduler.
//!
//! Runs every registered analysis whose required capability is enabled,
//! isolating per-analysis failures: one mis-behaving analysis (dynamic ones
//! in particular depend on external cluster reachability) must never
//! prevent the rest from reporting.
//!
//! Per analysis the outcome is one of Skipped (capability disabled),
//! Ran-Ok (result collected) or Ran-Failed (recorded as a diagnostic,
//! contributes no result). Static analyses run on worker threads; their
//! results are collected back in registration order, so output order is
//! deterministic for identical inputs and registry. All static analyses
//! run and report before the dynamic ones, each of which acquires its own
//! session.

use crate::analysis::{default_registry, RegisteredAnalysis};
use crate::cluster::SessionSource;
use crate::core::{AnalysisResult, ApplicationObject};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

/// A contained analysis failure, surfaced through the diagnostic channel
/// rather than the result list.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisFailure {
    pub analysis: String,
    pub error: String,
}

/// Everything one scheduler run produced.
#[derive(Debug, Default)]
pub struct SchedulerOutcome {
    /// Results of every Ran-Ok analysis, in execution order.
    pub results: Vec<AnalysisResult>,
    /// Diagnostics of every Ran-Failed analysis.
    pub failures: Vec<AnalysisFailure>,
}

pub struct AnalysisScheduler {
    analyses: Vec<RegisteredAnalysis>,
}

impl Default for AnalysisScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisScheduler {
    /// Scheduler over the built-in registry.
    pub fn new() -> Self {
        Self {
            analyses: default_registry(),
        }
    }

    /// Scheduler over an explicit registry, in the given order.
    pub fn with_registry(analyses: Vec<RegisteredAnalysis>) -> Self {
        Self { analyses }
    }

    pub fn register(&mut self, analysis: RegisteredAnalysis) {
        self.analyses.push(analysis);
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    /// Run the schedule. With both capabilities disabled this returns an
    /// empty outcome; that is a valid configuration, not a failure.
    pub fn run(
        &self,
        objects: &[Arc<ApplicationObject>],
        static_enabled: bool,
        dynamic_enabled: bool,
        sessions: Option<&dyn SessionSource>,
    ) -> SchedulerOutcome {
        let mut outcome = SchedulerOutcome::default();

        self.run_static(objects, static_enabled, &mut outcome);
        self.run_dynamic(objects, dynamic_enabled, sessions, &mut outcome);

        log::info!(
            "analysis schedule complete: {} results, {} failures",
            outcome.results.len(),
            outcome.failures.len()
        );
        outcome
    }

    fn run_static(
        &self,
        objects: &[Arc<ApplicationObject>],
        enabled: bool,
        outcome: &mut SchedulerOutcome,
    ) {
        let analyses: Vec<_> = self
            .analyses
            .iter()
            .filter_map(|entry| match entry {
                RegisteredAnalysis::Static(analysis) => Some(analysis.as_ref()),
                RegisteredAnalysis::Dynamic(_) => None,
            })
            .collect();

        if !enabled {
            for analysis in analyses {
                log::debug!("skipping static analysis {}: static disabled", analysis.id());
            }
            return;
        }

        // indexed parallel map keeps registration order in the collected Vec
        let runs: Vec<_> = analyses
            .par_iter()
            .map(|analysis| (analysis.id(), analysis.run(objects)))
            .collect();

        for (id, run) in runs {
            record(id, run, outcome);
        }
    }

    fn run_dynamic(
        &self,
        objects: &[Arc<ApplicationObject>],
        enabled: bool,
        sessions: Option<&dyn SessionSource>,
        outcome: &mut SchedulerOutcome,
    ) {
        for entry in &self.analyses {
            let analysis = match entry {
                RegisteredAnalysis::Dynamic(analysis) => analysis.as_ref(),
                RegisteredAnalysis::Static(_) => continue,
            };
            if !enabled {
                log::debug!(
                    "skipping dynamic analysis {}: dynamic disabled",
                    analysis.id()
                );
                continue;
            }

            // one independently acquired session per dynamic analysis
            let run = match sessions {
                Some(source) => source
                    .open_session()
                    .and_then(|session| analysis.run(objects, session.as_ref())),
                None => Err(anyhow::anyhow!("no cluster session source available")),
            };
            record(analysis.id(), run, outcome);
        }
    }
}

fn record(id: &str, run: anyhow::Result<AnalysisResult>, outcome: &mut SchedulerOutcome) {
    match run {
        Ok(result) => {
            log::debug!(
                "analysis {} detected {} smells",
                id,
                result.smells_detected.len()
            );
            outcome.results.push(result);
        }
        Err(error) => {
            log::warn!("analysis {id} failed: {error:#}");
            outcome.failures.push(AnalysisFailure {
                analysis: id.to_string(),
                error: format!("{error:#}"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{DynamicAnalysis, StaticAnalysis};
    use crate::cluster::{ClusterSession, LiveService};
    use anyhow::anyhow;
    use std::collections::BTreeSet;

    struct Healthy(&'static str);

    impl StaticAnalysis for Healthy {
        fn id(&self) -> &'static str {
            self.0
        }
        fn run(&self, _objects: &[Arc<ApplicationObject>]) -> anyhow::Result<AnalysisResult> {
            Ok(AnalysisResult::clean(self.0, "fine"))
        }
    }

    struct Failing(&'static str);

    impl StaticAnalysis for Failing {
        fn id(&self) -> &'static str {
            self.0
        }
        fn run(&self, _objects: &[Arc<ApplicationObject>]) -> anyhow::Result<AnalysisResult> {
            Err(anyhow!("boom"))
        }
    }

    struct DynOk(&'static str);

    impl DynamicAnalysis for DynOk {
        fn id(&self) -> &'static str {
            self.0
        }
        fn run(
            &self,
            _objects: &[Arc<ApplicationObject>],
            session: &dyn ClusterSession,
        ) -> anyhow::Result<AnalysisResult> {
            let count = session.list_services()?.len();
            Ok(AnalysisResult::new(
                self.0,
                BTreeSet::new(),
                format!("{count} live services"),
            ))
        }
    }

    struct StubSessions;

    struct StubSession;

    impl ClusterSession for StubSession {
        fn list_services(&self) -> anyhow::Result<Vec<LiveService>> {
            Ok(vec![LiveService {
                name: "orders".into(),
                namespace: "default".into(),
                service_type: "ClusterIP".into(),
            }])
        }
    }

    impl crate::cluster::SessionSource for StubSessions {
        fn open_session(&self) -> anyhow::Result<Box<dyn ClusterSession>> {
            Ok(Box::new(StubSession))
        }
    }

    fn ids(outcome: &SchedulerOutcome) -> Vec<&str> {
        outcome
            .results
            .iter()
            .map(|r| r.generating_analysis.as_str())
            .collect()
    }

    #[test]
    fn both_capabilities_disabled_returns_empty() {
        let scheduler = AnalysisScheduler::new();
        let outcome = scheduler.run(&[], false, false, None);
        assert!(outcome.results.is_empty());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn failure_is_isolated_from_siblings() {
        let scheduler = AnalysisScheduler::with_registry(vec![
            RegisteredAnalysis::Static(Box::new(Healthy("a"))),
            RegisteredAnalysis::Static(Box::new(Failing("b"))),
            RegisteredAnalysis::Static(Box::new(Healthy("c"))),
        ]);
        let outcome = scheduler.run(&[], true, false, None);
        assert_eq!(ids(&outcome), vec!["a", "c"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].analysis, "b");
        assert!(outcome.failures[0].error.contains("boom"));
    }

    #[test]
    fn results_follow_registration_order() {
        let scheduler = AnalysisScheduler::with_registry(vec![
            RegisteredAnalysis::Static(Box::new(Healthy("third"))),
            RegisteredAnalysis::Static(Box::new(Healthy("first"))),
            RegisteredAnalysis::Static(Box::new(Healthy("second"))),
        ]);
        for _ in 0..10 {
            let outcome = scheduler.run(&[], true, false, None);
            assert_eq!(ids(&outcome), vec!["third", "first", "second"]);
        }
    }

    #[test]
    fn dynamic_disabled_skips_dynamic_analyses() {
        let scheduler = AnalysisScheduler::with_registry(vec![
            RegisteredAnalysis::Static(Box::new(Healthy("static"))),
            RegisteredAnalysis::Dynamic(Box::new(DynOk("dynamic"))),
        ]);
        let outcome = scheduler.run(&[], true, false, Some(&StubSessions));
        assert_eq!(ids(&outcome), vec!["static"]);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn dynamic_analysis_uses_its_session() {
        let scheduler = AnalysisScheduler::with_registry(vec![RegisteredAnalysis::Dynamic(
            Box::new(DynOk("dynamic")),
        )]);
        let outcome = scheduler.run(&[], false, true, Some(&StubSessions));
        assert_eq!(outcome.results[0].description, "1 live services");
    }

    #[test]
    fn dynamic_without_session_source_is_a_contained_failure() {
        let scheduler = AnalysisScheduler::with_registry(vec![
            RegisteredAnalysis::Dynamic(Box::new(DynOk("dynamic"))),
            RegisteredAnalysis::Static(Box::new(Healthy("static"))),
        ]);
        let outcome = scheduler.run(&[], true, true, None);
        assert_eq!(ids(&outcome), vec!["static"]);
        assert_eq!(outcome.failures[0].analysis, "dynamic");
    }
}
