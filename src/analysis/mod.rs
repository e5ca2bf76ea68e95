//! Analyses and their registry.
//!
//! An analysis declares a required capability: static analyses consume only
//! the object graph, dynamic ones additionally hold a live-cluster session.
//! The capability is a closed tag ([`RegisteredAnalysis`]); the analyses
//! behind it are pluggable trait objects.

pub mod api_gateway;
pub mod api_versioning;
pub mod exposed_services;
pub mod hardcoded_endpoints;
pub mod health_probes;
pub mod multiple_services;
pub mod scheduler;

pub use scheduler::{AnalysisFailure, AnalysisScheduler, SchedulerOutcome};

use crate::cluster::ClusterSession;
use crate::core::{AnalysisResult, ApplicationObject};
use anyhow::Result;
use std::sync::Arc;

/// Required execution capability of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Static,
    Dynamic,
}

/// An analysis that needs only the parsed object graph.
pub trait StaticAnalysis: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, objects: &[Arc<ApplicationObject>]) -> Result<AnalysisResult>;
}

/// An analysis that additionally queries the live cluster.
pub trait DynamicAnalysis: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(
        &self,
        objects: &[Arc<ApplicationObject>],
        session: &dyn ClusterSession,
    ) -> Result<AnalysisResult>;
}

/// One registry entry, tagged by capability.
pub enum RegisteredAnalysis {
    Static(Box<dyn StaticAnalysis>),
    Dynamic(Box<dyn DynamicAnalysis>),
}

impl RegisteredAnalysis {
    pub fn id(&self) -> &'static str {
        match self {
            RegisteredAnalysis::Static(analysis) => analysis.id(),
            RegisteredAnalysis::Dynamic(analysis) => analysis.id(),
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            RegisteredAnalysis::Static(_) => Capability::Static,
            RegisteredAnalysis::Dynamic(_) => Capability::Dynamic,
        }
    }
}

/// The built-in analyses, in their fixed registration order. Result order
/// in the report follows this order, so it must stay deterministic.
pub fn default_registry() -> Vec<RegisteredAnalysis> {
    vec![
        RegisteredAnalysis::Static(Box::new(hardcoded_endpoints::HardcodedEndpoints)),
        RegisteredAnalysis::Static(Box::new(multiple_services::MultipleServicesPerPod)),
        RegisteredAnalysis::Static(Box::new(api_gateway::NoApiGateway)),
        RegisteredAnalysis::Static(Box::new(health_probes::MissingHealthProbes)),
        RegisteredAnalysis::Static(Box::new(api_versioning::UnversionedApi)),
        RegisteredAnalysis::Dynamic(Box::new(exposed_services::ExposedClusterServices)),
    ]
}

/// Shared heuristic: whether a Kubernetes Service name or its labels mark
/// it as the application's gateway.
pub(crate) fn looks_like_gateway(name: &str, labels: &std::collections::BTreeMap<String, String>) -> bool {
    let name = name.to_ascii_lowercase();
    if name.contains("gateway") || name.contains("ingress") {
        return true;
    }
    labels.iter().any(|(key, value)| {
        let value = value.to_ascii_lowercase();
        key.eq_ignore_ascii_case("role") && (value.contains("gateway") || value.contains("ingress"))
    })
}
