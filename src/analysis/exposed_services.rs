//! Dynamic analysis: compares the live cluster's service exposure against
//! the modeled topology. Services reachable from outside the cluster that
//! are not gateways widen the attack surface silently, whatever the
//! manifests in the repository say.

use crate::analysis::{looks_like_gateway, DynamicAnalysis};
use crate::cluster::ClusterSession;
use crate::core::{AnalysisResult, ApplicationObject, Smell};
use anyhow::Result;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::Arc;

pub struct ExposedClusterServices;

impl DynamicAnalysis for ExposedClusterServices {
    fn id(&self) -> &'static str {
        "exposed-cluster-services"
    }

    fn run(
        &self,
        _objects: &[Arc<ApplicationObject>],
        session: &dyn ClusterSession,
    ) -> Result<AnalysisResult> {
        let live_services = session.list_services()?;

        let exposed: Vec<_> = live_services
            .iter()
            .filter(|service| service.is_externally_exposed())
            .filter(|service| !looks_like_gateway(&service.name, &Default::default()))
            .collect();

        if exposed.is_empty() {
            return Ok(AnalysisResult::clean(
                self.id(),
                "no non-gateway service is exposed in the running cluster",
            ));
        }

        let mut description = format!(
            "{} services are externally reachable in the running cluster:",
            exposed.len()
        );
        for service in &exposed {
            write!(
                description,
                "\n{}/{} is exposed via {}",
                service.namespace, service.name, service.service_type
            )?;
        }
        Ok(AnalysisResult::new(
            self.id(),
            BTreeSet::from([Smell::PubliclyExposedService]),
            description,
        ))
    }
}
