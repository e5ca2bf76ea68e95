//! Detects workload containers deployed without liveness or readiness
//! probes. The platform cannot restart a wedged service or hold traffic
//! from a booting one it knows nothing about.

use crate::analysis::StaticAnalysis;
use crate::core::{AnalysisResult, ApplicationObject, Smell};
use anyhow::Result;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::Arc;

pub struct MissingHealthProbes;

impl StaticAnalysis for MissingHealthProbes {
    fn id(&self) -> &'static str {
        "missing-health-probes"
    }

    fn run(&self, objects: &[Arc<ApplicationObject>]) -> Result<AnalysisResult> {
        let mut findings = Vec::new();

        for object in objects {
            let resource = match object.as_kubernetes() {
                Some(resource) if resource.is_workload() => resource,
                _ => continue,
            };
            for container in &resource.containers {
                let mut missing = Vec::new();
                if !container.has_liveness_probe {
                    missing.push("liveness");
                }
                if !container.has_readiness_probe {
                    missing.push("readiness");
                }
                if !missing.is_empty() {
                    findings.push(format!(
                        "{} '{}' container '{}' has no {} probe",
                        resource.kind,
                        resource.name,
                        container.name,
                        missing.join(" or ")
                    ));
                }
            }
        }

        if findings.is_empty() {
            return Ok(AnalysisResult::clean(
                self.id(),
                "every workload container declares health probes",
            ));
        }

        let mut description = String::from("containers without health probes:");
        for finding in &findings {
            write!(description, "\n{finding}")?;
        }
        Ok(AnalysisResult::new(
            self.id(),
            BTreeSet::from([Smell::MissingHealthProbe]),
            description,
        ))
    }
}
