//! Detects workloads whose pod template bundles several application
//! containers. Co-deployed services scale and fail together, defeating
//! independent deployability. Well-known sidecar images are not counted.

use crate::analysis::StaticAnalysis;
use crate::core::{AnalysisResult, ApplicationObject, ContainerSpec, Smell};
use anyhow::Result;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::Arc;

const SIDECAR_IMAGE_PREFIXES: &[&str] = &[
    "istio/proxyv2",
    "envoyproxy/envoy",
    "cr.l5d.io/linkerd/proxy",
    "fluent/fluent-bit",
    "jaegertracing/jaeger-agent",
];

pub struct MultipleServicesPerPod;

impl StaticAnalysis for MultipleServicesPerPod {
    fn id(&self) -> &'static str {
        "multiple-services-per-pod"
    }

    fn run(&self, objects: &[Arc<ApplicationObject>]) -> Result<AnalysisResult> {
        let mut findings = Vec::new();

        for object in objects {
            let resource = match object.as_kubernetes() {
                Some(resource) if resource.is_workload() => resource,
                _ => continue,
            };
            let application_containers: Vec<_> = resource
                .containers
                .iter()
                .filter(|container| !is_sidecar(container))
                .collect();
            if application_containers.len() > 1 {
                findings.push(format!(
                    "{} '{}' runs {} application containers: {}",
                    resource.kind,
                    resource.name,
                    application_containers.len(),
                    application_containers
                        .iter()
                        .map(|c| c.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
        }

        if findings.is_empty() {
            return Ok(AnalysisResult::clean(
                self.id(),
                "every workload runs a single application container",
            ));
        }

        let mut description = String::from("workloads bundling several services:");
        for finding in &findings {
            write!(description, "\n{finding}")?;
        }
        Ok(AnalysisResult::new(
            self.id(),
            BTreeSet::from([Smell::MultipleServicesPerPod]),
            description,
        ))
    }
}

fn is_sidecar(container: &ContainerSpec) -> bool {
    container
        .image
        .as_deref()
        .map(|image| {
            SIDECAR_IMAGE_PREFIXES
                .iter()
                .any(|prefix| image.starts_with(prefix))
        })
        .unwrap_or(false)
}
