//! Detects literal `host:port` endpoints baked into container images and
//! pod templates. Hardcoded peer addresses couple services to a concrete
//! deployment topology and bypass service discovery.

use crate::analysis::StaticAnalysis;
use crate::core::{AnalysisResult, ApplicationObject, Smell};
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::Arc;

static ENDPOINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:\d{1,3}\.){3}\d{1,3}|[A-Za-z][A-Za-z0-9.-]*[A-Za-z0-9]):\d{2,5}\b")
        .expect("endpoint pattern")
});

pub struct HardcodedEndpoints;

impl StaticAnalysis for HardcodedEndpoints {
    fn id(&self) -> &'static str {
        "hardcoded-endpoints"
    }

    fn run(&self, objects: &[Arc<ApplicationObject>]) -> Result<AnalysisResult> {
        let mut findings = Vec::new();

        for object in objects {
            if let Some(image) = object.as_docker_image() {
                for (key, value) in &image.env {
                    if let Some(endpoint) = endpoint_in(value) {
                        findings.push(format!(
                            "{}: ENV {} carries endpoint {}",
                            object.path.display(),
                            key,
                            endpoint
                        ));
                    }
                }
                for token in image.entrypoint.iter().chain(&image.cmd) {
                    if let Some(endpoint) = endpoint_in(token) {
                        findings.push(format!(
                            "{}: launch command carries endpoint {}",
                            object.path.display(),
                            endpoint
                        ));
                    }
                }
            }

            if let Some(resource) = object.as_kubernetes() {
                for container in &resource.containers {
                    for (key, value) in &container.env {
                        if let Some(endpoint) = endpoint_in(value) {
                            findings.push(format!(
                                "{}: container '{}' env {} carries endpoint {}",
                                object.path.display(),
                                container.name,
                                key,
                                endpoint
                            ));
                        }
                    }
                }
            }
        }

        if findings.is_empty() {
            return Ok(AnalysisResult::clean(
                self.id(),
                "no hardcoded endpoints found",
            ));
        }

        let mut description = String::from("hardcoded endpoints found:");
        for finding in &findings {
            write!(description, "\n{finding}")?;
        }
        Ok(AnalysisResult::new(
            self.id(),
            BTreeSet::from([Smell::HardcodedEndpoint]),
            description,
        ))
    }
}

fn endpoint_in(value: &str) -> Option<&str> {
    ENDPOINT.find(value).map(|m| m.as_str())
}
