//! Detects direct external exposure of several services with no gateway in
//! front of them. Clients wired to individual services inherit every
//! topology change; a single entry point decouples them.

use crate::analysis::{looks_like_gateway, StaticAnalysis};
use crate::core::{AnalysisResult, ApplicationObject, Smell};
use anyhow::Result;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::Arc;

pub struct NoApiGateway;

impl StaticAnalysis for NoApiGateway {
    fn id(&self) -> &'static str {
        "no-api-gateway"
    }

    fn run(&self, objects: &[Arc<ApplicationObject>]) -> Result<AnalysisResult> {
        let mut exposed = Vec::new();
        let mut gateway_present = false;

        for object in objects {
            let resource = match object.as_kubernetes() {
                Some(resource) if resource.is_externally_exposed() => resource,
                _ => continue,
            };
            if looks_like_gateway(&resource.name, &resource.labels) {
                gateway_present = true;
            } else {
                exposed.push(resource);
            }
        }

        // one exposed service with no gateway is taken to be the entry point
        if gateway_present || exposed.len() <= 1 {
            return Ok(AnalysisResult::clean(
                self.id(),
                "external exposure goes through a single entry point",
            ));
        }

        let mut description = format!(
            "{} services are exposed directly and no gateway was found:",
            exposed.len()
        );
        for resource in &exposed {
            write!(
                description,
                "\nService '{}' is exposed via {}",
                resource.name,
                resource.service_type.as_deref().unwrap_or("unknown")
            )?;
        }
        Ok(AnalysisResult::new(
            self.id(),
            BTreeSet::from([Smell::NoApiGateway]),
            description,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KubernetesResource, ObjectPayload};
    use std::collections::BTreeMap;

    fn service(name: &str, service_type: &str) -> Arc<ApplicationObject> {
        Arc::new(ApplicationObject::new(
            format!("k8s/{name}.yaml"),
            ObjectPayload::Kubernetes(KubernetesResource {
                api_version: "v1".into(),
                kind: "Service".into(),
                name: name.into(),
                namespace: None,
                labels: BTreeMap::new(),
                matched_service: None,
                containers: vec![],
                service_type: Some(service_type.into()),
                service_ports: vec![80],
            }),
        ))
    }

    #[test]
    fn several_exposed_services_without_gateway_smell() {
        let objects = vec![
            service("orders", "NodePort"),
            service("payments", "LoadBalancer"),
            service("internal", "ClusterIP"),
        ];
        let result = NoApiGateway.run(&objects).unwrap();
        assert!(result.smells_detected.contains(&Smell::NoApiGateway));
        assert!(result.description.contains("orders"));
        assert!(!result.description.contains("internal"));
    }

    #[test]
    fn gateway_service_clears_the_smell() {
        let objects = vec![
            service("api-gateway", "LoadBalancer"),
            service("orders", "NodePort"),
            service("payments", "NodePort"),
        ];
        let result = NoApiGateway.run(&objects).unwrap();
        assert!(result.smells_detected.is_empty());
    }

    #[test]
    fn single_exposed_service_is_clean() {
        let objects = vec![service("orders", "NodePort")];
        let result = NoApiGateway.run(&objects).unwrap();
        assert!(result.smells_detected.is_empty());
    }
}
