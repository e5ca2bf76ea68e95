//! Shared data model: application objects, services, smells, and analysis
//! results.
//!
//! Everything here is plain data. `ApplicationObject`s are immutable once
//! placed in the graph; the graph hands out `Arc`s so analyses may read it
//! concurrently and a `Service` descriptor can reference the same decorated
//! object that sits in the graph.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// Free-form service properties declared in config.
///
/// Values are arbitrary; a `BTreeMap` keeps serialization deterministic.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// Deduplication category of an application object.
///
/// Uniqueness of artifact paths is scoped per category, not globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectCategory {
    Kubernetes,
    DockerImage,
    OpenApi,
}

impl ObjectCategory {
    pub fn display_name(&self) -> &str {
        match self {
            ObjectCategory::Kubernetes => "kubernetes resource",
            ObjectCategory::DockerImage => "docker image spec",
            ObjectCategory::OpenApi => "openapi spec",
        }
    }
}

/// One entity of the application model, produced by a parser from a single
/// artifact and decorated by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationObject {
    /// Originating artifact path, relative to its repository root.
    /// Dedup key within the object's category.
    pub path: PathBuf,
    /// Snapshot of the owning service's properties, copied at attach time.
    /// Never aliased to the live service's mutable mapping.
    pub service_properties: Option<PropertyMap>,
    pub payload: ObjectPayload,
}

impl ApplicationObject {
    pub fn new(path: impl Into<PathBuf>, payload: ObjectPayload) -> Self {
        Self {
            path: path.into(),
            service_properties: None,
            payload,
        }
    }

    pub fn category(&self) -> ObjectCategory {
        match self.payload {
            ObjectPayload::Kubernetes(_) => ObjectCategory::Kubernetes,
            ObjectPayload::DockerImage(_) => ObjectCategory::DockerImage,
            ObjectPayload::OpenApi(_) => ObjectCategory::OpenApi,
        }
    }

    pub fn as_kubernetes(&self) -> Option<&KubernetesResource> {
        match &self.payload {
            ObjectPayload::Kubernetes(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn as_docker_image(&self) -> Option<&DockerImageSpec> {
        match &self.payload {
            ObjectPayload::DockerImage(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_openapi(&self) -> Option<&OpenApiSpec> {
        match &self.payload {
            ObjectPayload::OpenApi(spec) => Some(spec),
            _ => None,
        }
    }
}

/// Closed set of artifact-derived payload kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectPayload {
    Kubernetes(KubernetesResource),
    DockerImage(DockerImageSpec),
    OpenApi(OpenApiSpec),
}

/// One document of a Kubernetes manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubernetesResource {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub labels: BTreeMap<String, String>,
    /// Name of the declared application service this resource was matched
    /// to during parsing, if any.
    pub matched_service: Option<String>,
    /// Containers of the pod template, for workload kinds.
    pub containers: Vec<ContainerSpec>,
    /// `spec.type` for Service-kind resources.
    pub service_type: Option<String>,
    /// Exposed ports for Service-kind resources.
    pub service_ports: Vec<u16>,
}

impl KubernetesResource {
    /// Whether this resource describes pod-running workloads.
    pub fn is_workload(&self) -> bool {
        matches!(
            self.kind.as_str(),
            "Deployment" | "StatefulSet" | "DaemonSet" | "ReplicaSet" | "Job" | "CronJob" | "Pod"
        )
    }

    /// Whether this is a Service resource reachable from outside the cluster.
    pub fn is_externally_exposed(&self) -> bool {
        self.kind == "Service"
            && matches!(
                self.service_type.as_deref(),
                Some("NodePort") | Some("LoadBalancer")
            )
    }
}

/// A single container entry from a pod template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: Option<String>,
    pub env: BTreeMap<String, String>,
    pub ports: Vec<u16>,
    pub has_liveness_probe: bool,
    pub has_readiness_probe: bool,
}

/// The build-time shape of a service image, parsed from a Dockerfile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerImageSpec {
    /// Image name declared for the service in config, if any.
    pub image_name: Option<String>,
    /// Image of the first FROM instruction.
    pub base_image: String,
    pub exposed_ports: Vec<u16>,
    pub env: BTreeMap<String, String>,
    pub entrypoint: Vec<String>,
    pub cmd: Vec<String>,
}

/// Interface surface of a service, parsed from an OpenAPI document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiSpec {
    pub title: Option<String>,
    pub version: Option<String>,
    pub servers: Vec<String>,
    pub paths: Vec<String>,
    pub operation_count: usize,
}

/// One declared microservice.
///
/// Created when its name is first declared in config, mutated while the
/// aggregator discovers properties and descriptor objects, never destroyed
/// during a run.
#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub properties: Option<PropertyMap>,
    /// Primary descriptor object: the first parsed Dockerfile- or
    /// OpenAPI-derived object registered for this service. When both kinds
    /// are declared the later-parsed OpenAPI object overwrites the
    /// Dockerfile one (single-slot, last parsed wins).
    pub descriptor: Option<Arc<ApplicationObject>>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: None,
            descriptor: None,
        }
    }
}

/// Name-keyed registry of declared services.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Service>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, service: Service) {
        self.services.insert(service.name.clone(), service);
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Service> {
        self.services.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }
}

/// Closed set of detectable architectural smells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Smell {
    HardcodedEndpoint,
    NoApiGateway,
    MultipleServicesPerPod,
    MissingHealthProbe,
    UnversionedApi,
    PubliclyExposedService,
}

impl Smell {
    /// Short identifier used in reports.
    pub fn code(&self) -> &str {
        match self {
            Smell::HardcodedEndpoint => "hardcoded-endpoint",
            Smell::NoApiGateway => "no-api-gateway",
            Smell::MultipleServicesPerPod => "multiple-services-per-pod",
            Smell::MissingHealthProbe => "missing-health-probe",
            Smell::UnversionedApi => "unversioned-api",
            Smell::PubliclyExposedService => "publicly-exposed-service",
        }
    }
}

/// Output of a single analysis run. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub generating_analysis: String,
    pub smells_detected: BTreeSet<Smell>,
    pub description: String,
}

impl AnalysisResult {
    pub fn new(
        generating_analysis: impl Into<String>,
        smells_detected: BTreeSet<Smell>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            generating_analysis: generating_analysis.into(),
            smells_detected,
            description: description.into(),
        }
    }

    /// A result reporting no findings.
    pub fn clean(generating_analysis: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(generating_analysis, BTreeSet::new(), description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docker_payload() -> ObjectPayload {
        ObjectPayload::DockerImage(DockerImageSpec {
            image_name: None,
            base_image: "alpine:3.20".to_string(),
            exposed_ports: vec![8080],
            env: BTreeMap::new(),
            entrypoint: vec![],
            cmd: vec![],
        })
    }

    #[test]
    fn category_follows_payload() {
        let obj = ApplicationObject::new("svc/Dockerfile", docker_payload());
        assert_eq!(obj.category(), ObjectCategory::DockerImage);
        assert!(obj.as_docker_image().is_some());
        assert!(obj.as_kubernetes().is_none());
    }

    #[test]
    fn registry_insert_and_lookup() {
        let mut registry = ServiceRegistry::new();
        registry.insert(Service::new("orders"));
        assert!(registry.contains("orders"));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("payments").is_none());
    }

    #[test]
    fn smell_codes_are_distinct() {
        let all = [
            Smell::HardcodedEndpoint,
            Smell::NoApiGateway,
            Smell::MultipleServicesPerPod,
            Smell::MissingHealthProbe,
            Smell::UnversionedApi,
            Smell::PubliclyExposedService,
        ];
        let codes: BTreeSet<&str> = all.iter().map(|s| s.code()).collect();
        assert_eq!(codes.len(), all.len());
    }
}
