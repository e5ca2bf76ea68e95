//! Kubernetes manifest parser.
//!
//! A manifest file may hold several YAML documents; each document becomes
//! one `KubernetesResource` object. The parser runs against the current
//! service registry so resources can be matched to already-declared
//! application services by label or name.

use crate::core::{
    ApplicationObject, ContainerSpec, KubernetesResource, ObjectPayload, ServiceRegistry,
};
use crate::errors::ParseError;
use crate::repository::LocalRepository;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub struct KubernetesParser<'a> {
    repository: &'a LocalRepository,
    path: PathBuf,
    registry: &'a ServiceRegistry,
}

impl<'a> KubernetesParser<'a> {
    pub fn new(
        repository: &'a LocalRepository,
        path: impl Into<PathBuf>,
        registry: &'a ServiceRegistry,
    ) -> Self {
        Self {
            repository,
            path: path.into(),
            registry,
        }
    }

    pub fn parse(&self) -> Result<Vec<ApplicationObject>, ParseError> {
        let content = self.repository.read_artifact(&self.path)?;
        let mut objects = Vec::new();

        for document in serde_yaml::Deserializer::from_str(&content) {
            let value = serde_yaml::Value::deserialize(document)
                .map_err(|e| ParseError::new(&self.path, format!("invalid YAML: {e}")))?;
            if value.is_null() {
                continue;
            }
            let resource = self.resource_from_document(&value)?;
            log::debug!(
                "parsed kubernetes resource {}/{} from {}",
                resource.kind,
                resource.name,
                self.path.display()
            );
            objects.push(ApplicationObject::new(
                self.path.clone(),
                ObjectPayload::Kubernetes(resource),
            ));
        }

        Ok(objects)
    }

    fn resource_from_document(
        &self,
        doc: &serde_yaml::Value,
    ) -> Result<KubernetesResource, ParseError> {
        let api_version = scalar(doc.get("apiVersion"))
            .ok_or_else(|| ParseError::new(&self.path, "document has no apiVersion"))?;
        let kind = scalar(doc.get("kind"))
            .ok_or_else(|| ParseError::new(&self.path, "document has no kind"))?;

        let metadata = doc.get("metadata");
        let name = scalar(metadata.and_then(|m| m.get("name")))
            .ok_or_else(|| ParseError::new(&self.path, "document has no metadata.name"))?;
        let namespace = scalar(metadata.and_then(|m| m.get("namespace")));
        let labels = string_map(metadata.and_then(|m| m.get("labels")));

        let matched_service = self.match_service(&name, &labels);

        let mut resource = KubernetesResource {
            api_version,
            kind,
            name,
            namespace,
            labels,
            matched_service,
            containers: Vec::new(),
            service_type: None,
            service_ports: Vec::new(),
        };

        if resource.kind == "Service" {
            let spec = doc.get("spec");
            // absent spec.type means ClusterIP
            resource.service_type = Some(
                scalar(spec.and_then(|s| s.get("type"))).unwrap_or_else(|| "ClusterIP".to_string()),
            );
            resource.service_ports = port_list(spec.and_then(|s| s.get("ports")));
        } else if resource.is_workload() {
            resource.containers = containers(pod_spec(doc, &resource.kind));
        }

        Ok(resource)
    }

    /// Match a resource to a declared service by its `app` label, falling
    /// back to the resource name.
    fn match_service(&self, name: &str, labels: &BTreeMap<String, String>) -> Option<String> {
        if let Some(app) = labels.get("app") {
            if self.registry.contains(app) {
                return Some(app.clone());
            }
        }
        if self.registry.contains(name) {
            return Some(name.to_string());
        }
        None
    }
}

fn scalar(value: Option<&serde_yaml::Value>) -> Option<String> {
    let value = value?;
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    if let Some(n) = value.as_u64() {
        return Some(n.to_string());
    }
    value.as_bool().map(|b| b.to_string())
}

fn string_map(value: Option<&serde_yaml::Value>) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    if let Some(mapping) = value.and_then(|v| v.as_mapping()) {
        for (key, val) in mapping {
            if let (Some(key), Some(val)) = (key.as_str(), scalar(Some(val))) {
                map.insert(key.to_string(), val);
            }
        }
    }
    map
}

fn port_list(value: Option<&serde_yaml::Value>) -> Vec<u16> {
    let mut ports = Vec::new();
    if let Some(entries) = value.and_then(|v| v.as_sequence()) {
        for entry in entries {
            if let Some(port) = entry.get("port").and_then(|p| p.as_u64()) {
                if port <= u16::MAX as u64 {
                    ports.push(port as u16);
                }
            }
        }
    }
    ports
}

/// Locate the pod spec of a workload document.
fn pod_spec<'v>(doc: &'v serde_yaml::Value, kind: &str) -> Option<&'v serde_yaml::Value> {
    let spec = doc.get("spec")?;
    match kind {
        "Pod" => Some(spec),
        "CronJob" => spec
            .get("jobTemplate")?
            .get("spec")?
            .get("template")?
            .get("spec"),
        _ => spec.get("template")?.get("spec"),
    }
}

fn containers(pod_spec: Option<&serde_yaml::Value>) -> Vec<ContainerSpec> {
    let mut result = Vec::new();
    let entries = match pod_spec
        .and_then(|s| s.get("containers"))
        .and_then(|c| c.as_sequence())
    {
        Some(entries) => entries,
        None => return result,
    };

    for entry in entries {
        let mut env = BTreeMap::new();
        if let Some(vars) = entry.get("env").and_then(|e| e.as_sequence()) {
            for var in vars {
                let name = scalar(var.get("name"));
                let value = scalar(var.get("value"));
                if let (Some(name), Some(value)) = (name, value) {
                    env.insert(name, value);
                }
            }
        }

        let mut ports = Vec::new();
        if let Some(entries) = entry.get("ports").and_then(|p| p.as_sequence()) {
            for port in entries {
                if let Some(port) = port.get("containerPort").and_then(|p| p.as_u64()) {
                    if port <= u16::MAX as u64 {
                        ports.push(port as u16);
                    }
                }
            }
        }

        result.push(ContainerSpec {
            name: scalar(entry.get("name")).unwrap_or_default(),
            image: scalar(entry.get("image")),
            env,
            ports,
            has_liveness_probe: entry.get("livenessProbe").is_some(),
            has_readiness_probe: entry.get("readinessProbe").is_some(),
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Service;
    use indoc::indoc;
    use std::fs;
    use tempfile::TempDir;

    fn repo_with(path: &str, content: &str) -> (TempDir, LocalRepository) {
        let dir = TempDir::new().unwrap();
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
        let repo = LocalRepository::new("test", dir.path());
        (dir, repo)
    }

    fn registry_with(names: &[&str]) -> ServiceRegistry {
        let mut registry = ServiceRegistry::new();
        for name in names {
            registry.insert(Service::new(*name));
        }
        registry
    }

    const DEPLOYMENT: &str = indoc! {"
        apiVersion: apps/v1
        kind: Deployment
        metadata:
          name: orders-deploy
          labels:
            app: orders
        spec:
          template:
            spec:
              containers:
                - name: orders
                  image: registry.local/orders:1.2
                  env:
                    - name: DB_URL
                      value: postgres://db:5432/orders
                  ports:
                    - containerPort: 8080
                  livenessProbe:
                    httpGet:
                      path: /healthz
                      port: 8080
    "};

    #[test]
    fn parses_deployment_containers() {
        let (_dir, repo) = repo_with("k8s/orders-deploy.yaml", DEPLOYMENT);
        let registry = registry_with(&["orders"]);
        let parser = KubernetesParser::new(&repo, "k8s/orders-deploy.yaml", &registry);
        let objects = parser.parse().unwrap();

        assert_eq!(objects.len(), 1);
        let resource = objects[0].as_kubernetes().unwrap();
        assert_eq!(resource.kind, "Deployment");
        assert_eq!(resource.matched_service.as_deref(), Some("orders"));
        assert_eq!(resource.containers.len(), 1);
        let container = &resource.containers[0];
        assert_eq!(container.ports, vec![8080]);
        assert!(container.has_liveness_probe);
        assert!(!container.has_readiness_probe);
        assert_eq!(container.env["DB_URL"], "postgres://db:5432/orders");
    }

    #[test]
    fn parses_multi_document_manifest() {
        let manifest = indoc! {"
            apiVersion: v1
            kind: Service
            metadata:
              name: orders
            spec:
              type: NodePort
              ports:
                - port: 80
            ---
            apiVersion: apps/v1
            kind: Deployment
            metadata:
              name: orders-deploy
            spec:
              template:
                spec:
                  containers:
                    - name: orders
        "};
        let (_dir, repo) = repo_with("k8s/all.yaml", manifest);
        let registry = registry_with(&["orders"]);
        let objects = KubernetesParser::new(&repo, "k8s/all.yaml", &registry)
            .parse()
            .unwrap();

        assert_eq!(objects.len(), 2);
        let service = objects[0].as_kubernetes().unwrap();
        assert_eq!(service.service_type.as_deref(), Some("NodePort"));
        assert_eq!(service.service_ports, vec![80]);
        assert!(service.is_externally_exposed());
        assert_eq!(service.matched_service.as_deref(), Some("orders"));
    }

    #[test]
    fn service_without_type_defaults_to_cluster_ip() {
        let manifest = indoc! {"
            apiVersion: v1
            kind: Service
            metadata:
              name: internal
            spec:
              ports:
                - port: 9000
        "};
        let (_dir, repo) = repo_with("k8s/svc.yaml", manifest);
        let registry = ServiceRegistry::new();
        let objects = KubernetesParser::new(&repo, "k8s/svc.yaml", &registry)
            .parse()
            .unwrap();
        let resource = objects[0].as_kubernetes().unwrap();
        assert_eq!(resource.service_type.as_deref(), Some("ClusterIP"));
        assert!(!resource.is_externally_exposed());
    }

    #[test]
    fn document_without_kind_is_a_parse_error() {
        let (_dir, repo) = repo_with("k8s/bad.yaml", "apiVersion: v1\nmetadata:\n  name: x\n");
        let registry = ServiceRegistry::new();
        let err = KubernetesParser::new(&repo, "k8s/bad.yaml", &registry)
            .parse()
            .unwrap_err();
        assert!(err.to_string().contains("no kind"));
    }

    #[test]
    fn empty_documents_are_skipped() {
        let (_dir, repo) = repo_with("k8s/empty.yaml", "---\n---\n");
        let registry = ServiceRegistry::new();
        let objects = KubernetesParser::new(&repo, "k8s/empty.yaml", &registry)
            .parse()
            .unwrap();
        assert!(objects.is_empty());
    }
}
