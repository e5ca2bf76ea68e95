//! The aggregator: turns per-source-type parse results into one
//! deduplicated, cross-linked application graph plus the populated service
//! registry.
//!
//! The pass order is part of the observable contract:
//!
//! 1. seed one `Service` per declared name
//! 2. apply declared per-service properties
//! 3. Kubernetes source: parse every glob match against the current
//!    registry, append all outputs (no dedup for Kubernetes objects)
//! 4. per declared service: parse its Dockerfile and OpenAPI artifacts,
//!    attach the service's property snapshot by value, record descriptors
//! 5. append Dockerfile candidates, deduplicated by path (first kept)
//! 6. append OpenAPI candidates, deduplicated by path independently
//!
//! Any parser failure aborts the whole aggregation: a partial model must
//! never be analyzed.

use crate::config::AppConfig;
use crate::core::{ApplicationObject, Service, ServiceRegistry};
use crate::errors::AggregationError;
use crate::parsers::{DockerfileParser, KubernetesParser, OpenApiParser};
use crate::repository::LocalRepository;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct Aggregator<'a> {
    config: &'a AppConfig,
    repositories: &'a HashMap<String, LocalRepository>,
}

impl<'a> Aggregator<'a> {
    pub fn new(config: &'a AppConfig, repositories: &'a HashMap<String, LocalRepository>) -> Self {
        Self {
            config,
            repositories,
        }
    }

    pub fn build(
        &self,
    ) -> Result<(Vec<Arc<ApplicationObject>>, ServiceRegistry), AggregationError> {
        log::info!("aggregating the application model");

        // step 1: every declared service exists before any parsing starts
        let mut registry = ServiceRegistry::new();
        for declared in &self.config.services {
            registry.insert(Service::new(&declared.name));
        }

        // step 2: attach declared properties
        for declaration in &self.config.properties {
            let service = registry
                .get_mut(&declaration.service)
                .ok_or_else(|| AggregationError::UnknownService(declaration.service.clone()))?;
            service.properties = Some(declaration.properties.clone());
        }

        let mut graph: Vec<Arc<ApplicationObject>> = Vec::new();

        // step 3: kubernetes source, appended without dedup
        if let Some(source) = &self.config.deployment.kubernetes {
            let repository = self.repository(&source.repository)?;
            let artifacts = repository.artifacts_by_pattern(&source.glob)?;
            log::debug!(
                "kubernetes source '{}' matched {} artifacts",
                source.glob,
                artifacts.len()
            );
            for artifact in artifacts {
                let parser = KubernetesParser::new(repository, artifact, &registry);
                for object in parser.parse()? {
                    graph.push(Arc::new(object));
                }
            }
        }

        // step 4: per-service dockerfiles and openapi specs
        let mut dockerfile_candidates: Vec<Arc<ApplicationObject>> = Vec::new();
        let mut openapi_candidates: Vec<Arc<ApplicationObject>> = Vec::new();

        for declared in &self.config.services {
            let repository = self.repository(&declared.repository)?;
            let snapshot = registry
                .get(&declared.name)
                .and_then(|service| service.properties.clone());

            if let Some(path) = &declared.dockerfile {
                let parser = DockerfileParser::new(repository, path, declared.image.as_deref());
                let objects = decorate(parser.parse()?, snapshot.as_ref());
                if let Some(first) = objects.first() {
                    if let Some(service) = registry.get_mut(&declared.name) {
                        service.descriptor = Some(Arc::clone(first));
                    }
                }
                dockerfile_candidates.extend(objects);
            }

            if let Some(path) = &declared.openapi {
                let parser = OpenApiParser::new(repository, path);
                let objects = decorate(parser.parse()?, snapshot.as_ref());
                // single descriptor slot: an openapi object overwrites a
                // dockerfile descriptor recorded above
                if let Some(first) = objects.first() {
                    if let Some(service) = registry.get_mut(&declared.name) {
                        service.descriptor = Some(Arc::clone(first));
                    }
                }
                openapi_candidates.extend(objects);
            }
        }

        // steps 5 and 6: per-category dedup, first occurrence kept
        graph.extend(dedup_by_path(dockerfile_candidates));
        graph.extend(dedup_by_path(openapi_candidates));

        for object in &graph {
            log::debug!(
                "model object: {} ({})",
                object.path.display(),
                object.category().display_name()
            );
        }
        log::info!("finished aggregation: {} resulting objects", graph.len());

        Ok((graph, registry))
    }

    fn repository(&self, name: &str) -> Result<&'a LocalRepository, AggregationError> {
        self.repositories
            .get(name)
            .ok_or_else(|| AggregationError::UnknownRepository(name.to_string()))
    }
}

/// Attach a property snapshot by value to freshly parsed objects.
fn decorate(
    objects: Vec<ApplicationObject>,
    snapshot: Option<&crate::core::PropertyMap>,
) -> Vec<Arc<ApplicationObject>> {
    objects
        .into_iter()
        .map(|mut object| {
            if let Some(properties) = snapshot {
                object.service_properties = Some(properties.clone());
            }
            Arc::new(object)
        })
        .collect()
}

/// Keep the first occurrence of every artifact path, in encounter order.
fn dedup_by_path(candidates: Vec<Arc<ApplicationObject>>) -> Vec<Arc<ApplicationObject>> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|object| seen.insert(object.path.clone()))
        .collect()
}
