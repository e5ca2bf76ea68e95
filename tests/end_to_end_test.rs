//! Full pipeline: on-disk artifacts → aggregation → static schedule →
//! terminal report.

use indoc::indoc;
use smellmap::io::output::TerminalWriter;
use smellmap::{
    acquire_repositories, Aggregator, AnalysisScheduler, AppConfig, ReportWriter, SmellReport,
    Smell,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn a_smelly_application_is_reported_end_to_end() {
    let dir = TempDir::new().unwrap();
    let files: &[(&str, &str)] = &[
        (
            "orders/Dockerfile",
            indoc! {"
                FROM debian:bookworm-slim
                EXPOSE 8080
                ENV PAYMENTS_URL=http://payments.internal:8080
            "},
        ),
        (
            "orders/openapi.yaml",
            indoc! {"
                openapi: 3.0.0
                info:
                  title: Orders API
                paths:
                  /orders:
                    get: {}
            "},
        ),
        (
            "k8s/orders.yaml",
            indoc! {"
                apiVersion: apps/v1
                kind: Deployment
                metadata:
                  name: orders
                spec:
                  template:
                    spec:
                      containers:
                        - name: orders
                          image: registry.local/orders
                ---
                apiVersion: v1
                kind: Service
                metadata:
                  name: orders
                spec:
                  type: NodePort
                  ports:
                    - port: 80
                ---
                apiVersion: v1
                kind: Service
                metadata:
                  name: payments
                spec:
                  type: NodePort
                  ports:
                    - port: 80
            "},
        ),
    ];
    for (path, content) in files {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    let config = AppConfig::from_yaml(
        indoc! {"
            repositories:
              - name: main
                path: .
            deployment:
              kubernetes:
                repository: main
                glob: 'k8s/*.yaml'
            services:
              - name: orders
                repository: main
                dockerfile: orders/Dockerfile
                openapi: orders/openapi.yaml
        "},
        Path::new("smellmap.yaml"),
    )
    .unwrap();

    let repositories = acquire_repositories(&config, dir.path()).unwrap();
    let (objects, _services) = Aggregator::new(&config, &repositories).build().unwrap();
    assert_eq!(objects.len(), 5);

    let outcome = AnalysisScheduler::new().run(&objects, true, false, None);
    let detected: std::collections::BTreeSet<Smell> = outcome
        .results
        .iter()
        .flat_map(|result| result.smells_detected.iter().copied())
        .collect();

    assert!(detected.contains(&Smell::HardcodedEndpoint));
    assert!(detected.contains(&Smell::NoApiGateway));
    assert!(detected.contains(&Smell::MissingHealthProbe));
    assert!(detected.contains(&Smell::UnversionedApi));
    assert!(!detected.contains(&Smell::MultipleServicesPerPod));

    colored::control::set_override(false);
    let mut buffer = Vec::new();
    TerminalWriter::new(&mut buffer)
        .write_report(&SmellReport::from_outcome(outcome))
        .unwrap();
    let text = String::from_utf8(buffer).unwrap();

    assert!(text.contains("Analysis results:"));
    assert!(text.contains("hardcoded-endpoints - detected smells: hardcoded-endpoint"));
    assert!(text.contains("\tService 'orders' is exposed via NodePort"));
}
