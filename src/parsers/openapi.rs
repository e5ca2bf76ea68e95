//! OpenAPI document parser. Accepts YAML or JSON (by extension) and
//! produces one `OpenApiSpec` object per document.

use crate::core::{ApplicationObject, ObjectPayload, OpenApiSpec};
use crate::errors::ParseError;
use crate::repository::LocalRepository;
use std::path::PathBuf;

const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

pub struct OpenApiParser<'a> {
    repository: &'a LocalRepository,
    path: PathBuf,
}

impl<'a> OpenApiParser<'a> {
    pub fn new(repository: &'a LocalRepository, path: impl Into<PathBuf>) -> Self {
        Self {
            repository,
            path: path.into(),
        }
    }

    pub fn parse(&self) -> Result<Vec<ApplicationObject>, ParseError> {
        let content = self.repository.read_artifact(&self.path)?;
        let document = self.deserialize(&content)?;

        let root = document
            .as_object()
            .ok_or_else(|| ParseError::new(&self.path, "document is not a mapping"))?;
        if !root.contains_key("openapi") && !root.contains_key("swagger") {
            return Err(ParseError::new(
                &self.path,
                "document has neither an 'openapi' nor a 'swagger' field",
            ));
        }

        let info = root.get("info");
        let title = info
            .and_then(|i| i.get("title"))
            .and_then(|t| t.as_str())
            .map(str::to_string);
        let version = info
            .and_then(|i| i.get("version"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let mut servers = Vec::new();
        if let Some(entries) = root.get("servers").and_then(|s| s.as_array()) {
            for entry in entries {
                if let Some(url) = entry.get("url").and_then(|u| u.as_str()) {
                    servers.push(url.to_string());
                }
            }
        }

        let mut paths = Vec::new();
        let mut operation_count = 0;
        if let Some(path_items) = root.get("paths").and_then(|p| p.as_object()) {
            for (path, item) in path_items {
                paths.push(path.clone());
                if let Some(item) = item.as_object() {
                    operation_count += item
                        .keys()
                        .filter(|k| HTTP_METHODS.contains(&k.as_str()))
                        .count();
                }
            }
        }
        paths.sort();

        let spec = OpenApiSpec {
            title,
            version,
            servers,
            paths,
            operation_count,
        };
        log::debug!(
            "parsed openapi spec '{}' from {}",
            spec.title.as_deref().unwrap_or("untitled"),
            self.path.display()
        );

        Ok(vec![ApplicationObject::new(
            self.path.clone(),
            ObjectPayload::OpenApi(spec),
        )])
    }

    fn deserialize(&self, content: &str) -> Result<serde_json::Value, ParseError> {
        let is_json = self
            .path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            serde_json::from_str(content)
                .map_err(|e| ParseError::new(&self.path, format!("invalid JSON: {e}")))
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| ParseError::new(&self.path, format!("invalid YAML: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::fs;
    use tempfile::TempDir;

    fn parse(file: &str, content: &str) -> Result<Vec<ApplicationObject>, ParseError> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        let repo = LocalRepository::new("test", dir.path());
        OpenApiParser::new(&repo, file).parse()
    }

    const ORDERS_API: &str = indoc! {"
        openapi: 3.0.3
        info:
          title: Orders API
          version: 2.1.0
        servers:
          - url: https://api.example.com/v2
        paths:
          /orders:
            get: {}
            post: {}
          /orders/{id}:
            get: {}
            delete: {}
            parameters: []
    "};

    #[test]
    fn parses_yaml_document() {
        let objects = parse("orders/openapi.yaml", ORDERS_API).unwrap();
        assert_eq!(objects.len(), 1);
        let spec = objects[0].as_openapi().unwrap();
        assert_eq!(spec.title.as_deref(), Some("Orders API"));
        assert_eq!(spec.version.as_deref(), Some("2.1.0"));
        assert_eq!(spec.servers, vec!["https://api.example.com/v2"]);
        assert_eq!(spec.paths, vec!["/orders", "/orders/{id}"]);
        assert_eq!(spec.operation_count, 4);
    }

    #[test]
    fn parses_json_document() {
        let objects = parse(
            "orders/openapi.json",
            r#"{"openapi": "3.0.0", "info": {"title": "J"}, "paths": {"/a": {"get": {}}}}"#,
        )
        .unwrap();
        let spec = objects[0].as_openapi().unwrap();
        assert_eq!(spec.title.as_deref(), Some("J"));
        assert_eq!(spec.operation_count, 1);
    }

    #[test]
    fn swagger_2_documents_are_accepted() {
        let objects = parse("api.yaml", "swagger: '2.0'\npaths:\n  /x:\n    get: {}\n").unwrap();
        assert_eq!(objects[0].as_openapi().unwrap().paths, vec!["/x"]);
    }

    #[test]
    fn non_openapi_yaml_is_a_parse_error() {
        let err = parse("api.yaml", "kind: Deployment\n").unwrap_err();
        assert!(err.to_string().contains("openapi"));
    }
}
