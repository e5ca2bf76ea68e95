//! Dockerfile parser.
//!
//! Produces exactly one `DockerImageSpec` object per Dockerfile. Only the
//! instructions the analyses consume are modeled: FROM, EXPOSE, ENV,
//! ENTRYPOINT and CMD. Line continuations and comments are handled; the
//! rest of the instruction set is ignored.

use crate::core::{ApplicationObject, DockerImageSpec, ObjectPayload};
use crate::errors::ParseError;
use crate::repository::LocalRepository;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub struct DockerfileParser<'a> {
    repository: &'a LocalRepository,
    path: PathBuf,
    image_name: Option<String>,
}

impl<'a> DockerfileParser<'a> {
    pub fn new(
        repository: &'a LocalRepository,
        path: impl Into<PathBuf>,
        image_name: Option<&str>,
    ) -> Self {
        Self {
            repository,
            path: path.into(),
            image_name: image_name.map(str::to_string),
        }
    }

    pub fn parse(&self) -> Result<Vec<ApplicationObject>, ParseError> {
        let content = self.repository.read_artifact(&self.path)?;

        let mut base_image = None;
        let mut exposed_ports = Vec::new();
        let mut env = BTreeMap::new();
        let mut entrypoint = Vec::new();
        let mut cmd = Vec::new();

        for line in logical_lines(&content) {
            let (instruction, arguments) = match line.split_once(char::is_whitespace) {
                Some((instruction, rest)) => (instruction.to_ascii_uppercase(), rest.trim()),
                None => continue,
            };

            match instruction.as_str() {
                // first build stage determines the base image
                "FROM" if base_image.is_none() => {
                    base_image = arguments.split_whitespace().next().map(str::to_string);
                }
                "EXPOSE" => {
                    for port in arguments.split_whitespace() {
                        let port = port.split('/').next().unwrap_or(port);
                        if let Ok(port) = port.parse::<u16>() {
                            exposed_ports.push(port);
                        }
                    }
                }
                "ENV" => {
                    for (key, value) in parse_env(arguments) {
                        env.insert(key, value);
                    }
                }
                "ENTRYPOINT" => entrypoint = parse_exec_form(arguments),
                "CMD" => cmd = parse_exec_form(arguments),
                _ => {}
            }
        }

        let base_image = base_image
            .ok_or_else(|| ParseError::new(&self.path, "Dockerfile has no FROM instruction"))?;

        let spec = DockerImageSpec {
            image_name: self.image_name.clone(),
            base_image,
            exposed_ports,
            env,
            entrypoint,
            cmd,
        };
        log::debug!("parsed docker image spec from {}", self.path.display());

        Ok(vec![ApplicationObject::new(
            self.path.clone(),
            ObjectPayload::DockerImage(spec),
        )])
    }
}

/// Join continuation lines and strip comments and blanks.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for raw in content.lines() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(stripped) = trimmed.strip_suffix('\\') {
            current.push_str(stripped);
            current.push(' ');
            continue;
        }
        current.push_str(trimmed);
        lines.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Both ENV forms: `ENV key=value key2=value2` and the legacy `ENV key value`.
fn parse_env(arguments: &str) -> Vec<(String, String)> {
    if arguments.contains('=') {
        arguments
            .split_whitespace()
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), unquote(v)))
            .collect()
    } else {
        match arguments.split_once(char::is_whitespace) {
            Some((key, value)) => vec![(key.to_string(), unquote(value.trim()))],
            None => Vec::new(),
        }
    }
}

/// ENTRYPOINT/CMD in exec (JSON array) or shell form.
fn parse_exec_form(arguments: &str) -> Vec<String> {
    if arguments.starts_with('[') {
        if let Ok(tokens) = serde_json::from_str::<Vec<String>>(arguments) {
            return tokens;
        }
    }
    arguments.split_whitespace().map(str::to_string).collect()
}

fn unquote(value: &str) -> String {
    value.trim_matches('"').trim_matches('\'').to_string()
}
