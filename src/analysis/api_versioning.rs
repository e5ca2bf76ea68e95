//! Detects OpenAPI documents whose interface carries no version marker.
//! An unversioned API cannot evolve without breaking its consumers.

use crate::analysis::StaticAnalysis;
use crate::core::{AnalysisResult, ApplicationObject, Smell};
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::Arc;

static VERSION_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/v\d+(/|$)").expect("version segment pattern"));

pub struct UnversionedApi;

impl StaticAnalysis for UnversionedApi {
    fn id(&self) -> &'static str {
        "unversioned-api"
    }

    fn run(&self, objects: &[Arc<ApplicationObject>]) -> Result<AnalysisResult> {
        let mut findings = Vec::new();

        for object in objects {
            let spec = match object.as_openapi() {
                Some(spec) if !spec.paths.is_empty() => spec,
                _ => continue,
            };
            let versioned = spec
                .servers
                .iter()
                .chain(&spec.paths)
                .any(|entry| VERSION_SEGMENT.is_match(entry));
            if !versioned {
                findings.push(format!(
                    "{}: '{}' exposes {} paths with no version segment",
                    object.path.display(),
                    spec.title.as_deref().unwrap_or("untitled"),
                    spec.paths.len()
                ));
            }
        }

        if findings.is_empty() {
            return Ok(AnalysisResult::clean(
                self.id(),
                "every API document is versioned",
            ));
        }

        let mut description = String::from("unversioned API documents:");
        for finding in &findings {
            write!(description, "\n{finding}")?;
        }
        Ok(AnalysisResult::new(
            self.id(),
            BTreeSet::from([Smell::UnversionedApi]),
            description,
        ))
    }
}
