//! Artifact parsers, one per source-of-truth kind.
//!
//! Each parser takes a repository handle plus a repository-relative artifact
//! path (and kind-specific options), and produces zero or more
//! [`ApplicationObject`](crate::core::ApplicationObject)s. Parsers are
//! deterministic for identical inputs and report any uninterpretable
//! artifact as a [`ParseError`](crate::errors::ParseError), which aborts
//! aggregation.

pub mod dockerfile;
pub mod kubernetes;
pub mod openapi;

pub use dockerfile::DockerfileParser;
pub use kubernetes::KubernetesParser;
pub use openapi::OpenApiParser;
