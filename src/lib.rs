// Export modules for library usage
pub mod aggregator;
pub mod analysis;
pub mod cli;
pub mod cluster;
pub mod commands;
pub mod config;
pub mod core;
pub mod errors;
pub mod io;
pub mod parsers;
pub mod repository;

// Re-export commonly used types
pub use crate::core::{
    AnalysisResult, ApplicationObject, ContainerSpec, DockerImageSpec, KubernetesResource,
    ObjectCategory, ObjectPayload, OpenApiSpec, PropertyMap, Service, ServiceRegistry, Smell,
};

pub use crate::aggregator::Aggregator;

pub use crate::analysis::{
    default_registry, AnalysisFailure, AnalysisScheduler, Capability, DynamicAnalysis,
    RegisteredAnalysis, SchedulerOutcome, StaticAnalysis,
};

pub use crate::cluster::{ClusterContext, ClusterSession, LiveService, SessionSource};

pub use crate::config::AppConfig;

pub use crate::errors::{AggregationError, ConfigError, ParseError, RepositoryError};

pub use crate::io::{create_writer, OutputFormat, ReportWriter, SmellReport};

pub use crate::repository::{acquire_repositories, LocalRepository};
