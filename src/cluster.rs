//! Live-cluster capability: kubeconfig discovery, the connection probe, and
//! sessions for dynamic analyses.
//!
//! The probe is attempted once per run. Every failure mode is contained
//! here: it logs a warning and yields `None`, which the caller turns into a
//! dynamic-capability downgrade. Nothing in this module raises to the top
//! level.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// One service as reported by the live cluster.
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct LiveService {
    pub name: String,
    pub namespace: String,
    pub service_type: String,
}

impl LiveService {
    pub fn is_externally_exposed(&self) -> bool {
        matches!(self.service_type.as_str(), "NodePort" | "LoadBalancer")
    }
}

/// A live-cluster session held by one dynamic analysis invocation.
///
/// Sessions are not assumed safe for concurrent use; each dynamic analysis
/// acquires its own.
pub trait ClusterSession: Send {
    fn list_services(&self) -> Result<Vec<LiveService>>;
}

/// Source of independently acquired cluster sessions.
pub trait SessionSource: Sync {
    fn open_session(&self) -> Result<Box<dyn ClusterSession>>;
}

/// A verified connection capability, produced by the probe.
#[derive(Debug, Clone)]
pub struct ClusterContext {
    server: String,
    token: Option<String>,
    accept_invalid_certs: bool,
}

impl ClusterContext {
    /// Probe the cluster once. On any failure, log a warning and yield
    /// `None` so the caller downgrades dynamic analysis instead of aborting.
    pub fn acquire() -> Option<Self> {
        log::info!("probing the kubernetes cluster");
        match Self::try_acquire() {
            Ok(context) => {
                log::info!("cluster reachable at {}", context.server);
                Some(context)
            }
            Err(e) => {
                log::warn!("cluster unavailable, skipping dynamic analyses: {e:#}");
                None
            }
        }
    }

    fn try_acquire() -> Result<Self> {
        let path = kubeconfig_path().ok_or_else(|| anyhow!("no kubeconfig found"))?;
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read kubeconfig {}", path.display()))?;
        let kubeconfig: KubeConfig =
            serde_yaml::from_str(&content).context("malformed kubeconfig")?;
        let context = kubeconfig.current()?;

        // reachability check: an unauthenticated /version request is enough
        let client = context.client()?;
        let response = client
            .get(format!("{}/version", context.server))
            .send()
            .context("cluster version probe failed")?;
        if !response.status().is_success() && response.status().as_u16() != 401 {
            return Err(anyhow!(
                "cluster version probe returned {}",
                response.status()
            ));
        }

        Ok(context)
    }

    fn client(&self) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .context("failed to build cluster http client")
    }
}

impl SessionSource for ClusterContext {
    fn open_session(&self) -> Result<Box<dyn ClusterSession>> {
        Ok(Box::new(HttpClusterSession {
            client: self.client()?,
            server: self.server.clone(),
            token: self.token.clone(),
        }))
    }
}

/// Session talking to the Kubernetes API over plain HTTPS.
pub struct HttpClusterSession {
    client: reqwest::blocking::Client,
    server: String,
    token: Option<String>,
}

impl ClusterSession for HttpClusterSession {
    fn list_services(&self) -> Result<Vec<LiveService>> {
        let mut request = self.client.get(format!("{}/api/v1/services", self.server));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().context("service list request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("service list returned {}", response.status()));
        }
        let body: ServiceList = response.json().context("malformed service list")?;

        Ok(body
            .items
            .into_iter()
            .map(|item| LiveService {
                name: item.metadata.name,
                namespace: item.metadata.namespace.unwrap_or_default(),
                service_type: item.spec.service_type.unwrap_or_else(|| "ClusterIP".into()),
            })
            .collect())
    }
}

fn kubeconfig_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KUBECONFIG") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    let default = dirs::home_dir()?.join(".kube").join("config");
    default.exists().then_some(default)
}

// Minimal kubeconfig shape: just enough to resolve the current context to a
// server URL and bearer token.

#[derive(Debug, Deserialize)]
struct KubeConfig {
    #[serde(rename = "current-context", default)]
    current_context: Option<String>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    users: Vec<NamedUser>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    cluster: String,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
struct ClusterEntry {
    server: String,
    #[serde(rename = "insecure-skip-tls-verify", default)]
    insecure_skip_tls_verify: bool,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    #[serde(default)]
    user: UserEntry,
}

#[derive(Debug, Default, Deserialize)]
struct UserEntry {
    #[serde(default)]
    token: Option<String>,
}

impl KubeConfig {
    fn current(&self) -> Result<ClusterContext> {
        let current = self
            .current_context
            .as_deref()
            .ok_or_else(|| anyhow!("kubeconfig has no current-context"))?;
        let context = self
            .contexts
            .iter()
            .find(|c| c.name == current)
            .map(|c| &c.context)
            .ok_or_else(|| anyhow!("kubeconfig context '{current}' not found"))?;
        let cluster = self
            .clusters
            .iter()
            .find(|c| c.name == context.cluster)
            .map(|c| &c.cluster)
            .ok_or_else(|| anyhow!("kubeconfig cluster '{}' not found", context.cluster))?;
        let token = context.user.as_deref().and_then(|user| {
            self.users
                .iter()
                .find(|u| u.name == user)
                .and_then(|u| u.user.token.clone())
        });

        Ok(ClusterContext {
            server: cluster.server.trim_end_matches('/').to_string(),
            token,
            accept_invalid_certs: cluster.insecure_skip_tls_verify,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ServiceList {
    #[serde(default)]
    items: Vec<ServiceItem>,
}

#[derive(Debug, Deserialize)]
struct ServiceItem {
    metadata: ServiceMetadata,
    #[serde(default)]
    spec: ServiceSpecEntry,
}

#[derive(Debug, Deserialize)]
struct ServiceMetadata {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceSpecEntry {
    #[serde(rename = "type", default)]
    service_type: Option<String>,
}
