use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Environment variable consulted for the participant id in cluster mode.
pub const HOSTNAME_VAR: &str = "HOSTNAME";
/// Environment variable consulted for the election namespace in cluster mode.
pub const POD_NAMESPACE_VAR: &str = "POD_NAMESPACE";

pub const DEFAULT_ELECTION: &str = "solocron";
pub const DEFAULT_TTL_SECS: u64 = 10;
pub const DEFAULT_SIDECAR_URL: &str = "http://127.0.0.1:4040";
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_COOLDOWN_SECS: u64 = 30;

/// Top-level config (solocron.toml + SOLOCRON_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SolocronConfig {
    #[serde(default)]
    pub election: ElectionConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub breaker: BreakerConfig,
    /// The crontab: fixed at process start, one entry per periodic webhook.
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    /// Name of the election this fleet participates in.
    #[serde(default = "default_election")]
    pub name: String,
    /// This participant's id. Derived from $HOSTNAME in cluster mode when empty.
    #[serde(default)]
    pub id: String,
    /// Namespace scoping the election. Derived from $POD_NAMESPACE in cluster mode.
    #[serde(default)]
    pub namespace: String,
    /// Lease TTL handed to the coordination backend.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// True when running inside the cluster with ambient credentials.
    #[serde(default)]
    pub in_cluster: bool,
    #[serde(default)]
    pub mode: ElectionMode,
    /// Endpoint of the leader-elector sidecar (mode = "sidecar").
    #[serde(default = "default_sidecar_url")]
    pub sidecar_url: String,
}

/// How leadership notifications are sourced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ElectionMode {
    /// Poll a leader-elector sidecar over HTTP.
    Sidecar,
    /// Single-node mode: this participant is always the leader.
    #[default]
    Static,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            name: default_election(),
            id: String::new(),
            namespace: String::new(),
            ttl_secs: default_ttl_secs(),
            in_cluster: false,
            mode: ElectionMode::default(),
            sidecar_url: default_sidecar_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HttpConfig {
    /// Listen address for the status/metrics server, e.g. "0.0.0.0:8080".
    /// When unset no HTTP surface is stood up.
    pub addr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures before a breaker opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Seconds an open breaker waits before allowing a half-open trial.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

/// One periodic webhook job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Stable job name — breaker and metric key.
    pub name: String,
    /// Target URL for the POST callback.
    pub url: String,
    /// Firing interval in seconds.
    pub every_secs: u64,
}

fn default_election() -> String {
    DEFAULT_ELECTION.to_string()
}
fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}
fn default_sidecar_url() -> String {
    DEFAULT_SIDECAR_URL.to_string()
}
fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}
fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

impl SolocronConfig {
    /// Load config from a TOML file with SOLOCRON_* env var overrides.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: SolocronConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("SOLOCRON_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Resolve derived fields and reject configs the process cannot run with.
    ///
    /// Identity and namespace must be explicit outside the cluster; inside,
    /// they fall back to the pod environment. Any failure here is fatal at
    /// startup — the scheduler never starts half-configured.
    pub fn validate(&mut self) -> crate::error::Result<()> {
        use crate::error::CoreError;

        if self.election.name.is_empty() {
            return Err(CoreError::Config("election.name must not be empty".into()));
        }

        if self.election.id.is_empty() {
            if self.election.in_cluster {
                self.election.id = std::env::var(HOSTNAME_VAR).map_err(|_| {
                    CoreError::Config(format!(
                        "election.id is empty and ${HOSTNAME_VAR} is unset"
                    ))
                })?;
                info!(id = %self.election.id, "participant id derived from pod hostname");
            } else {
                return Err(CoreError::Config(
                    "election.id is required when running outside the cluster".into(),
                ));
            }
        }

        if self.election.namespace.is_empty() {
            if self.election.in_cluster {
                self.election.namespace = std::env::var(POD_NAMESPACE_VAR).map_err(|_| {
                    CoreError::Config(format!(
                        "unable to obtain election namespace from ${POD_NAMESPACE_VAR}"
                    ))
                })?;
                info!(namespace = %self.election.namespace, "election namespace derived from pod environment");
            } else {
                return Err(CoreError::Config(
                    "election.namespace is required when running outside the cluster".into(),
                ));
            }
        }

        if self.election.ttl_secs == 0 {
            return Err(CoreError::Config("election.ttl_secs must be > 0".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for job in &self.jobs {
            if job.name.is_empty() {
                return Err(CoreError::Config("job name must not be empty".into()));
            }
            if !seen.insert(job.name.as_str()) {
                return Err(CoreError::Config(format!("duplicate job name: {}", job.name)));
            }
            if job.every_secs == 0 {
                return Err(CoreError::Config(format!(
                    "job {} has a zero interval",
                    job.name
                )));
            }
        }

        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.solocron/solocron.toml", home)
}
