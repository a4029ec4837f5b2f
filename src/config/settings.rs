//! Settings data structures.

use serde::Deserialize;

/// Default number of hosts fetched concurrently.
const fn default_concurrency() -> usize {
    4
}

/// Default render-service request timeout in seconds.
const fn default_timeout_secs() -> u64 {
    30
}

/// Complete tool settings, typically loaded from `driftgate.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Render-service connection settings.
    pub render: RenderSettings,
    /// Optional Vault connection settings.
    #[serde(default)]
    pub vault: Option<VaultSettings>,
    /// Fetch-phase behavior.
    #[serde(default)]
    pub fetch: FetchSettings,
}

/// Render-service connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderSettings {
    /// Base URL of the render service.
    pub endpoint: String,
    /// Bearer token; usually supplied via `DRIFTGATE_RENDER_TOKEN`.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Vault connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultSettings {
    /// Vault base address.
    pub address: String,
    /// Vault token; usually supplied via `DRIFTGATE_VAULT_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,
    /// KV v2 mount point.
    #[serde(default = "VaultSettings::default_mount")]
    pub mount: String,
}

/// Fetch-phase behavior settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    /// Maximum number of hosts fetched concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Refresh version-controlled source content before fetching.
    #[serde(default)]
    pub refresh_sources: bool,
}

impl VaultSettings {
    fn default_mount() -> String {
        String::from("kv")
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            refresh_sources: false,
        }
    }
}
