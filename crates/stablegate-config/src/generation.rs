use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

/// Default remote endpoint of the generation service
pub const DEFAULT_ENDPOINT: &str = "https://grpc.stability.ai";

/// Default engine used by the prompt route
pub const DEFAULT_ENGINE_ID: &str = "stable-diffusion-768-v2-1";

/// Remote generation service configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Endpoint of the generation service (`http://` or `https://`)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer credential attached to every call
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Engine (model) identifier
    #[serde(default = "default_engine_id")]
    pub engine_id: String,
    /// Deadline for a single streaming call (e.g. "90s")
    ///
    /// Absent means the call waits for the stream's terminal status indefinitely
    #[serde(default)]
    pub timeout: Option<String>,
    /// Parameters applied by the prompt-only route
    #[serde(default)]
    pub defaults: GenerationDefaults,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            engine_id: default_engine_id(),
            timeout: None,
            defaults: GenerationDefaults::default(),
        }
    }
}

impl GenerationConfig {
    /// Parse the configured deadline
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is not a valid duration
    pub fn timeout_duration(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|raw| duration_str::parse(raw).map_err(|e| anyhow::anyhow!("invalid generation timeout '{raw}': {e}")))
            .transpose()
    }
}

/// Image parameters used when a caller only supplies a prompt
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationDefaults {
    #[serde(default = "default_dimension")]
    pub width: u64,
    #[serde(default = "default_dimension")]
    pub height: u64,
    #[serde(default = "default_samples")]
    pub samples: u64,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f32,
    #[serde(default = "default_steps")]
    pub steps: u64,
    /// Sampler name in snake case (e.g. `k_dpmpp_2m`); absent lets the service choose
    #[serde(default = "default_sampler")]
    pub sampler: Option<String>,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            width: default_dimension(),
            height: default_dimension(),
            samples: default_samples(),
            cfg_scale: default_cfg_scale(),
            steps: default_steps(),
            sampler: default_sampler(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_engine_id() -> String {
    DEFAULT_ENGINE_ID.to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_dimension() -> u64 {
    768
}

#[allow(clippy::missing_const_for_fn)]
fn default_samples() -> u64 {
    1
}

#[allow(clippy::missing_const_for_fn)]
fn default_cfg_scale() -> f32 {
    13.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_steps() -> u64 {
    30
}

#[allow(clippy::unnecessary_wraps)]
fn default_sampler() -> Option<String> {
    Some("k_dpmpp_2m".to_string())
}
