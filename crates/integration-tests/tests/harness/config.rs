//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use secrecy::SecretString;
use stablegate_config::{Config, CorsConfig, GenerationConfig, GenerationDefaults, ServerConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with a test credential and default generation settings
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    ..ServerConfig::default()
                },
                generation: GenerationConfig {
                    api_key: Some(SecretString::from("sk-test")),
                    ..GenerationConfig::default()
                },
                telemetry: None,
            },
        }
    }

    /// Bound every generation call by a deadline (e.g. "50ms")
    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.config.generation.timeout = Some(timeout.to_owned());
        self
    }

    /// Use a different engine
    pub fn with_engine(mut self, engine_id: &str) -> Self {
        self.config.generation.engine_id = engine_id.to_owned();
        self
    }

    /// Replace the prompt-route defaults
    pub fn with_defaults(mut self, defaults: GenerationDefaults) -> Self {
        self.config.generation.defaults = defaults;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Serve the health check on another path
    pub fn with_health_path(mut self, path: &str) -> Self {
        self.config.server.health.path = path.to_owned();
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
