use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        tracing::debug!(
            engine_id = %config.generation.engine_id,
            endpoint = %config.generation.endpoint,
            "configuration loaded"
        );

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the generation service settings are unusable
    /// or the health path is malformed
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_generation_config()?;
        self.validate_server_config()?;
        Ok(())
    }

    fn validate_generation_config(&self) -> anyhow::Result<()> {
        let generation = &self.generation;

        match generation.api_key {
            Some(ref key) if !key.expose_secret().trim().is_empty() => {}
            _ => anyhow::bail!("generation.api_key must be set"),
        }

        if !(generation.endpoint.starts_with("http://") || generation.endpoint.starts_with("https://")) {
            anyhow::bail!(
                "generation.endpoint must be an http:// or https:// URL, got '{}'",
                generation.endpoint
            );
        }

        if generation.engine_id.trim().is_empty() {
            anyhow::bail!("generation.engine_id must not be empty");
        }

        if let Some(timeout) = generation.timeout_duration()?
            && timeout.is_zero()
        {
            anyhow::bail!("generation.timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_server_config(&self) -> anyhow::Result<()> {
        let health = &self.server.health;

        if health.enabled && !health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/', got '{}'", health.path);
        }

        if let Some(cors) = &self.server.cors
            && cors.credentials
            && cors.origins == crate::AnyOrArray::Any
        {
            anyhow::bail!("server.cors.credentials cannot be combined with wildcard origins");
        }

        Ok(())
    }
}
