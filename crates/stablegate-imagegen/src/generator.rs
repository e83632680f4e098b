use std::{sync::Arc, time::Duration};

use secrecy::SecretString;
use stablegate_config::GenerationConfig;

use crate::{
    classifier::{ClassifiedResult, classify},
    client::{AuthMetadata, GenerationClient, GrpcGenerationClient},
    encoder::{EncodedImages, encode_outcome},
    error::{GenerationError, Result},
    executor::execute,
    outcome::GenerationOutcome,
    request::build_request,
    types::{GenerationParameters, PromptDefaults},
};

/// Entry point for generation calls
///
/// Built once at start-up; the client handle and credentials are shared
/// read-only by every concurrent call.
pub struct Generator {
    client: Arc<dyn GenerationClient>,
    metadata: AuthMetadata,
    engine_id: String,
    timeout: Option<Duration>,
    defaults: PromptDefaults,
}

impl Generator {
    pub fn new(client: Arc<dyn GenerationClient>, metadata: AuthMetadata, engine_id: impl Into<String>) -> Self {
        Self {
            client,
            metadata,
            engine_id: engine_id.into(),
            timeout: None,
            defaults: PromptDefaults::default(),
        }
    }

    /// Build a generator talking to the configured remote endpoint
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let client = GrpcGenerationClient::connect_lazy(&config.endpoint)?;
        Self::from_config_with_client(config, Arc::new(client))
    }

    /// Build a generator from configuration around an existing client
    pub fn from_config_with_client(config: &GenerationConfig, client: Arc<dyn GenerationClient>) -> Result<Self> {
        let api_key = resolve_api_key(config)?;
        let timeout = config
            .timeout_duration()
            .map_err(|e| GenerationError::Config(e.to_string()))?;
        let defaults = PromptDefaults::try_from(&config.defaults)?;
        let metadata = AuthMetadata::bearer(&api_key)?;

        tracing::debug!(
            engine_id = %config.engine_id,
            client = client.name(),
            timeout = ?timeout,
            "generator initialized"
        );

        Ok(Self {
            timeout,
            defaults,
            ..Self::new(client, metadata, config.engine_id.clone())
        })
    }

    /// Bound every call by a deadline
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: PromptDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn engine_id(&self) -> &str {
        &self.engine_id
    }

    /// Run one call through build, stream, and classification
    pub async fn run(&self, params: &GenerationParameters) -> GenerationOutcome {
        self.classified(params).await.into()
    }

    /// Generate images and return them base64-encoded
    ///
    /// An `Ok` value with no images means every artifact was filtered.
    pub async fn generate(&self, params: &GenerationParameters) -> Result<EncodedImages> {
        encode_outcome(self.run(params).await)
    }

    /// Text-to-image generation for a bare prompt using the configured defaults
    pub async fn generate_from_prompt(&self, prompt: &str) -> Result<EncodedImages> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::validation("prompt must not be empty"));
        }

        self.generate(&self.defaults.apply(prompt)).await
    }

    async fn classified(&self, params: &GenerationParameters) -> Result<ClassifiedResult> {
        let request = build_request(&self.engine_id, params)?;

        tracing::debug!(
            engine_id = %self.engine_id,
            generation_type = ?params.generation_type,
            prompts = request.prompts.len(),
            "generation request built"
        );

        let call = execute(self.client.as_ref(), request, &self.metadata);
        let answers = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                GenerationError::transport(format!("generation did not complete within {}s", limit.as_secs_f64()))
            })??,
            None => call.await?,
        };

        Ok(classify(answers))
    }
}

fn resolve_api_key(config: &GenerationConfig) -> Result<SecretString> {
    config
        .api_key
        .clone()
        .ok_or_else(|| GenerationError::Config("generation.api_key must be set".to_string()))
}
