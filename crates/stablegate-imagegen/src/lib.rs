#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod classifier;
mod client;
mod encoder;
mod error;
mod executor;
mod generator;
mod outcome;
pub mod proto;
mod request;
mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    routing::post,
};

pub use classifier::{ClassifiedResult, classify};
pub use client::{AnswerStream, AuthMetadata, GenerationClient, GrpcGenerationClient};
pub use encoder::{EncodedImages, encode, encode_outcome};
pub use error::{ErrorKind, FALLBACK_MESSAGE, GenerationError, Result, extract_message};
pub use executor::execute;
pub use generator::Generator;
pub use outcome::GenerationOutcome;
pub use request::{
    ClassifierParameters, GuidanceParameters, ImageParameters, Prompt, SamplerParameters, ScheduleParameters,
    StepParameters, StructuredRequest, build_request,
};
pub use types::{
    Artifact, ArtifactKind, ClipGuidancePreset, FinishReason, GenerationParameters, GenerationType, PromptDefaults,
    PromptRequest, PromptResponse, Sampler, StreamedAnswer, TextPrompt,
};

/// Largest accepted request body; init and mask images travel inline as base64
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Build the generator from configuration
///
/// # Errors
///
/// Returns an error if the generation settings cannot be turned into a client
pub fn build_generator(config: &stablegate_config::Config) -> anyhow::Result<Arc<Generator>> {
    let generator = Generator::from_config(&config.generation)
        .map_err(|e| anyhow::anyhow!("Failed to initialize image generation: {e}"))?;

    Ok(Arc::new(generator))
}

/// Create the endpoint router for image generation
pub fn endpoint_router() -> Router<Arc<Generator>> {
    Router::new()
        .route("/api/v1/stable-diffusion", post(generate_from_prompt))
        .route("/api/v1/stable-diffusion/", post(generate_from_prompt))
        .route("/api/v1/stable-diffusion/generate", post(generate))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// Handle prompt-only requests, answering with the first accepted image
async fn generate_from_prompt(
    State(generator): State<Arc<Generator>>,
    payload: std::result::Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<PromptResponse>> {
    let Json(request) = payload?;
    tracing::debug!(engine_id = generator.engine_id(), "prompt generation handler called");

    let encoded = generator.generate_from_prompt(&request.prompt).await?;

    Ok(Json(PromptResponse {
        photo: encoded.images.into_iter().next(),
    }))
}

/// Handle requests carrying the full parameter set
async fn generate(
    State(generator): State<Arc<Generator>>,
    payload: std::result::Result<Json<GenerationParameters>, JsonRejection>,
) -> Result<Json<EncodedImages>> {
    let Json(params) = payload?;
    tracing::debug!(
        engine_id = generator.engine_id(),
        generation_type = ?params.generation_type,
        "generation handler called"
    );

    let encoded = generator.generate(&params).await?;

    tracing::debug!(images = encoded.images.len(), "generation complete");

    Ok(Json(encoded))
}
