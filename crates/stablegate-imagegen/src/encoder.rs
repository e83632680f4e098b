use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Serialize;

use crate::{
    classifier::ClassifiedResult,
    error::Result,
    outcome::GenerationOutcome,
};

/// Base64 images of one successful call, with counters for logging
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImages {
    pub images: Vec<String>,
    pub total_artifacts: usize,
    pub filtered_artifacts: usize,
}

impl EncodedImages {
    pub fn first(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Base64-encode every accepted artifact, in order
pub fn encode(result: &ClassifiedResult) -> EncodedImages {
    let total_artifacts = result.total();
    let filtered_artifacts = result.filtered_artifacts.len();

    tracing::info!(total_artifacts, "artifacts were generated");

    if filtered_artifacts > 0 {
        tracing::warn!(filtered_artifacts, "artifacts were filtered by the content classifier");
    }

    EncodedImages {
        images: result
            .image_artifacts
            .iter()
            .map(|artifact| STANDARD.encode(&artifact.binary))
            .collect(),
        total_artifacts,
        filtered_artifacts,
    }
}

/// Encode an outcome; failed calls skip encoding and keep their error
pub fn encode_outcome(outcome: GenerationOutcome) -> Result<EncodedImages> {
    match outcome {
        GenerationOutcome::Accepted(result) => Ok(encode(&result)),
        GenerationOutcome::Failed(err) => {
            tracing::debug!(kind = ?err.kind(), error = %err, "generation failed, skipping encoding");
            Err(err)
        }
    }
}
