use futures_util::TryStreamExt;

use crate::{
    client::{AuthMetadata, GenerationClient},
    error::Result,
    request::StructuredRequest,
    types::StreamedAnswer,
};

/// Drive one streaming call to its terminal status
///
/// Answers are buffered in arrival order and only returned once the stream
/// ends with an OK status. A failing status discards whatever was buffered.
pub async fn execute(
    client: &dyn GenerationClient,
    request: StructuredRequest,
    metadata: &AuthMetadata,
) -> Result<Vec<StreamedAnswer>> {
    let mut stream = client.generate(request, metadata).await?;
    let mut answers = Vec::new();

    while let Some(answer) = stream.try_next().await? {
        answers.push(answer);
    }

    tracing::debug!(client = client.name(), answers = answers.len(), "generation stream completed");

    Ok(answers)
}
