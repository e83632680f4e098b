//! Scripted generation client standing in for the remote gRPC service

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use stablegate_imagegen::{
    AnswerStream, Artifact, AuthMetadata, GenerationClient, GenerationError, StreamedAnswer, StructuredRequest,
};

/// What the fake service does when a call is opened
enum Script {
    /// Stream these items, then end
    Stream(Vec<Result<StreamedAnswer, GenerationError>>),
    /// Fail before any answer is streamed
    SetupFailure(String),
    /// Never reach a terminal status
    Hang,
}

/// Fake client that replays a script and records every request it receives
pub struct FakeClient {
    script: Script,
    requests: Mutex<Vec<StructuredRequest>>,
}

impl FakeClient {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// One answer carrying a successful image artifact per payload
    pub fn images(payloads: &[&[u8]]) -> Arc<Self> {
        let artifacts = payloads
            .iter()
            .enumerate()
            .map(|(seed, payload)| Artifact::image(payload.to_vec(), u32::try_from(seed).unwrap_or_default()))
            .collect();

        Self::new(Script::Stream(vec![Ok(StreamedAnswer::new(artifacts))]))
    }

    /// Answers exactly as given
    pub fn answers(answers: Vec<StreamedAnswer>) -> Arc<Self> {
        Self::new(Script::Stream(answers.into_iter().map(Ok).collect()))
    }

    /// Every image withheld by the content classifier
    pub fn filtered() -> Arc<Self> {
        Self::answers(vec![StreamedAnswer::new(vec![Artifact::filtered(vec![0x00], 7)])])
    }

    /// Streams one image, then ends with a non-OK status
    pub fn failing_status(message: &str) -> Arc<Self> {
        Self::new(Script::Stream(vec![
            Ok(StreamedAnswer::new(vec![Artifact::image(vec![0x01], 1)])),
            Err(GenerationError::transport(message)),
        ]))
    }

    /// The call cannot be opened at all
    pub fn setup_failure(message: &str) -> Arc<Self> {
        Self::new(Script::SetupFailure(message.to_owned()))
    }

    /// The stream never terminates
    pub fn hanging() -> Arc<Self> {
        Self::new(Script::Hang)
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<StructuredRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for FakeClient {
    async fn generate(
        &self,
        request: StructuredRequest,
        _metadata: &AuthMetadata,
    ) -> Result<AnswerStream, GenerationError> {
        self.requests.lock().unwrap().push(request);

        match &self.script {
            Script::Stream(items) => Ok(Box::pin(stream::iter(items.clone()))),
            Script::SetupFailure(message) => Err(GenerationError::transport(message.clone())),
            Script::Hang => Ok(Box::pin(stream::pending())),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}
