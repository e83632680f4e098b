use async_trait::async_trait;
use futures_util::TryStreamExt;
use http::uri::PathAndQuery;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

use super::{AnswerStream, AuthMetadata, GenerationClient};
use crate::{
    error::{GenerationError, Result, extract_message},
    proto::{self, GENERATE_PATH},
    request::StructuredRequest,
    types::StreamedAnswer,
};

/// Tonic client for the remote generation service
pub struct GrpcGenerationClient {
    channel: Channel,
    endpoint: String,
}

impl GrpcGenerationClient {
    /// Create a client whose connection is established on first use
    ///
    /// `https://` endpoints are dialed with TLS against the webpki roots.
    /// Must be called from within a Tokio runtime.
    pub fn connect_lazy(endpoint: &str) -> Result<Self> {
        let mut builder = Endpoint::from_shared(endpoint.to_string())
            .map_err(|e| GenerationError::Config(format!("invalid generation endpoint '{endpoint}': {e}")))?;

        if endpoint.starts_with("https://") {
            builder = builder
                .tls_config(ClientTlsConfig::new().with_webpki_roots())
                .map_err(|e| GenerationError::Config(format!("failed to configure TLS for '{endpoint}': {e}")))?;
        }

        tracing::debug!(%endpoint, "generation client created");

        Ok(Self {
            channel: builder.connect_lazy(),
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl GenerationClient for GrpcGenerationClient {
    async fn generate(&self, request: StructuredRequest, metadata: &AuthMetadata) -> Result<AnswerStream> {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());

        grpc.ready()
            .await
            .map_err(|e| GenerationError::transport(format!("generation service unavailable: {e}")))?;

        let mut call = tonic::Request::new(proto::Request::from(request));
        metadata.apply(call.metadata_mut());

        let codec = tonic_prost::ProstCodec::<proto::Request, proto::Answer>::default();
        let response = grpc
            .server_streaming(call, PathAndQuery::from_static(GENERATE_PATH), codec)
            .await
            .map_err(status_error)?;

        let answers = response
            .into_inner()
            .map_ok(StreamedAnswer::from)
            .map_err(status_error);

        Ok(Box::pin(answers))
    }

    fn name(&self) -> &str {
        &self.endpoint
    }
}

fn status_error(status: tonic::Status) -> GenerationError {
    GenerationError::Transport(extract_message(&status))
}
