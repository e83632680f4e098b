pub(crate) mod grpc;

use std::{fmt, pin::Pin};

use async_trait::async_trait;
use futures_util::Stream;
use secrecy::{ExposeSecret, SecretString};
use tonic::metadata::{Ascii, MetadataMap, MetadataValue};

use crate::{
    error::{GenerationError, Result},
    request::StructuredRequest,
    types::StreamedAnswer,
};

pub use grpc::GrpcGenerationClient;

/// Answers of one streaming call, ending with the terminal status
///
/// A non-OK terminal status arrives as the last item, as an `Err`.
pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<StreamedAnswer>> + Send>>;

/// Handle able to open the server-streaming generate call
///
/// Shared read-only across concurrent calls.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Open one streaming call for the given request
    async fn generate(&self, request: StructuredRequest, metadata: &AuthMetadata) -> Result<AnswerStream>;

    /// Get the client name
    fn name(&self) -> &str;
}

/// Credentials attached to every call
///
/// The `authorization` value is built once and reused by every call.
#[derive(Clone)]
pub struct AuthMetadata {
    authorization: MetadataValue<Ascii>,
}

impl AuthMetadata {
    /// Build bearer credentials from an api key
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Config`] when the key cannot be sent as call metadata
    pub fn bearer(api_key: &SecretString) -> Result<Self> {
        let mut authorization = MetadataValue::try_from(format!("Bearer {}", api_key.expose_secret()))
            .map_err(|_| GenerationError::Config("api key is not a valid metadata value".to_string()))?;
        authorization.set_sensitive(true);

        Ok(Self { authorization })
    }

    /// Insert the `authorization` entry into outgoing call metadata
    pub fn apply(&self, metadata: &mut MetadataMap) {
        metadata.insert("authorization", self.authorization.clone());
    }
}

impl fmt::Debug for AuthMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthMetadata").finish_non_exhaustive()
    }
}
