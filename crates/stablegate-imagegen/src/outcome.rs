use crate::{classifier::ClassifiedResult, error::GenerationError};

/// Terminal result of one generation call
///
/// Filtering is a normal outcome: an `Accepted` result may hold no images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Accepted(ClassifiedResult),
    Failed(GenerationError),
}

impl GenerationOutcome {
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn into_result(self) -> Result<ClassifiedResult, GenerationError> {
        match self {
            Self::Accepted(result) => Ok(result),
            Self::Failed(err) => Err(err),
        }
    }
}

impl From<Result<ClassifiedResult, GenerationError>> for GenerationOutcome {
    fn from(result: Result<ClassifiedResult, GenerationError>) -> Self {
        match result {
            Ok(result) => Self::Accepted(result),
            Err(err) => Self::Failed(err),
        }
    }
}
