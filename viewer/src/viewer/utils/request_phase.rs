use serde::Serialize;
use crate::viewer::utils::detection_error::DetectionError;

/// Terminal phases are also the resting state until the next trigger.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Validating,
    Requesting,
    Success,
    ServiceError,
    ValidationError,
    NetworkError,
}

impl From<&DetectionError> for RequestPhase {
    fn from(value: &DetectionError) -> Self {
        match value {
            DetectionError::Validation(_) => RequestPhase::ValidationError,
            DetectionError::Service { .. } => RequestPhase::ServiceError,
            DetectionError::Network(_) | DetectionError::Parse(_) => RequestPhase::NetworkError,
        }
    }
}
