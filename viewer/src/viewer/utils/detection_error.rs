use thiserror::Error;

pub const EMPTY_ADDRESS: &str = "Service address is empty";
pub const NO_IMAGE_SELECTED: &str = "No image selected";
pub const INVALID_THRESHOLD: &str = "Threshold must be a number";
pub const EMPTY_RESULT_NOTICE: &str = "No targets detected, try adjusting the threshold";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("{0}")]
    Validation(String),
    #[error("Detection service responded {status} {status_text}: {body}")]
    Service {
        status: u16,
        status_text: String,
        body: String,
    },
    #[error("Detection request failed: {0}")]
    Network(String),
    #[error("Detection response is not a list of detection batches: {0}")]
    Parse(String),
}
