use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Image has not finished loading")]
    ImageNotLoaded,
    #[error("Bounding box is empty or not finite")]
    InvalidBoundingBox,
    #[error("Detection {0} does not exist")]
    DetectionNotFound(usize),
    #[error("Failed to encode crop: {0}")]
    EncodeError(String),
}

impl From<RenderError> for String {
    #[inline(always)]
    fn from(value: RenderError) -> Self {
        value.to_string()
    }
}
