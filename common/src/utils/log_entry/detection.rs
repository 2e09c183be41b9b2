use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionEntry {
    #[error("Image {0} selected")]
    FileSelected(String),
    #[error("Image {0} could not be decoded, overlays and crops are unavailable")]
    ImageDecodeError(String),
    #[error("Request {0} sent to {1}")]
    RequestStart(u64, String),
    #[error("Request {0} returned {1} detections")]
    RequestSuccess(u64, usize),
    #[error("Request {0} returned no targets")]
    RequestEmpty(u64),
    #[error("Request {0} failed: {1}")]
    RequestFailed(u64, String),
    #[error("Request {0} superseded by a newer request")]
    RequestSuperseded(u64),
    #[error("Service address {0} remembered")]
    AddressRemembered(String),
    #[error("Failed to persist service addresses: {0}")]
    PersistError(String),
    #[error("Stored service address list is malformed, starting empty: {0}")]
    MalformedAddressList(String),
    #[error("Crop {0} exported")]
    CropExported(String),
}

impl From<DetectionEntry> for String {
    #[inline(always)]
    fn from(value: DetectionEntry) -> Self {
        value.to_string()
    }
}
