use std::io::Error as IoError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read storage file {0}: {1}")]
    ReadFileError(String, IoError),
    #[error("Failed to write storage file {0}: {1}")]
    WriteFileError(String, IoError),
    #[error("Failed to create storage directory {0}: {1}")]
    CreateDirectoryError(String, IoError),
    #[error("Storage file {0} is malformed: {1}")]
    DeserializeError(String, SerdeJsonError),
    #[error("Failed to serialize storage: {0}")]
    SerializeError(SerdeJsonError),
    #[error("Storage lock poisoned")]
    PoisonedLock,
}

impl From<StorageError> for String {
    #[inline(always)]
    fn from(value: StorageError) -> Self {
        value.to_string()
    }
}
