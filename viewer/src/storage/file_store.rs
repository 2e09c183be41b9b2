use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::collections::BTreeMap;
use crate::storage::KeyValueStore;
use crate::storage::storage_error::StorageError;

/// JSON object on disk, rewritten as a whole on every `set`.
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|err| StorageError::DeserializeError(path.display().to_string(), err))?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(StorageError::ReadFileError(path.display().to_string(), err)),
        };
        Ok(Self {
            path,
            entries,
        })
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| StorageError::CreateDirectoryError(parent.display().to_string(), err))?;
        }
        let content = serde_json::to_string_pretty(&self.entries).map_err(StorageError::SerializeError)?;
        fs::write(&self.path, content).map_err(|err| StorageError::WriteFileError(self.path.display().to_string(), err))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}
