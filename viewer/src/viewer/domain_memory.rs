use crate::utils::logging::*;
use crate::storage::KeyValueStore;
use crate::storage::storage_error::StorageError;

pub const SERVICE_DOMAIN_KEY: &str = "serviceDomain";
pub const DOMAIN_LIST_KEY: &str = "domainList";

/// Remembers every service address the user has submitted and the last one in use.
pub struct DomainMemory<K: KeyValueStore> {
    store: K,
    known_addresses: Vec<String>,
    last_used: String,
}

impl<K: KeyValueStore> DomainMemory<K> {
    pub async fn load(store: K, default_address: &str) -> Self {
        let known_addresses = match store.get(DOMAIN_LIST_KEY).map(|list| serde_json::from_str::<Vec<String>>(&list)) {
            Some(Ok(list)) => list,
            Some(Err(err)) => {
                logging_warning!(DetectionEntry::MalformedAddressList(err.to_string()));
                Vec::new()
            },
            None => Vec::new(),
        };
        let last_used = store.get(SERVICE_DOMAIN_KEY)
            .filter(|address| !address.is_empty())
            .unwrap_or_else(|| default_address.to_string());
        let mut memory = Self {
            store,
            known_addresses: Vec::new(),
            last_used,
        };
        for address in known_addresses {
            if !address.is_empty() && !memory.known_addresses.contains(&address) {
                memory.known_addresses.push(address);
            }
        }
        if memory.known_addresses.is_empty() {
            let seed = memory.last_used.clone();
            if let Err(err) = memory.remember(&seed) {
                logging_error!(DetectionEntry::PersistError(err.to_string()));
            }
        }
        memory
    }

    /// Returns whether the address was new.
    pub fn remember(&mut self, address: &str) -> Result<bool, StorageError> {
        if address.is_empty() || self.known_addresses.iter().any(|known| known == address) {
            return Ok(false);
        }
        let mut known_addresses = self.known_addresses.clone();
        known_addresses.push(address.to_string());
        let list = serde_json::to_string(&known_addresses).map_err(StorageError::SerializeError)?;
        self.store.set(DOMAIN_LIST_KEY, &list)?;
        self.known_addresses = known_addresses;
        Ok(true)
    }

    pub fn set_last_used(&mut self, address: &str) -> Result<bool, StorageError> {
        if address.is_empty() {
            return Ok(false);
        }
        self.last_used = address.to_string();
        self.store.set(SERVICE_DOMAIN_KEY, address)?;
        Ok(true)
    }

    pub fn known_addresses(&self) -> &[String] {
        &self.known_addresses
    }

    pub fn last_used(&self) -> &str {
        &self.last_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory_store::MemoryStore;

    const DEFAULT: &str = "http://127.0.0.1:8000";

    /// Reads from the wrapped store and fails every write while `broken` is set.
    struct FlakyStore {
        inner: MemoryStore,
        broken: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.broken {
                return Err(StorageError::PoisonedLock);
            }
            self.inner.set(key, value)
        }
    }

    #[tokio::test]
    async fn empty_store_is_seeded_with_default() {
        let store = MemoryStore::default();
        let memory = DomainMemory::load(store.clone(), DEFAULT).await;
        assert_eq!(memory.last_used(), DEFAULT);
        assert_eq!(memory.known_addresses(), [DEFAULT.to_string()]);
        assert_eq!(store.get(DOMAIN_LIST_KEY).as_deref(), Some(r#"["http://127.0.0.1:8000"]"#));
    }

    #[tokio::test]
    async fn stored_values_win_over_default() {
        let mut store = MemoryStore::default();
        store.set(DOMAIN_LIST_KEY, r#"["http://a:1","http://b:2"]"#).unwrap();
        store.set(SERVICE_DOMAIN_KEY, "http://b:2").unwrap();
        let memory = DomainMemory::load(store, DEFAULT).await;
        assert_eq!(memory.last_used(), "http://b:2");
        assert_eq!(memory.known_addresses(), ["http://a:1".to_string(), "http://b:2".to_string()]);
    }

    #[tokio::test]
    async fn malformed_list_starts_empty_and_reseeds() {
        let mut store = MemoryStore::default();
        store.set(DOMAIN_LIST_KEY, "not json").unwrap();
        let memory = DomainMemory::load(store, DEFAULT).await;
        assert_eq!(memory.known_addresses(), [DEFAULT.to_string()]);
    }

    #[tokio::test]
    async fn remember_is_idempotent() {
        let mut store = MemoryStore::default();
        store.set(DOMAIN_LIST_KEY, "[]").unwrap();
        let mut memory = DomainMemory::load(store, "").await;
        assert!(memory.known_addresses().is_empty());
        assert!(memory.remember("http://10.0.0.5:9000").unwrap());
        assert!(!memory.remember("http://10.0.0.5:9000").unwrap());
        assert!(!memory.remember("").unwrap());
        assert_eq!(memory.known_addresses().len(), 1);
    }

    #[tokio::test]
    async fn last_used_ignores_empty_addresses() {
        let store = MemoryStore::default();
        let mut memory = DomainMemory::load(store.clone(), DEFAULT).await;
        assert!(!memory.set_last_used("").unwrap());
        assert_eq!(store.get(SERVICE_DOMAIN_KEY), None);
        assert!(memory.set_last_used("http://10.0.0.5:9000").unwrap());
        assert_eq!(store.get(SERVICE_DOMAIN_KEY).as_deref(), Some("http://10.0.0.5:9000"));
        assert_eq!(memory.last_used(), "http://10.0.0.5:9000");
    }

    #[tokio::test]
    async fn failed_write_is_retried_on_next_remember() {
        let mut inner = MemoryStore::default();
        inner.set(DOMAIN_LIST_KEY, r#"["http://a:1"]"#).unwrap();
        let store = FlakyStore { inner: inner.clone(), broken: true };
        let mut memory = DomainMemory::load(store, DEFAULT).await;

        assert!(memory.remember("http://b:2").is_err());
        assert_eq!(memory.known_addresses(), ["http://a:1".to_string()]);
        assert_eq!(inner.get(DOMAIN_LIST_KEY).as_deref(), Some(r#"["http://a:1"]"#));

        memory.store.broken = false;
        assert!(memory.remember("http://b:2").unwrap());
        assert_eq!(memory.known_addresses(), ["http://a:1".to_string(), "http://b:2".to_string()]);
        assert_eq!(inner.get(DOMAIN_LIST_KEY).as_deref(), Some(r#"["http://a:1","http://b:2"]"#));
    }
}
