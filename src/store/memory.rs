//! In-memory object store

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ObjectStore, StoreError};

/// A stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Object store kept in process memory
#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    failure: Option<StoreError>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(BTreeMap::new()),
            failure: None,
        }
    }

    /// Make every operation fail with `error`
    pub fn failing(mut self, error: StoreError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().ok().and_then(|o| o.get(key).cloned())
    }

    /// Stored keys in lexical order
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| StoreError::Client(format!("store lock poisoned: {}", e)))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn head_bucket(&self) -> Result<(), StoreError> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new("test-bucket");
        assert!(store.is_empty());
        store.put_object("a/b.txt", b"hello".to_vec(), "text/plain").await.unwrap();

        let object = store.get("a/b.txt").unwrap();
        assert_eq!(object.body, b"hello");
        assert_eq!(object.content_type, "text/plain");
        assert_eq!(store.keys(), vec!["a/b.txt".to_string()]);
        assert_eq!(store.bucket(), "test-bucket");
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = MemoryStore::new("b").failing(StoreError::AccessDenied("b".to_string()));
        assert!(store.put_object("k", Vec::new(), "text/plain").await.is_err());
        assert_eq!(store.head_bucket().await, Err(StoreError::AccessDenied("b".to_string())));
        assert!(store.is_empty());
    }
}
