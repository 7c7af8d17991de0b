use crate::ports::storage::{Error, StoragePort};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

/// Object store kept in memory, for development and tests
#[derive(Clone, Debug)]
pub struct MemoryStorage {
    bucket: String,
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().ok()?.get(path).cloned()
    }
}

#[async_trait::async_trait]
impl StoragePort for MemoryStorage {
    async fn upload_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, Error> {
        let mut objects = self.objects.lock()?;
        // Same as the remote bucket with upsert disabled
        if objects.contains_key(path) {
            return Err(Error::Rejected {
                status: 409,
                message: format!("object {path} already exists"),
            });
        }
        objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );

        Ok(format!("memory://{}/{path}", self.bucket))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("avatars")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
