use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::repository::SessionRepository;
use crate::errors::AdminError;
use crate::storage::JsonMapStore;

/// Session keys persisted as a JSON map on local disk.
#[derive(Clone)]
pub struct FileSessionRepository {
    store: Arc<JsonMapStore<String, String>>,
}

impl FileSessionRepository {
    /// Open (or create) the session file at `path`.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, AdminError> {
        let store = JsonMapStore::<String, String>::new(path).await?;
        Ok(Self { store })
    }
}

#[async_trait]
impl SessionRepository for FileSessionRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, AdminError> {
        Ok(self.store.get(&key.to_string()).await)
    }

    async fn put_all(&self, entries: Vec<(String, String)>) -> Result<(), AdminError> {
        self.store.update_map(|m| m.extend(entries)).await?;
        Ok(())
    }

    async fn remove_all(&self, keys: &[&str]) -> Result<(), AdminError> {
        self.store
            .update_map(|m| {
                for key in keys {
                    m.remove(*key);
                }
            })
            .await?;
        Ok(())
    }
}
