use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::warn;

use super::StoreError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file. Writes go to a sibling temp
/// file first and are renamed into place, so a crash never leaves half a map.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Open the store at `path`. A missing file is created empty; an
    /// unreadable one is treated as empty and overwritten on the next save.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, StoreError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %file_path.display(), error = %e, "discarding unreadable store file");
                HashMap::new()
            }),
            Err(_) => {
                let empty: HashMap<K, V> = HashMap::new();
                write_file(&file_path, &serde_json::to_vec(&empty)?).await?;
                empty
            }
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Apply a mutation and persist it with one write. The mutation runs on
    /// a copy that only replaces the in-memory map once the file is written,
    /// so a failed save leaves memory and disk agreeing.
    pub async fn update_map<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut HashMap<K, V>),
    {
        let mut map = self.inner.write().await;
        let mut next = map.clone();
        f(&mut next);
        write_file(&self.file_path, &serde_json::to_vec(&next)?).await?;
        *map = next;
        Ok(())
    }
}

async fn write_file(path: &PathBuf, data: &[u8]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io { path: path.display().to_string(), source };
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data).await.map_err(io_err)?;
    fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(prefix: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{prefix}_{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn updates_persist_across_reopen() -> Result<(), anyhow::Error> {
        let tmp = temp_path("json_map_store");
        let store = JsonMapStore::<String, String>::new(&tmp).await?;
        assert_eq!(store.get(&"a".into()).await, None);

        store
            .update_map(|m| {
                m.insert("a".into(), "1".into());
                m.insert("b".into(), "2".into());
            })
            .await?;
        store
            .update_map(|m| {
                m.insert("a".into(), "10".into());
                m.remove("b");
            })
            .await?;

        let reloaded = JsonMapStore::<String, String>::new(&tmp).await?;
        assert_eq!(reloaded.get(&"a".into()).await.as_deref(), Some("10"));
        assert_eq!(reloaded.get(&"b".into()).await, None);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_untouched() -> Result<(), anyhow::Error> {
        let tmp = temp_path("json_map_store_ro");
        let store = JsonMapStore::<String, String>::new(&tmp).await?;
        store
            .update_map(|m| {
                m.insert("token".into(), "old".into());
            })
            .await?;

        // a directory where the temp file goes makes every write fail
        let blocker = tmp.with_extension("tmp");
        tokio::fs::create_dir_all(&blocker).await?;

        let removed = store
            .update_map(|m| {
                m.remove("token");
            })
            .await;
        assert!(removed.is_err());
        assert_eq!(store.get(&"token".into()).await.as_deref(), Some("old"));

        let inserted = store
            .update_map(|m| {
                m.insert("token".into(), "new".into());
            })
            .await;
        assert!(inserted.is_err());
        assert_eq!(store.get(&"token".into()).await.as_deref(), Some("old"));

        let reloaded = JsonMapStore::<String, String>::new(&tmp).await?;
        assert_eq!(reloaded.get(&"token".into()).await.as_deref(), Some("old"));

        let _ = tokio::fs::remove_dir(&blocker).await;
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_empty() -> Result<(), anyhow::Error> {
        let tmp = temp_path("json_map_store_bad");
        tokio::fs::write(&tmp, b"{not json").await?;
        let store = JsonMapStore::<String, String>::new(&tmp).await?;
        assert_eq!(store.get(&"token".into()).await, None);
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
