use async_trait::async_trait;

use crate::errors::AdminError;

/// Persistence for the session keys.
///
/// `put_all` and `remove_all` must be all-or-nothing from the caller's point
/// of view: a login either persists every key or none.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AdminError>;
    async fn put_all(&self, entries: Vec<(String, String)>) -> Result<(), AdminError>;
    async fn remove_all(&self, keys: &[&str]) -> Result<(), AdminError>;
}

/// Simple in-memory repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemorySessionRepository {
        values: Mutex<HashMap<String, String>>,
    }

    impl MemorySessionRepository {
        pub fn with_entries(entries: &[(&str, &str)]) -> Self {
            let values = entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
            Self { values: Mutex::new(values) }
        }

        pub fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.values.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }

        pub fn is_empty(&self) -> bool {
            self.values.lock().unwrap().is_empty()
        }
    }

    #[async_trait]
    impl SessionRepository for MemorySessionRepository {
        async fn get(&self, key: &str) -> Result<Option<String>, AdminError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn put_all(&self, entries: Vec<(String, String)>) -> Result<(), AdminError> {
            self.values.lock().unwrap().extend(entries);
            Ok(())
        }

        async fn remove_all(&self, keys: &[&str]) -> Result<(), AdminError> {
            let mut values = self.values.lock().unwrap();
            for key in keys {
                values.remove(*key);
            }
            Ok(())
        }
    }
}
