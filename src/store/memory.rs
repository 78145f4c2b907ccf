use crate::store::PreferenceStore;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory preference store for tests and headless runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if let Ok(mut map) = self.inner.write() {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_overwrite() {
        let store = MemoryStore::new();
        assert!(store.get("theme").is_none());

        store.set("theme", "dark").unwrap();
        assert_eq!(store.get("theme"), Some("dark".to_string()));

        store.set("theme", "light").unwrap();
        assert_eq!(store.get("theme"), Some("light".to_string()));
    }
}
