use crate::store::PreferenceStore;
use anyhow::Result;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use tracing::debug;

/// Preference store persisted under the application data directory.
pub struct DiskStore {
    _keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let keyspace = fjall::Config::new(path).open()?;
        let partition = keyspace.open_partition("preferences", PartitionCreateOptions::default())?;
        Ok(DiskStore {
            _keyspace: keyspace,
            partition,
        })
    }
}

impl PreferenceStore for DiskStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.partition.get(key) {
            Ok(Some(value)) => String::from_utf8(value.to_vec()).ok(),
            Ok(None) => None,
            Err(e) => {
                debug!("Preference read error for {key}: {e}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!("Preference SET {key}={value}");
        self.partition.insert(key, value)?;
        Ok(())
    }
}
