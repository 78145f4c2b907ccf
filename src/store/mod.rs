//! Durable user preferences.
//!
//! Exactly one preference is persisted today (the UI theme), so the store
//! surface is a narrow string key-value interface rather than a full cache.

pub mod disk;
pub mod memory;

use anyhow::Result;

pub const THEME_KEY: &str = "theme";

pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
