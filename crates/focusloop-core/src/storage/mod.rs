mod config;
pub mod database;
pub mod kv;
pub mod session_store;

pub use config::{AlertsConfig, Config, TimerConfig, MAX_FOCUS_MINUTES, MAX_ITEMS_LIMIT};
pub use database::{CatalogItem, Database, FocusRecord, ItemCatalog};
pub use kv::{KvBackend, MemoryKv};
pub use session_store::{Session, SessionField, SessionStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding `focusloop.db` and `config.toml`.
///
/// `FOCUSLOOP_DATA_DIR` wins when set. Otherwise `~/.config/focusloop[-dev]/`,
/// with `FOCUSLOOP_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSLOOP_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FOCUSLOOP_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("focusloop-dev")
            } else {
                base_dir.join("focusloop")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
