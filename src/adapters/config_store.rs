//! Configuration storage adapters.
//!
//! - [`MemoryConfigStore`] keeps a postcard blob in memory, the same
//!   encoding a flash key-value store would hold.
//! - [`JsonConfigFile`] reads and writes a human-editable JSON file; the
//!   simulator loads its `--config` through it.
//!
//! Both validate on save and on load, so a hand-edited or corrupted store
//! can never feed out-of-range values into the guardian.

use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::GuardConfig;

// ───────────────────────────────────────────────────────────────
// In-memory postcard store
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    blob: RefCell<Option<Vec<u8>>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw bytes (e.g. to simulate a corrupted blob).
    pub fn with_blob(bytes: Vec<u8>) -> Self {
        Self {
            blob: RefCell::new(Some(bytes)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blob.borrow().is_none()
    }
}

impl ConfigPort for MemoryConfigStore {
    fn load(&self) -> Result<GuardConfig, ConfigError> {
        let blob = self.blob.borrow();
        let Some(bytes) = blob.as_deref() else {
            info!("MemoryConfigStore: no stored config, using defaults");
            return Ok(GuardConfig::default());
        };
        let cfg: GuardConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("MemoryConfigStore: loaded config ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&self, config: &GuardConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        info!("MemoryConfigStore: config saved ({} bytes)", bytes.len());
        *self.blob.borrow_mut() = Some(bytes);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// JSON file store
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<GuardConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "JsonConfigFile: {} not found, using defaults",
                    self.path.display()
                );
                return Ok(GuardConfig::default());
            }
            Err(e) => {
                warn!("JsonConfigFile: read {} failed: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };
        let cfg: GuardConfig = serde_json::from_str(&text).map_err(|e| {
            warn!("JsonConfigFile: {} is not a valid config: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        cfg.validate()?;
        info!("JsonConfigFile: loaded {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &GuardConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigError::IoError)?;
        fs::write(&self.path, text).map_err(|e| {
            warn!("JsonConfigFile: write {} failed: {}", self.path.display(), e);
            ConfigError::IoError
        })?;
        info!("JsonConfigFile: saved {}", self.path.display());
        Ok(())
    }
}
