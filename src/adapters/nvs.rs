//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`]: the [`ServoConfig`] is stored as a single
//! `postcard` blob under `servolink::cfg`.
//!
//! - **`target_os = "espidf"`** — `esp_idf_svc::nvs::EspNvs` on the
//!   default partition.  Commits are atomic per blob write.
//! - **all other targets** — in-memory map, for host tests.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::ServoConfig;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

const CONFIG_NAMESPACE: &str = "servolink";
const CONFIG_KEY: &str = "cfg";

/// Upper bound for the encoded config; well above what the bounded
/// strings can produce.
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(target_os = "espidf")]
    nvs: EspNvs<NvsDefault>,
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsAdapter {
    /// Open the config namespace on the default NVS partition.
    #[cfg(target_os = "espidf")]
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, ConfigError> {
        let nvs = EspNvs::new(partition, CONFIG_NAMESPACE, true).map_err(|e| {
            warn!("NvsAdapter: open '{}' failed: {:?}", CONFIG_NAMESPACE, e);
            ConfigError::IoError
        })?;
        info!("NvsAdapter: ESP-IDF NVS namespace '{}' open", CONFIG_NAMESPACE);
        Ok(Self { nvs })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, ConfigError> {
        info!("NvsAdapter: simulation backend");
        Ok(Self {
            store: HashMap::new(),
        })
    }

    /// Load the stored config, or persist and return `fallback` on first boot.
    pub fn load_or_init(&mut self, fallback: ServoConfig) -> Result<ServoConfig, ConfigError> {
        match self.load() {
            Ok(cfg) => Ok(cfg),
            Err(ConfigError::NotFound) => {
                info!("NvsAdapter: no stored config, writing defaults");
                self.save(&fallback)?;
                Ok(fallback)
            }
            Err(e) => Err(e),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self, buf: &mut [u8]) -> Result<Option<usize>, ConfigError> {
        let blob = self
            .nvs
            .get_blob(CONFIG_KEY, buf)
            .map_err(|_| ConfigError::IoError)?;
        Ok(blob.map(<[u8]>::len))
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self, buf: &mut [u8]) -> Result<Option<usize>, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        match self.store.get(&key) {
            Some(bytes) if bytes.len() > buf.len() => Err(ConfigError::Corrupted),
            Some(bytes) => {
                buf[..bytes.len()].copy_from_slice(bytes);
                Ok(Some(bytes.len()))
            }
            None => Ok(None),
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        self.nvs
            .set_blob(CONFIG_KEY, bytes)
            .map_err(|_| ConfigError::IoError)
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        self.store.insert(key, bytes.to_vec());
        Ok(())
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<ServoConfig, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let len = self.read_blob(&mut buf)?.ok_or(ConfigError::NotFound)?;
        let cfg: ServoConfig =
            postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
        // A blob from an older build may no longer validate.
        cfg.validate()?;
        info!("NvsAdapter: loaded config ({} bytes)", len);
        Ok(cfg)
    }

    fn save(&mut self, config: &ServoConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::Corrupted)?;
        if bytes.len() > MAX_BLOB_SIZE {
            warn!("NvsAdapter: config blob {} bytes exceeds limit", bytes.len());
            return Err(ConfigError::IoError);
        }
        self.write_blob(&bytes)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
