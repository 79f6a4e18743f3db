//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`StoragePort`] and [`ConfigPort`].  Every document is
//! stored as a JSON blob under its key in the `plantwater` namespace.
//!
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - Config validation: all fields are range-checked before persistence.
//! - The simulation backend (host builds) keeps the same byte-level
//!   encoding in memory, so corrupt-document handling is exercised too.

use log::info;
#[cfg(feature = "espidf")]
use log::warn;
use serde_json::Value;

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::WateringConfig;

#[cfg(not(feature = "espidf"))]
use std::collections::HashMap;

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(feature = "espidf")]
const NAMESPACE: &str = "plantwater";
/// Key of the persisted [`WateringConfig`].
pub const CONFIG_KEY: &str = "config";

/// Largest document accepted; the watering documents are well under 100 bytes.
const MAX_DOC_SIZE: usize = 1024;

pub struct NvsStore {
    #[cfg(not(feature = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsStore {
    /// Create the store and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(StorageError::IoError);
            }
            info!("NvsStore: ESP-IDF NVS initialised");
        }

        #[cfg(not(feature = "espidf"))]
        info!("NvsStore: simulation backend");

        Ok(Self {
            #[cfg(not(feature = "espidf"))]
            store: HashMap::new(),
        })
    }

    fn encode(document: &Value) -> Result<Vec<u8>, StorageError> {
        let bytes = serde_json::to_vec(document).map_err(|_| StorageError::Corrupted)?;
        if bytes.len() > MAX_DOC_SIZE {
            return Err(StorageError::Full);
        }
        Ok(bytes)
    }

    fn decode(bytes: &[u8]) -> Result<Value, StorageError> {
        serde_json::from_slice(bytes).map_err(|_| StorageError::Corrupted)
    }

    /// NUL-terminated NVS name (max 15 characters).
    #[cfg(feature = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open the namespace, execute a closure with the handle, then close.
    #[cfg(feature = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(NAMESPACE);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(feature = "espidf")]
    fn read_blob(key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key = Self::c_name(key);
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size: usize = 0;
            // First call: get size
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_DOC_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH);
            }
            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(buf)
        });
        match result {
            Ok(bytes) => Ok(Some(bytes)),
            // A namespace that was never written cannot be opened read-only.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(StorageError::Corrupted),
            Err(e) => {
                warn!("NvsStore: read error {}", e);
                Err(StorageError::IoError)
            }
        }
    }

    #[cfg(feature = "espidf")]
    fn write_blob(key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let key = Self::c_name(key);
        let result = Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(handle, key.as_ptr() as *const _, bytes.as_ptr() as *const _, bytes.len())
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|e| {
            warn!("NvsStore: write error {}", e);
            if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                StorageError::Full
            } else {
                StorageError::IoError
            }
        })
    }

    #[cfg(feature = "espidf")]
    fn erase_blob(key: &str) -> Result<(), StorageError> {
        let key = Self::c_name(key);
        let result = Self::with_nvs_handle(true, |handle| {
            let ret = unsafe { nvs_erase_key(handle, key.as_ptr() as *const _) };
            if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|_| StorageError::IoError)
    }
}

impl StoragePort for NvsStore {
    fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        #[cfg(not(feature = "espidf"))]
        let bytes = self.store.get(key).cloned();

        #[cfg(feature = "espidf")]
        let bytes = Self::read_blob(key)?;

        bytes.map(|b| Self::decode(&b)).transpose()
    }

    fn write(&mut self, key: &str, document: &Value) -> Result<(), StorageError> {
        let bytes = Self::encode(document)?;

        #[cfg(not(feature = "espidf"))]
        {
            self.store.insert(key.to_string(), bytes);
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            Self::write_blob(key, &bytes)
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        #[cfg(not(feature = "espidf"))]
        {
            self.store.remove(key);
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            Self::erase_blob(key)
        }
    }
}

impl ConfigPort for NvsStore {
    fn load(&self) -> Result<WateringConfig, ConfigError> {
        let Some(doc) = self.read(CONFIG_KEY)? else {
            info!("NvsStore: no stored config, using defaults");
            return Ok(WateringConfig::default());
        };
        let cfg: WateringConfig = serde_json::from_value(doc).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("NvsStore: loaded config");
        Ok(cfg)
    }

    fn save(&mut self, config: &WateringConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let doc = serde_json::to_value(config).map_err(|_| ConfigError::IoError)?;
        self.write(CONFIG_KEY, &doc)?;
        info!("NvsStore: config saved");
        Ok(())
    }
}
