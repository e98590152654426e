//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] for the watering
//! controller on top of one blob backend.  The config blob and the ledger
//! fields live in separate namespaces; every `nvs_set_blob` is followed by
//! `nvs_commit`, which ESP-IDF makes atomic per key.
//!
//! Off-target the backend is an in-memory `HashMap`, so host tests see
//! the same semantics without flash.

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;
use crate::scheduler::ml_to_ms;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "plantwater";
const CONFIG_KEY: &str = "syscfg";

/// Largest blob read back; the config is well under this.
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Initialise NVS flash and return an adapter over it.
    ///
    /// A partition with no free pages or a newer layout is erased and
    /// re-initialised; any other failure is `ConfigError::IoError`.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other
            // NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                esp_check(unsafe { nvs_flash_erase() }).map_err(|_| ConfigError::IoError)?;
                esp_check(unsafe { nvs_flash_init() }).map_err(|_| ConfigError::IoError)?;
            } else {
                esp_check(ret).map_err(|_| ConfigError::IoError)?;
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    // ── Blob backend ──────────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{namespace}::{key}")
    }

    #[cfg(not(target_os = "espidf"))]
    fn get_blob(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let store = self.store.borrow();
        let data = store
            .get(&Self::composite_key(namespace, key))
            .ok_or(StorageError::NotFound)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_blob(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store
            .borrow_mut()
            .insert(Self::composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn erase_blob(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store
            .borrow_mut()
            .remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn get_blob(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let key = nvs_name(key);
        with_nvs_handle(namespace, false, |handle| {
            let mut size = buf.len();
            // SAFETY: `key` is NUL-terminated and `size` is the length of `buf`.
            esp_check(unsafe {
                nvs_get_blob(handle, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
            })?;
            Ok(size)
        })
        .map_err(storage_error)
    }

    #[cfg(target_os = "espidf")]
    fn set_blob(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let key = nvs_name(key);
        with_nvs_handle(namespace, true, |handle| {
            // SAFETY: `key` is NUL-terminated and `data` outlives the call.
            esp_check(unsafe {
                nvs_set_blob(handle, key.as_ptr().cast(), data.as_ptr().cast(), data.len())
            })?;
            esp_check(unsafe { nvs_commit(handle) })
        })
        .map_err(storage_error)
    }

    #[cfg(target_os = "espidf")]
    fn erase_blob(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let key = nvs_name(key);
        with_nvs_handle(namespace, true, |handle| {
            // SAFETY: `key` is NUL-terminated.
            match unsafe { nvs_erase_key(handle, key.as_ptr().cast()) } {
                ESP_OK | ESP_ERR_NVS_NOT_FOUND => esp_check(unsafe { nvs_commit(handle) }),
                ret => Err(ret),
            }
        })
        .map_err(storage_error)
    }
}

/// NVS names are at most 15 bytes plus the terminator; longer ones are cut.
#[cfg(target_os = "espidf")]
fn nvs_name(name: &str) -> [u8; 16] {
    let mut buf = [0u8; 16];
    let len = name.len().min(15);
    buf[..len].copy_from_slice(&name.as_bytes()[..len]);
    buf
}

#[cfg(target_os = "espidf")]
fn esp_check(ret: esp_err_t) -> Result<(), esp_err_t> {
    if ret == ESP_OK { Ok(()) } else { Err(ret) }
}

#[cfg(target_os = "espidf")]
fn storage_error(ret: esp_err_t) -> StorageError {
    match ret {
        ESP_ERR_NVS_NOT_FOUND => StorageError::NotFound,
        ESP_ERR_NVS_NOT_ENOUGH_SPACE => StorageError::Full,
        _ => StorageError::IoError,
    }
}

/// Open `namespace`, run `f` with the handle, then close it.
#[cfg(target_os = "espidf")]
fn with_nvs_handle<T>(
    namespace: &str,
    write: bool,
    f: impl FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
) -> Result<T, esp_err_t> {
    let ns = nvs_name(namespace);
    let mode = if write {
        nvs_open_mode_t_NVS_READWRITE
    } else {
        nvs_open_mode_t_NVS_READONLY
    };
    let mut handle: nvs_handle_t = 0;
    // SAFETY: `ns` is NUL-terminated; the handle is closed below.
    esp_check(unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) })?;
    let result = f(handle);
    unsafe { nvs_close(handle) };
    result
}

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if cfg.pump_portion_ml == 0 {
        return Err(ConfigError::ValidationFailed("pump_portion_ml must be > 0"));
    }
    if cfg.pump_flow_ml_per_100s == 0 {
        return Err(ConfigError::ValidationFailed(
            "pump_flow_ml_per_100s must be > 0",
        ));
    }
    let pump_ms = ml_to_ms(u32::from(cfg.pump_portion_ml), cfg.pump_flow_ml_per_100s);
    if pump_ms >= u64::from(cfg.period_ms) {
        warn!(
            "config: pump run {} ms does not fit in period {} ms",
            pump_ms, cfg.period_ms
        );
        return Err(ConfigError::ValidationFailed(
            "pump run time must be shorter than period_ms",
        ));
    }
    if cfg.container_capacity_ml == 0 {
        return Err(ConfigError::ValidationFailed(
            "container_capacity_ml must be > 0",
        ));
    }
    if cfg.low_water_threshold_ml > cfg.container_capacity_ml {
        return Err(ConfigError::ValidationFailed(
            "low_water_threshold_ml must be <= container_capacity_ml",
        ));
    }
    if cfg.alarm_pulse_width_ms >= cfg.alarm_pulse_period_ms {
        return Err(ConfigError::ValidationFailed(
            "alarm_pulse_width_ms must be < alarm_pulse_period_ms",
        ));
    }
    if !(10..=1000).contains(&cfg.control_loop_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "control_loop_interval_ms must be 10–1000",
        ));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        match self.get_blob(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => {
                let cfg = postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsAdapter: loaded config ({len} bytes)");
                Ok(cfg)
            }
            Err(StorageError::NotFound) => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
            Err(e) => {
                warn!("NvsAdapter: config read failed ({e}), using defaults");
                Ok(SystemConfig::default())
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.set_blob(CONFIG_NAMESPACE, CONFIG_KEY, &bytes)
            .map_err(|e| {
                warn!("NvsAdapter: config write failed ({e})");
                match e {
                    StorageError::Full => ConfigError::StorageFull,
                    _ => ConfigError::IoError,
                }
            })?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.get_blob(namespace, key, buf)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.set_blob(namespace, key, data)
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.erase_blob(namespace, key)
    }
}

impl Default for NvsAdapter {
    fn default() -> Self {
        // Falls back to an empty, unpersisted store if NVS cannot be opened.
        Self::new().unwrap_or_else(|_| Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }
}
