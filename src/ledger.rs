//! Persistent ledger.
//!
//! The durable image of the controller: pump statistics plus the timing
//! checkpoints needed to resume after a power loss.  Stored in its own
//! namespace of a [`StoragePort`], one key per field, each value a
//! `postcard` blob:
//!
//! | Key      | Field                     | Type           |
//! |----------|---------------------------|----------------|
//! | `stats`  | 24-slot history           | `[u16; 24]`    |
//! | `total`  | pumped since refill       | `u32`          |
//! | `hour`   | drift checkpoint          | `u64`          |
//! | `pump`   | last pump start           | `u64`          |
//! | `idle`   | idle window start         | `u64`          |
//! | `wet`    | last wet observation      | `Option<u64>`  |
//! | `day`    | day of the current slot   | `u8`           |
//! | `marker` | `[0xAA, LAYOUT_VERSION]`  | raw bytes      |
//!
//! The marker is written after every field on first initialisation (and
//! is removed first by [`Ledger::invalidate`]), so a power loss during a
//! full rewrite leaves storage reading as "not configured" rather than as
//! a half-old record.
//!
//! [`Ledger::store`] keeps a shadow of the last image it wrote or read
//! and only rewrites fields that changed; each write is atomic per key.

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::app::ports::{StorageError, StoragePort};
use crate::error::LedgerError;
use crate::statistics::HISTORY_SLOTS;

/// Storage namespace.
pub const NAMESPACE: &str = "ledger";

/// First marker byte of a configured ledger.
pub const CONFIGURED_MARK: u8 = 0xAA;

/// Bumped whenever a field is added, removed or changes type.
pub const LAYOUT_VERSION: u8 = 1;

/// Largest encoded field (the history array is at most 72 bytes).
const FIELD_BUF: usize = 128;

pub(crate) mod key {
    pub const STATS: &str = "stats";
    pub const TOTAL: &str = "total";
    pub const HOUR: &str = "hour";
    pub const PUMP: &str = "pump";
    pub const IDLE: &str = "idle";
    pub const WET: &str = "wet";
    pub const DAY: &str = "day";
    pub const MARKER: &str = "marker";

    #[cfg(test)]
    pub const FIELDS: [&str; 7] = [STATS, TOTAL, HOUR, PUMP, IDLE, WET, DAY];
}

/// Everything that survives a reboot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentRecord {
    pub statistics: [u16; HISTORY_SLOTS],
    pub pumped_total_ml: u32,
    pub last_hour_started_ms: u64,
    pub pump_started_ms: u64,
    pub idle_started_ms: u64,
    /// `None` until water has been seen at least once.
    pub last_wet_ms: Option<u64>,
    pub statistics_day: u8,
}

/// Typed, versioned record over a key/value store.
pub struct Ledger<S: StoragePort> {
    storage: S,
    /// Last image known to be on storage.  `None` means storage is not
    /// (or not known to be) a complete record.
    shadow: Option<PersistentRecord>,
}

impl<S: StoragePort> Ledger<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            shadow: None,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Read the full record.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotConfigured`] when the marker is absent or wrong.
    /// - [`LedgerError::LayoutMismatch`] for a different layout version.
    /// - [`LedgerError::Corrupted`] naming the first unreadable field.
    /// - [`LedgerError::Storage`] when the backend fails.
    pub fn load(&mut self) -> Result<PersistentRecord, LedgerError> {
        self.shadow = None;
        self.check_marker()?;

        let record = PersistentRecord {
            statistics: self.get(key::STATS)?,
            pumped_total_ml: self.get(key::TOTAL)?,
            last_hour_started_ms: self.get(key::HOUR)?,
            pump_started_ms: self.get(key::PUMP)?,
            idle_started_ms: self.get(key::IDLE)?,
            last_wet_ms: self.get(key::WET)?,
            statistics_day: self.get(key::DAY)?,
        };
        info!(
            "ledger: restored (total {} ml, day {})",
            record.pumped_total_ml, record.statistics_day
        );
        self.shadow = Some(record.clone());
        Ok(record)
    }

    /// Write `record`, touching only fields that differ from the last
    /// image on storage.  Returns the number of keys written.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if a write fails.  Fields written
    /// before the failure stay written; the next call rewrites everything.
    pub fn store(&mut self, record: &PersistentRecord) -> Result<usize, LedgerError> {
        let previous = self.shadow.take();
        match self.write_fields(record, previous.as_ref()) {
            Ok(written) => {
                if written > 0 {
                    debug!("ledger: {written} field(s) written");
                }
                self.shadow = Some(record.clone());
                Ok(written)
            }
            Err(e) => {
                warn!("ledger: store failed: {e}");
                Err(e)
            }
        }
    }

    /// Remove the marker so storage reads as unconfigured until the next
    /// complete [`store`](Self::store).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if the backend refuses the delete.
    pub fn invalidate(&mut self) -> Result<(), LedgerError> {
        self.shadow = None;
        self.storage.delete(NAMESPACE, key::MARKER)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn check_marker(&self) -> Result<(), LedgerError> {
        let mut buf = [0u8; 2];
        let len = match self.storage.read(NAMESPACE, key::MARKER, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return Err(LedgerError::NotConfigured),
            Err(e) => return Err(e.into()),
        };
        if len == 0 || buf[0] != CONFIGURED_MARK {
            return Err(LedgerError::NotConfigured);
        }
        let found = if len >= 2 { buf[1] } else { 0 };
        if found != LAYOUT_VERSION {
            return Err(LedgerError::LayoutMismatch { found });
        }
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, field: &'static str) -> Result<T, LedgerError> {
        let mut buf = [0u8; FIELD_BUF];
        let len = match self.storage.read(NAMESPACE, field, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return Err(LedgerError::Corrupted(field)),
            Err(e) => return Err(e.into()),
        };
        postcard::from_bytes(&buf[..len]).map_err(|_| LedgerError::Corrupted(field))
    }

    fn put<T: Serialize + PartialEq>(
        &mut self,
        field: &'static str,
        value: &T,
        previous: Option<&T>,
    ) -> Result<usize, LedgerError> {
        if previous == Some(value) {
            return Ok(0);
        }
        let bytes = postcard::to_allocvec(value).map_err(|_| LedgerError::Corrupted(field))?;
        self.storage.write(NAMESPACE, field, &bytes)?;
        Ok(1)
    }

    fn write_fields(
        &mut self,
        record: &PersistentRecord,
        previous: Option<&PersistentRecord>,
    ) -> Result<usize, LedgerError> {
        let mut written = 0;
        written += self.put(key::STATS, &record.statistics, previous.map(|p| &p.statistics))?;
        written += self.put(
            key::TOTAL,
            &record.pumped_total_ml,
            previous.map(|p| &p.pumped_total_ml),
        )?;
        written += self.put(
            key::HOUR,
            &record.last_hour_started_ms,
            previous.map(|p| &p.last_hour_started_ms),
        )?;
        written += self.put(
            key::PUMP,
            &record.pump_started_ms,
            previous.map(|p| &p.pump_started_ms),
        )?;
        written += self.put(
            key::IDLE,
            &record.idle_started_ms,
            previous.map(|p| &p.idle_started_ms),
        )?;
        written += self.put(key::WET, &record.last_wet_ms, previous.map(|p| &p.last_wet_ms))?;
        written += self.put(
            key::DAY,
            &record.statistics_day,
            previous.map(|p| &p.statistics_day),
        )?;

        if previous.is_none() {
            self.storage
                .write(NAMESPACE, key::MARKER, &[CONFIGURED_MARK, LAYOUT_VERSION])?;
            written += 1;
            info!("ledger: initialised (layout v{LAYOUT_VERSION})");
        }
        Ok(written)
    }
}
