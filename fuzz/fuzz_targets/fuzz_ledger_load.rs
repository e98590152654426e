//! Fuzz target: `Ledger::load`
//!
//! Splits the input into one blob per ledger key (marker included) and
//! loads from it, verifying:
//! - No panics under arbitrary stored bytes
//! - A successful load re-stores as a no-op
//!
//! cargo fuzz run fuzz_ledger_load

#![no_main]

use libfuzzer_sys::fuzz_target;
use plantwater::app::ports::{StorageError, StoragePort};
use plantwater::ledger::{Ledger, NAMESPACE};
use std::collections::HashMap;

const KEYS: [&str; 8] = ["marker", "stats", "total", "hour", "pump", "idle", "wet", "day"];

// ── In-memory StoragePort for fuzz testing ────────────────────

struct MemStore {
    data: HashMap<String, Vec<u8>>,
}

impl StoragePort for MemStore {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.data.get(&format!("{ns}::{key}")) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data.insert(format!("{ns}::{key}"), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&format!("{ns}::{key}"));
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    // Each field is prefixed by a length byte; a length of 0xFF leaves the
    // key absent.
    let mut store = MemStore {
        data: HashMap::new(),
    };
    let mut rest = data;
    for key in KEYS {
        let Some((&len, tail)) = rest.split_first() else {
            break;
        };
        if len == 0xFF {
            rest = tail;
            continue;
        }
        let n = usize::from(len).min(tail.len());
        store.data.insert(format!("{NAMESPACE}::{key}"), tail[..n].to_vec());
        rest = &tail[n..];
    }

    let mut ledger = Ledger::new(store);
    if let Ok(record) = ledger.load() {
        let written = ledger.store(&record).expect("in-memory store never fails");
        assert_eq!(written, 0, "re-storing a freshly loaded record wrote {written} keys");
    }
});
