//! Persistent key/value storage for the watch face settings
//!
//! [`RecordStore`] holds the values in RAM and serializes them to a single
//! fixed-size record, which the firmware writes to flash whenever the store
//! is dirty. Writing the whole record at once keeps related keys, like the
//! three color channels, consistent on flash.

use super::KEY_COUNT;

/// Size of an encoded record in bytes
pub const RECORD_LEN: usize = 8 + 4 * KEY_COUNT;

const MAGIC: [u8; 4] = *b"FFCE";
const VERSION: u8 = 1;

/// Integer and boolean storage addressed by small numeric keys
pub trait KeyValueStore {
    /// Whether a value was ever written for `key`
    fn contains(&self, key: u32) -> bool {
        self.read_int(key).is_some()
    }

    fn read_int(&self, key: u32) -> Option<i32>;

    fn write_int(&mut self, key: u32, value: i32) -> Result<(), Error>;

    fn read_bool(&self, key: u32) -> Option<bool> {
        self.read_int(key).map(|value| value != 0)
    }

    fn write_bool(&mut self, key: u32, value: bool) -> Result<(), Error> {
        self.write_int(key, value as i32)
    }
}

/// In-memory store with a flash record representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordStore {
    slots: [Option<i32>; KEY_COUNT],
    /// Changed since the last [`take_dirty`](Self::take_dirty)
    dirty: bool,
}

impl RecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from a flash record.
    ///
    /// Erased flash, a record from another application or an older layout
    /// all result in an empty store.
    pub fn from_record(record: &[u8]) -> Self {
        let mut store = Self::new();
        let Some(record) = record.get(..RECORD_LEN) else {
            warn!("Settings record too short ({} bytes)", record.len());
            return store;
        };
        if record[..4] != MAGIC {
            info!("No settings record found, using defaults");
            return store;
        }
        if record[4] != VERSION {
            warn!("Ignoring settings record version {}", record[4]);
            return store;
        }
        let present = record[5];
        for (index, slot) in store.slots.iter_mut().enumerate() {
            if present & (1 << index) != 0 {
                let offset = 8 + 4 * index;
                let bytes = [
                    record[offset],
                    record[offset + 1],
                    record[offset + 2],
                    record[offset + 3],
                ];
                *slot = Some(i32::from_le_bytes(bytes));
            }
        }
        store
    }

    /// Serialize the store into its flash record
    pub fn to_record(&self) -> [u8; RECORD_LEN] {
        let mut record = [0u8; RECORD_LEN];
        record[..4].copy_from_slice(&MAGIC);
        record[4] = VERSION;
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(value) = slot {
                record[5] |= 1 << index;
                let offset = 8 + 4 * index;
                record[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
            }
        }
        record
    }

    /// Return whether the store changed since the last call and reset the flag.
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    fn slot(key: u32) -> Result<usize, Error> {
        let index = key as usize;
        if index < KEY_COUNT {
            Ok(index)
        } else {
            Err(Error::UnknownKey(key))
        }
    }
}

impl KeyValueStore for RecordStore {
    fn read_int(&self, key: u32) -> Option<i32> {
        let index = Self::slot(key).ok()?;
        self.slots[index]
    }

    fn write_int(&mut self, key: u32, value: i32) -> Result<(), Error> {
        let index = Self::slot(key)?;
        if self.slots[index] != Some(value) {
            self.slots[index] = Some(value);
            self.dirty = true;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Key outside the set of persisted settings
    UnknownKey(u32),
}
