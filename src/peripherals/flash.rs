//! Settings storage in internal flash
//!
//! The last flash page holds a single settings record. The SoftDevice owns
//! the flash controller, so all access goes through its flash API.

use embedded_storage_async::nor_flash::{NorFlash, ReadNorFlash};
use fitface::settings::store::{RecordStore, RECORD_LEN};
use nrf_softdevice::Flash;

/// Start of the `SETTINGS` region in `memory.x`
const SETTINGS_PAGE: u32 = 0x7_F000;

/// The SoftDevice writes whole words from word aligned buffers
#[repr(align(4))]
struct Aligned([u8; RECORD_LEN]);

pub struct SettingsFlash {
    flash: Flash,
}

impl SettingsFlash {
    pub fn new(flash: Flash) -> Self {
        Self { flash }
    }

    /// Read the stored settings; unreadable flash yields defaults.
    pub async fn load(&mut self) -> RecordStore {
        let mut buf = Aligned([0; RECORD_LEN]);
        match self.flash.read(SETTINGS_PAGE, &mut buf.0).await {
            Ok(()) => RecordStore::from_record(&buf.0),
            Err(_) => {
                defmt::warn!("Failed to read settings page");
                RecordStore::new()
            }
        }
    }

    /// Replace the stored record with `store`
    pub async fn save(&mut self, store: &RecordStore) -> Result<(), Error> {
        let record = Aligned(store.to_record());
        self.flash
            .erase(SETTINGS_PAGE, SETTINGS_PAGE + Flash::ERASE_SIZE as u32)
            .await
            .map_err(|_| Error::Erase)?;
        self.flash
            .write(SETTINGS_PAGE, &record.0)
            .await
            .map_err(|_| Error::Write)?;
        defmt::debug!("Settings saved");
        Ok(())
    }
}

#[derive(Debug, defmt::Format)]
pub enum Error {
    Erase,
    Write,
}
