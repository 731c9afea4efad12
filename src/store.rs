//! Persisted settings and credentials on top of a [`StoragePort`].
//!
//! ## Layout
//!
//! ```text
//!   fa_meta  / active     1 byte   'a' | 'b'   slot selector
//!   fa_cfg_a / serverURL  utf-8
//!            / board      utf-8
//!            / location   utf-8
//!            / interval   u32 LE   milliseconds
//!   fa_cfg_b / (same keys)
//!   fa_wifi  / creds      postcard WifiCredentials
//! ```
//!
//! A save writes every key into the slot that is *not* active and only then
//! flips `active`.  Single-key writes are atomic on the medium, so a crash
//! at any point leaves `load()` returning either the complete old record or
//! the complete new one.  A store without a selector is read from slot A.

use log::{info, warn};

use crate::app::ports::{ConfigPort, StoragePort};
use crate::config::{
    self, MAX_BOARD_LEN, MAX_LOCATION_LEN, MAX_SERVER_LEN, Settings, WifiCredentials,
};
use crate::error::StoreError;

const META_NAMESPACE: &str = "fa_meta";
const ACTIVE_KEY: &str = "active";
const SLOT_A: &str = "fa_cfg_a";
const SLOT_B: &str = "fa_cfg_b";

pub const KEY_SERVER_URL: &str = "serverURL";
pub const KEY_BOARD: &str = "board";
pub const KEY_LOCATION: &str = "location";
pub const KEY_INTERVAL: &str = "interval";

const CRED_NAMESPACE: &str = "fa_wifi";
const CRED_KEY: &str = "creds";

/// Worst case UTF-8 expansion of the longest text field, plus one byte to
/// detect oversize values.
const TEXT_BUF_LEN: usize = MAX_SERVER_LEN * 4 + 1;
const CRED_BUF_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    A,
    B,
}

impl Slot {
    fn namespace(self) -> &'static str {
        match self {
            Self::A => SLOT_A,
            Self::B => SLOT_B,
        }
    }

    fn tag(self) -> u8 {
        match self {
            Self::A => b'a',
            Self::B => b'b',
        }
    }

    fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Settings store.  Owns the medium; read once at boot and after every
/// provisioning commit.
pub struct ConfigStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> ConfigStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    fn active_slot(&self) -> Slot {
        let mut buf = [0u8; 1];
        match self.storage.read(META_NAMESPACE, ACTIVE_KEY, &mut buf) {
            Ok(1) if buf[0] == b'b' => Slot::B,
            _ => Slot::A,
        }
    }

    fn read_text(&self, ns: &str, key: &str, max_chars: usize) -> Option<String> {
        let mut buf = [0u8; TEXT_BUF_LEN];
        let n = self.storage.read(ns, key, &mut buf).ok()?;
        if n == buf.len() {
            return None;
        }
        let text = core::str::from_utf8(&buf[..n]).ok()?;
        (text.chars().count() <= max_chars).then(|| text.to_owned())
    }

    fn read_interval_ms(&self, ns: &str) -> Option<u32> {
        let mut buf = [0u8; 5];
        match self.storage.read(ns, KEY_INTERVAL, &mut buf) {
            Ok(4) => {
                let ms = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
                (ms > 0).then_some(ms)
            }
            _ => None,
        }
    }

    fn write_slot(&mut self, slot: Slot, settings: &Settings) -> Result<(), StoreError> {
        let ns = slot.namespace();
        let interval = settings.report_interval_ms().to_le_bytes();
        let entries: [(&str, &[u8]); 4] = [
            (KEY_SERVER_URL, settings.server_endpoint.as_bytes()),
            (KEY_BOARD, settings.board_name.as_bytes()),
            (KEY_LOCATION, settings.location.as_bytes()),
            (KEY_INTERVAL, &interval),
        ];
        for (key, value) in entries {
            self.storage.write(ns, key, value).map_err(|e| {
                warn!("ConfigStore: write {}/{} failed: {}", ns, key, e);
                StoreError::WriteFailed
            })?;
        }
        Ok(())
    }
}

impl<S: StoragePort> ConfigPort for ConfigStore<S> {
    fn load(&self) -> Settings {
        let ns = self.active_slot().namespace();
        let mut settings = Settings::default();
        let mut defaulted = 0u8;

        match self
            .read_text(ns, KEY_SERVER_URL, MAX_SERVER_LEN)
            .filter(|url| config::is_valid_endpoint(url))
        {
            Some(url) => settings.server_endpoint = url,
            None => defaulted += 1,
        }
        match self.read_text(ns, KEY_BOARD, MAX_BOARD_LEN) {
            Some(board) => settings.board_name = board,
            None => defaulted += 1,
        }
        match self.read_text(ns, KEY_LOCATION, MAX_LOCATION_LEN) {
            Some(location) => settings.location = location,
            None => defaulted += 1,
        }
        match self.read_interval_ms(ns) {
            Some(ms) => settings.report_interval = core::time::Duration::from_millis(ms as u64),
            None => defaulted += 1,
        }

        info!(
            "ConfigStore: loaded from {} ({} of 4 fields defaulted)",
            ns, defaulted
        );
        settings
    }

    fn save(&mut self, settings: &Settings) -> Result<(), StoreError> {
        settings.validate()?;

        let target = self.active_slot().other();
        self.write_slot(target, settings)?;
        self.storage
            .write(META_NAMESPACE, ACTIVE_KEY, &[target.tag()])
            .map_err(|e| {
                warn!("ConfigStore: slot flip failed: {}", e);
                StoreError::WriteFailed
            })?;

        info!(
            "ConfigStore: settings committed to {} (board='{}', interval={}ms)",
            target.namespace(),
            settings.board_name,
            settings.report_interval_ms()
        );
        Ok(())
    }

    fn load_credentials(&self) -> Option<WifiCredentials> {
        let mut buf = [0u8; CRED_BUF_LEN];
        let n = self.storage.read(CRED_NAMESPACE, CRED_KEY, &mut buf).ok()?;
        let stored: WifiCredentials = match postcard::from_bytes(&buf[..n]) {
            Ok(c) => c,
            Err(_) => {
                warn!("ConfigStore: credential record corrupt, ignoring");
                return None;
            }
        };
        // Re-validate: the record may predate the current rules.
        WifiCredentials::new(&stored.ssid, &stored.password).ok()
    }

    fn save_credentials(&mut self, credentials: &WifiCredentials) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(credentials).map_err(|_| StoreError::Encoding)?;
        self.storage
            .write(CRED_NAMESPACE, CRED_KEY, &bytes)
            .map_err(|_| StoreError::WriteFailed)?;
        info!("ConfigStore: credentials saved (SSID='{}')", credentials.ssid);
        Ok(())
    }

    fn clear_credentials(&mut self) -> Result<(), StoreError> {
        self.storage
            .delete(CRED_NAMESPACE, CRED_KEY)
            .map_err(|_| StoreError::WriteFailed)?;
        info!("ConfigStore: credentials cleared");
        Ok(())
    }
}
