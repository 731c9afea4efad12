//! Fuzz target: `ConfigStore::load` over corrupt NVS contents
//!
//! Writes arbitrary bytes under every settings key of both slots and the
//! slot selector, then loads.  Loading must never panic and must always
//! produce a record the store would itself accept.
//!
//! cargo fuzz run fuzz_settings_load

#![no_main]

use furnace_agent::adapters::nvs::NvsAdapter;
use furnace_agent::app::ports::{ConfigPort, StoragePort};
use furnace_agent::store::{ConfigStore, KEY_BOARD, KEY_INTERVAL, KEY_LOCATION, KEY_SERVER_URL};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut nvs) = NvsAdapter::new() else {
        return;
    };

    let mut chunks = data.chunks(data.len() / 9 + 1);
    let mut next = || chunks.next().unwrap_or_default();

    let _ = nvs.write("fa_meta", "active", next());
    for ns in ["fa_cfg_a", "fa_cfg_b"] {
        for key in [KEY_SERVER_URL, KEY_BOARD, KEY_LOCATION, KEY_INTERVAL] {
            let _ = nvs.write(ns, key, next());
        }
    }

    let store = ConfigStore::new(nvs);
    let settings = store.load();
    assert!(settings.validate().is_ok(), "load produced an invalid record");
    let _ = store.load_credentials();
});
