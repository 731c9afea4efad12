//! Fuzz target: portal submission handling
//!
//! Feeds arbitrary bytes through the urlencoded decoder, the validator and
//! the page renderer.  None of them may panic, anything accepted must pass
//! the store's own validation, and a re-rendered page must never carry the
//! submitted password.
//!
//! cargo fuzz run fuzz_portal_form

#![no_main]

use furnace_agent::config::WifiCredentials;
use furnace_agent::provisioning::form::{parse_form, render_form};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let fields = parse_form(data);

    let stored = WifiCredentials::new("Fabrica", "0011223344").ok();
    if let Ok((settings, creds)) = fields.apply(stored.as_ref()) {
        assert!(settings.validate().is_ok(), "accepted settings must validate");
        assert!(!creds.ssid.is_empty());
    }

    let page = render_form(&fields, Some("erro"));
    if fields.password.len() >= 8 && !fields.password.contains(['&', '<', '>', '"', '\'']) {
        let needle = format!("value=\"{}\"", fields.password);
        assert!(!page.contains(&needle), "password echoed into page");
    }
});
