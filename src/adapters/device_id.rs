//! Device identity derived from the ESP32 factory MAC address.
//!
//! The configuration access point is named `Forno-XXYYZZ` (last three MAC
//! bytes, uppercase hex) so several furnaces in one shed stay distinct.

use core::fmt::Write;

/// "Forno-XXYYZZ" is 12 bytes; 32 is the 802.11 SSID limit.
pub type ApSsid = heapless::String<32>;

pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: writes exactly six bytes into `mac`.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: a fixed MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0x24, 0x6F, 0x28, 0x1A, 0x2B, 0x3C]
}

pub fn ap_ssid(mac: &MacAddress) -> ApSsid {
    let mut ssid = ApSsid::new();
    // Cannot overflow: the formatted name is 12 bytes.
    let _ = write!(ssid, "Forno-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    ssid
}
