//! Agent configuration.
//!
//! Two tiers:
//!
//! - [`Settings`]: operator-editable, persisted by the
//!   [`ConfigStore`](crate::store::ConfigStore) and edited through the
//!   provisioning portal.
//! - [`AgentConfig`]: build-time tunables (timings, channel count, AP
//!   password).  Never persisted.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConnectivityError, StoreError};

// --- Persisted defaults ---
pub const DEFAULT_SERVER_URL: &str = "http://carvao.imoveldiretocomodono.com.br/recebeDados/placa";
pub const DEFAULT_BOARD_NAME: &str = "Placa de Teste";
pub const DEFAULT_LOCATION: &str = "Forno 1";
pub const DEFAULT_REPORT_INTERVAL_MS: u32 = 15_000;

// --- Portal field limits ---
pub const MAX_SERVER_LEN: usize = 100;
pub const MAX_BOARD_LEN: usize = 32;
pub const MAX_LOCATION_LEN: usize = 32;
pub const MAX_INTERVAL_DIGITS: usize = 10;

/// Maximum SSID length per IEEE 802.11.
pub const MAX_SSID_LEN: usize = 32;
/// WPA2 passphrase bounds.
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// The persisted configuration record.  Always fully populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Destination for telemetry POSTs.
    pub server_endpoint: String,
    /// Free-text device identity sent as `"board"`.
    pub board_name: String,
    /// Free-text installation label sent as `"location"`.
    pub location: String,
    /// Minimum spacing between two reporting attempts.  Whole milliseconds, > 0.
    pub report_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_endpoint: DEFAULT_SERVER_URL.to_owned(),
            board_name: DEFAULT_BOARD_NAME.to_owned(),
            location: DEFAULT_LOCATION.to_owned(),
            report_interval: Duration::from_millis(DEFAULT_REPORT_INTERVAL_MS as u64),
        }
    }
}

impl Settings {
    /// Interval as persisted (`interval` key).  Saturates; [`validate`](Self::validate)
    /// rejects anything that would not survive the conversion.
    pub fn report_interval_ms(&self) -> u32 {
        u32::try_from(self.report_interval.as_millis()).unwrap_or(u32::MAX)
    }

    /// Range-check every field before it is persisted.
    pub fn validate(&self) -> Result<(), StoreError> {
        if !is_valid_endpoint(&self.server_endpoint) {
            return Err(StoreError::Rejected(
                "server_endpoint must be an http(s) URL of at most 100 characters",
            ));
        }
        if self.board_name.chars().count() > MAX_BOARD_LEN {
            return Err(StoreError::Rejected("board_name must be at most 32 characters"));
        }
        if self.location.chars().count() > MAX_LOCATION_LEN {
            return Err(StoreError::Rejected("location must be at most 32 characters"));
        }
        let ms = self.report_interval.as_millis();
        if ms == 0 || ms > u32::MAX as u128 || self.report_interval.subsec_nanos() % 1_000_000 != 0 {
            return Err(StoreError::Rejected(
                "report_interval must be a positive whole number of milliseconds",
            ));
        }
        Ok(())
    }
}

/// `http://` or `https://` followed by a host, at most [`MAX_SERVER_LEN`] chars.
pub fn is_valid_endpoint(url: &str) -> bool {
    if url.chars().count() > MAX_SERVER_LEN || url.chars().any(char::is_whitespace) {
        return false;
    }
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/'))
}

// ---------------------------------------------------------------------------
// WiFi credentials
// ---------------------------------------------------------------------------

/// Station credentials.  Persisted as one record so SSID and password are
/// always replaced together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiCredentials {
    pub ssid: heapless::String<MAX_SSID_LEN>,
    pub password: heapless::String<MAX_PASSWORD_LEN>,
}

impl WifiCredentials {
    /// Validate and build.  SSID: 1–32 printable ASCII bytes.  Password:
    /// empty (open network) or 8–64 bytes.
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        if ssid.is_empty() || ssid.len() > MAX_SSID_LEN || !is_printable_ascii(ssid) {
            return Err(ConnectivityError::InvalidSsid);
        }
        if !password.is_empty()
            && (password.len() < MIN_PASSWORD_LEN || password.len() > MAX_PASSWORD_LEN)
        {
            return Err(ConnectivityError::InvalidPassword);
        }
        let mut creds = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        creds
            .ssid
            .push_str(ssid)
            .map_err(|_| ConnectivityError::InvalidSsid)?;
        creds
            .password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        Ok(creds)
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

// ---------------------------------------------------------------------------
// Build-time tunables
// ---------------------------------------------------------------------------

/// Timing parameters that are fixed per firmware build.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    // --- Provisioning ---
    /// Continuous press needed at boot to force the configuration portal.
    pub button_hold_ms: u64,
    /// Button sampling period while detecting a hold.
    pub button_poll_ms: u32,
    /// Bound on one station join attempt.
    pub join_timeout: Duration,
    /// Portal gives up (and the device restarts) after this long.
    pub portal_timeout_ms: u64,
    /// Portal polling period (cooperative yield to the HTTP server).
    pub portal_poll_ms: u32,
    /// WPA2 passphrase of the configuration access point.
    pub ap_password: &'static str,

    // --- Reporting ---
    /// Bounded wait for the single per-cycle reconnection attempt.
    pub reconnect_timeout: Duration,
    /// Longest sleep between two button samples in the main loop.
    pub loop_slice_ms: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            button_hold_ms: 1000,
            button_poll_ms: 10,
            join_timeout: Duration::from_secs(20),
            portal_timeout_ms: 180_000,
            portal_poll_ms: 50,
            ap_password: "forno1234",

            reconnect_timeout: Duration::from_secs(2),
            loop_slice_ms: 100,
        }
    }
}
