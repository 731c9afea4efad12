//! Port traits: the hexagonal boundary between the agent core and the device.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Agent / ProvisioningController / TelemetryReporter
//! ```
//!
//! Every collaborator the core depends on but does not implement lives
//! behind one of these traits: thermocouples, WiFi, HTTP, the boot button,
//! the captive portal, the monotonic clock and the key/value medium.  The
//! ESP-IDF adapters in [`crate::adapters`] implement them on the device; the
//! host tests substitute scripted mocks.
//!
//! All calls are blocking.  The agent is single-threaded and cooperative, so
//! none of these traits require `Send` or `Sync`.

use core::net::Ipv4Addr;
use core::time::Duration;

use crate::config::{Settings, WifiCredentials};
use crate::error::{
    ConnectivityError, ProvisioningFailure, SensorFault, StorageError, StoreError, TransportError,
};
use crate::provisioning::form::FormFields;

/// Temperature in degrees Celsius.
pub type Celsius = f64;

// ───────────────────────────────────────────────────────────────
// Sensor port
// ───────────────────────────────────────────────────────────────

/// Read-side port for the thermocouple array.
pub trait SensorPort {
    /// Number of channels wired to this board.
    fn channel_count(&self) -> usize;

    /// Convert one channel.  A fault affects only that channel.
    fn read(&mut self, channel: usize) -> Result<Celsius, SensorFault>;
}

// ───────────────────────────────────────────────────────────────
// Network port
// ───────────────────────────────────────────────────────────────

/// Handle for an established station association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub ip: Ipv4Addr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Up(Link),
    Down,
}

pub trait NetworkPort {
    /// Join a network as a station.  Blocks until associated with an IP or
    /// until `timeout` elapses.
    fn join(&mut self, credentials: &WifiCredentials, timeout: Duration)
    -> Result<Link, ConnectivityError>;

    /// Current station link state.
    fn status(&self) -> LinkStatus;

    /// Retry the last successful join once, bounded by `timeout`.
    fn reconnect(&mut self, timeout: Duration) -> Result<Link, ConnectivityError>;

    /// Host a local WPA2 access point.  Returns the gateway address the
    /// portal is reachable on.
    fn host_ap(&mut self, ssid: &str, password: &str) -> Result<Ipv4Addr, ConnectivityError>;

    /// Tear the access point down.  No-op if none is running.
    fn stop_ap(&mut self);
}

// ───────────────────────────────────────────────────────────────
// HTTP port
// ───────────────────────────────────────────────────────────────

pub trait HttpPort {
    /// Send one POST and return the response status.  `Err` means no status
    /// was received.
    fn post(&mut self, url: &str, headers: &[(&str, &str)], body: &[u8])
    -> Result<u16, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Button / clock
// ───────────────────────────────────────────────────────────────

pub trait ButtonPort {
    /// Debounce-free instantaneous level: `true` while held down.
    fn is_pressed(&mut self) -> bool;
}

/// Monotonic time source.  Every cadence and timeout decision is taken by
/// comparing `now_ms` readings, never by counting sleeps.
pub trait ClockPort {
    /// Milliseconds since boot.  Never goes backwards.
    fn now_ms(&self) -> u64;

    /// Block the caller for `ms` milliseconds.
    fn sleep_ms(&self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Portal port
// ───────────────────────────────────────────────────────────────

/// The captive configuration portal served while in access-point mode.
pub trait PortalPort {
    /// Start serving the form pre-populated with `prefill`.
    fn open(&mut self, prefill: &FormFields) -> Result<(), ProvisioningFailure>;

    /// Service pending requests and return a submission, if one arrived.
    fn poll(&mut self) -> Option<FormFields>;

    /// Redisplay the form carrying `prefill` with an error banner.
    fn show_error(&mut self, prefill: &FormFields, message: &str);

    /// Stop serving.  No-op if not open.
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s through
/// this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Typed access to persisted settings and credentials.
///
/// Implementations MUST validate before persisting and MUST make
/// [`save`](Self::save) all-or-nothing across power loss.
pub trait ConfigPort {
    /// Never fails: missing or corrupt fields come back as defaults.
    fn load(&self) -> Settings;

    /// Replace every field atomically.  On `Err` the previous settings
    /// remain in force.
    fn save(&mut self, settings: &Settings) -> Result<(), StoreError>;

    fn load_credentials(&self) -> Option<WifiCredentials>;

    fn save_credentials(&mut self, credentials: &WifiCredentials) -> Result<(), StoreError>;

    /// Forget the station credentials (forced reset).
    fn clear_credentials(&mut self) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port
// ───────────────────────────────────────────────────────────────

/// Persistent key-value medium (NVS on the device).
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - A single `write` MUST be atomic: after power loss the key holds either
///   the old or the new value.  Multi-key atomicity is built on top of this
///   by [`ConfigStore`](crate::store::ConfigStore).
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}
