//! Outbound application events.
//!
//! The core emits these through the [`EventSink`](super::ports::EventSink)
//! port.  On the device [`LogEventSink`](crate::adapters::log_sink::LogEventSink)
//! renders them to the serial console.

use core::net::Ipv4Addr;

use crate::adapters::device_id::ApSsid;
use crate::error::{ProvisioningFailure, SensorFault};
use crate::provisioning::ProvisioningState;
use crate::telemetry::ReportOutcome;

/// Structured events emitted by the agent core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Firmware started (carries the crate version).
    Booted { version: &'static str },

    /// The provisioning state machine was entered in `0`.
    ProvisioningStarted(ProvisioningState),

    /// The provisioning state machine moved between states.
    ProvisioningTransition {
        from: ProvisioningState,
        to: ProvisioningState,
    },

    /// Access point and portal are up.
    PortalOpened {
        ssid: ApSsid,
        ip: Ipv4Addr,
    },

    /// A portal submission failed validation or could not be stored.
    SubmissionRejected(&'static str),

    /// New settings were committed to the store.
    SettingsCommitted,

    /// Persisted station credentials were discarded (forced reset).
    CredentialsCleared,

    /// Station link established.
    Online { ip: Ipv4Addr },

    /// One channel failed to convert this cycle.
    SensorFault { channel: usize, fault: SensorFault },

    /// A telemetry cycle finished.
    Report { cycle: u32, outcome: ReportOutcome },

    /// Provisioning could not establish connectivity; the device restarts.
    ProvisioningFailed(ProvisioningFailure),
}
