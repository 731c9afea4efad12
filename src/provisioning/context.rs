//! Mutable context threaded through every provisioning handler.

use crate::adapters::device_id::ApSsid;
use crate::app::ports::{ButtonPort, ClockPort, ConfigPort, EventSink, NetworkPort, PortalPort};
use crate::config::{AgentConfig, Settings, WifiCredentials};
use crate::error::ProvisioningFailure;

/// Borrowed collaborators.  The machine owns none of them; it runs to
/// completion and hands them back.
pub struct ProvisioningIo<'a> {
    pub button: &'a mut dyn ButtonPort,
    pub network: &'a mut dyn NetworkPort,
    pub portal: &'a mut dyn PortalPort,
    pub clock: &'a dyn ClockPort,
    pub store: &'a mut dyn ConfigPort,
    pub sink: &'a mut dyn EventSink,
}

pub struct ProvisioningContext<'a> {
    pub io: ProvisioningIo<'a>,
    pub config: &'a AgentConfig,
    /// SSID of the configuration access point.
    pub ap_ssid: &'a ApSsid,

    /// Working copy of the settings in force.  Replaced only after a
    /// successful commit.
    pub settings: Settings,
    /// Credentials committed by the portal, consumed by `Connecting`.
    pub pending_credentials: Option<WifiCredentials>,

    /// Set by a completed button hold; `ApConfigMode` discards the stored
    /// credentials on entry.
    pub force_reset: bool,
    /// `now_ms` when the current state was entered.
    pub entered_at_ms: u64,
    /// Failure raised by an `on_enter` action, reported by the next update.
    pub failure: Option<ProvisioningFailure>,
}

impl<'a> ProvisioningContext<'a> {
    pub fn new(
        io: ProvisioningIo<'a>,
        config: &'a AgentConfig,
        ap_ssid: &'a ApSsid,
        settings: Settings,
    ) -> Self {
        Self {
            io,
            config,
            ap_ssid,
            settings,
            pending_credentials: None,
            force_reset: false,
            entered_at_ms: 0,
            failure: None,
        }
    }

    /// Milliseconds since the current state was entered.
    pub fn ms_in_state(&self) -> u64 {
        self.io.clock.now_ms().saturating_sub(self.entered_at_ms)
    }

    /// Consume the context, returning the settings in force.
    pub fn into_settings(self) -> Settings {
        self.settings
    }
}
