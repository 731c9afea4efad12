//! Log-based event sink adapter.
//!
//! Renders every [`AppEvent`] as one tagged line on the ESP-IDF console, so
//! field technicians can follow a unit over the USB serial port.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::telemetry::ReportOutcome;

#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Booted { version } => info!("BOOT | furnace-agent v{}", version),
            AppEvent::ProvisioningStarted(state) => info!("PROV | start in {}", state),
            AppEvent::ProvisioningTransition { from, to } => info!("PROV | {} -> {}", from, to),
            AppEvent::PortalOpened { ssid, ip } => {
                info!("PROV | portal up, AP '{}' at http://{}", ssid, ip);
            }
            AppEvent::SubmissionRejected(why) => warn!("PROV | submission rejected: {}", why),
            AppEvent::SettingsCommitted => info!("PROV | settings committed"),
            AppEvent::CredentialsCleared => info!("PROV | stored network forgotten"),
            AppEvent::Online { ip } => info!("NET | online, IP {}", ip),
            AppEvent::ProvisioningFailed(f) => error!("PROV | failed: {}, restarting", f),
            AppEvent::SensorFault { channel, fault } => {
                warn!("SENSOR | Sensor {}: {}", channel + 1, fault);
            }
            AppEvent::Report { cycle, outcome } => match outcome {
                ReportOutcome::Delivered(status) => {
                    info!("REPORT | #{} HTTP Response code: {}", cycle, status);
                }
                ReportOutcome::ConnectivityLost => {
                    warn!("REPORT | #{} WiFi disconnected, cycle dropped", cycle);
                }
                ReportOutcome::TransportFailed(e) => {
                    warn!("REPORT | #{} HTTP Response code: {} ({})", cycle, e.code(), e);
                }
            },
        }
    }
}
