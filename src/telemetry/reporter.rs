//! One reporting attempt with the single-reconnect policy.
//!
//! ```text
//!   status()==Down ──▶ reconnect(2 s) ──fail──▶ ConnectivityLost
//!        │                  │ ok
//!        ▼                  ▼
//!   serialize payload ──▶ POST ──status──▶ Delivered(status)
//!                           └──error──▶ TransportFailed(e)
//! ```
//!
//! No retries beyond the reconnect, no queuing: a dropped cycle is simply
//! superseded by the next one.

use core::time::Duration;

use log::{info, warn};

use super::{SensorReading, TelemetryPayload};
use crate::app::ports::{HttpPort, LinkStatus, NetworkPort};
use crate::config::Settings;
use crate::error::TransportError;

const JSON_HEADERS: [(&str, &str); 1] = [("Content-Type", "application/json")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The collector answered; any status counts, 2xx or not.
    Delivered(u16),
    /// Link down and the single reconnect failed.  Nothing was sent.
    ConnectivityLost,
    /// The transport failed before a status arrived.
    TransportFailed(TransportError),
}

pub struct TelemetryReporter {
    reconnect_timeout: Duration,
}

impl TelemetryReporter {
    pub fn new(reconnect_timeout: Duration) -> Self {
        Self { reconnect_timeout }
    }

    pub fn report_once(
        &self,
        settings: &Settings,
        readings: &[SensorReading],
        network: &mut dyn NetworkPort,
        http: &mut dyn HttpPort,
    ) -> ReportOutcome {
        if network.status() == LinkStatus::Down {
            match network.reconnect(self.reconnect_timeout) {
                Ok(link) => info!("Reporter: reconnected ({})", link.ip),
                Err(e) => {
                    warn!("Reporter: link down, reconnect failed: {}", e);
                    return ReportOutcome::ConnectivityLost;
                }
            }
        }

        let body = match TelemetryPayload::new(settings, readings).to_json() {
            Ok(body) => body,
            Err(e) => {
                warn!("Reporter: payload encoding failed: {}", e);
                return ReportOutcome::TransportFailed(TransportError::Encoding);
            }
        };

        match http.post(&settings.server_endpoint, &JSON_HEADERS, &body) {
            Ok(status) => ReportOutcome::Delivered(status),
            Err(e) => ReportOutcome::TransportFailed(e),
        }
    }
}
