//! Sampling, payload construction and delivery.

pub mod payload;
pub mod reporter;

pub use payload::{SensorEntry, TelemetryPayload};
pub use reporter::{ReportOutcome, TelemetryReporter};

use log::warn;

use crate::app::ports::{Celsius, EventSink, SensorPort};
use crate::app::events::AppEvent;
use crate::error::SensorFault;

/// One channel's value for the current cycle.  `None` means the channel
/// faulted or produced a non-finite number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub channel_index: usize,
    pub value: Option<Celsius>,
}

/// Read every channel the port exposes, in order.  A fault is reported
/// through `sink` and recorded as `None`; it never aborts the sweep.
pub fn sample_channels(
    sensors: &mut dyn SensorPort,
    sink: &mut dyn EventSink,
) -> Vec<SensorReading> {
    (0..sensors.channel_count())
        .map(|channel| {
            let value = match sensors.read(channel) {
                Ok(c) if c.is_finite() => Some(c),
                Ok(_) => {
                    sink.emit(&AppEvent::SensorFault {
                        channel,
                        fault: SensorFault::NotANumber,
                    });
                    None
                }
                Err(fault) => {
                    warn!("Sensor {}: {}", channel + 1, fault);
                    sink.emit(&AppEvent::SensorFault { channel, fault });
                    None
                }
            };
            SensorReading {
                channel_index: channel,
                value,
            }
        })
        .collect()
}
