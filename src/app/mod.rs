//! Application core: composition and the port boundary.
//!
//! [`agent::Agent`] is the composition root: it owns the configuration
//! store, runs the provisioning controller at boot, and drives the
//! telemetry cadence.  All interaction with hardware happens through the
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod agent;
pub mod events;
pub mod ports;
