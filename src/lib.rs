//! Furnace agent library.
//!
//! Reads a row of MAX6675 thermocouples and posts them as JSON to a
//! collector on a fixed cadence, with a captive WiFi portal for field
//! configuration.  Everything except the adapters' `espidf` halves runs on
//! the host, which is where the test suite lives.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod provisioning;
pub mod scheduler;
pub mod sensors;
pub mod store;
pub mod telemetry;
