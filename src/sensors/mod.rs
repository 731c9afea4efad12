//! Temperature acquisition.
//!
//! One driver: the MAX6675 thermocouple bus.  It implements
//! [`SensorPort`](crate::app::ports::SensorPort) directly.

pub mod max6675;

pub use max6675::{Max6675Bus, decode_frame};
