//! GPIO assignments for the furnace monitor board.
//!
//! Single source of truth.  `main` claims each GPIO by these numbers and
//! hands the drivers to the agent; nothing else hard-codes a pin number.

// ---------------------------------------------------------------------------
// MAX6675 thermocouple converters (shared clock and data, one CS each)
// ---------------------------------------------------------------------------

/// Serial clock, driven by the ESP32.
pub const THERMO_SCK_GPIO: i32 = 5;
/// Serial data out of every converter (MISO).
pub const THERMO_SO_GPIO: i32 = 19;
/// Chip selects, active low, in channel order.  Channel `i` is reported as
/// "Sensor i+1".
pub const THERMO_CS_GPIOS: [i32; 5] = [33, 25, 26, 27, 13];

// ---------------------------------------------------------------------------
// User button
// ---------------------------------------------------------------------------

/// BOOT strap button, active low with the module pull-up.
pub const BUTTON_GPIO: i32 = 0;
