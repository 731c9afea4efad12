//! MAX6675 K-type thermocouple converters on a shared bit-banged bus.
//!
//! All converters share CLK and SO (MISO); each has its own chip select.
//! Frame layout, MSB first:
//!
//! ```text
//!  15  14 ........... 3   2    1   0
//!  ┌──┬────────────────┬────┬───┬───┐
//!  │0 │ 12-bit temp    │ D2 │id │ - │   D2 = 1 → thermocouple open
//!  └──┴────────────────┴────┴───┴───┘   temp × 0.25 °C
//! ```
//!
//! Generic over `embedded-hal` 1.0 so the same code drives ESP-IDF
//! `PinDriver`s on the device and fake pins in tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{Celsius, SensorPort};
use crate::error::SensorFault;

/// Half clock period.  The MAX6675 tolerates up to 4.3 MHz; 10 µs keeps
/// the long shared wiring of a furnace panel happy.
const HALF_PERIOD_US: u32 = 10;
const OPEN_CIRCUIT_BIT: u16 = 1 << 2;
const DEGREES_PER_LSB: f64 = 0.25;

/// Decode one 16-bit frame.
pub fn decode_frame(frame: u16) -> Result<Celsius, SensorFault> {
    if frame & OPEN_CIRCUIT_BIT != 0 {
        return Err(SensorFault::OpenCircuit);
    }
    Ok(f64::from(frame >> 3) * DEGREES_PER_LSB)
}

pub struct Max6675Bus<Clk, Miso, Cs, D> {
    clk: Clk,
    miso: Miso,
    cs: Vec<Cs>,
    delay: D,
}

impl<Clk, Miso, Cs, D> Max6675Bus<Clk, Miso, Cs, D>
where
    Clk: OutputPin,
    Miso: InputPin,
    Cs: OutputPin,
    D: DelayNs,
{
    /// Deselect every converter and park the clock low.
    pub fn new(mut clk: Clk, miso: Miso, mut cs: Vec<Cs>, delay: D) -> Result<Self, SensorFault> {
        clk.set_low().map_err(|_| SensorFault::Bus)?;
        for pin in &mut cs {
            pin.set_high().map_err(|_| SensorFault::Bus)?;
        }
        Ok(Self {
            clk,
            miso,
            cs,
            delay,
        })
    }

    /// Clock one raw frame out of converter `channel`.
    pub fn read_frame(&mut self, channel: usize) -> Result<u16, SensorFault> {
        let cs = self.cs.get_mut(channel).ok_or(SensorFault::NoSuchChannel)?;
        cs.set_low().map_err(|_| SensorFault::Bus)?;
        self.delay.delay_us(HALF_PERIOD_US);

        let frame = Self::shift_in(&mut self.clk, &mut self.miso, &mut self.delay);

        // Always release the converter, even after a failed shift.
        let released = self.cs[channel].set_high().map_err(|_| SensorFault::Bus);
        let frame = frame?;
        released?;
        Ok(frame)
    }

    fn shift_in(clk: &mut Clk, miso: &mut Miso, delay: &mut D) -> Result<u16, SensorFault> {
        let mut frame = 0u16;
        for _ in 0..16 {
            clk.set_low().map_err(|_| SensorFault::Bus)?;
            delay.delay_us(HALF_PERIOD_US);
            let bit = miso.is_high().map_err(|_| SensorFault::Bus)?;
            frame = frame << 1 | u16::from(bit);
            clk.set_high().map_err(|_| SensorFault::Bus)?;
            delay.delay_us(HALF_PERIOD_US);
        }
        clk.set_low().map_err(|_| SensorFault::Bus)?;
        Ok(frame)
    }
}

impl<Clk, Miso, Cs, D> SensorPort for Max6675Bus<Clk, Miso, Cs, D>
where
    Clk: OutputPin,
    Miso: InputPin,
    Cs: OutputPin,
    D: DelayNs,
{
    fn channel_count(&self) -> usize {
        self.cs.len()
    }

    fn read(&mut self, channel: usize) -> Result<Celsius, SensorFault> {
        decode_frame(self.read_frame(channel)?)
    }
}
