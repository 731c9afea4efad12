//! BOOT button.
//!
//! ## Hardware
//!
//! Active-low momentary switch on GPIO0 with the module's pull-up.  No
//! debouncing here: the provisioning hold detector samples the level every
//! 10 ms and requires it to stay low for a full second, which already
//! rejects bounce and glitches.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::ButtonPort;

pub struct BootButton<P> {
    pin: P,
    read_error_logged: bool,
}

impl<P: InputPin> BootButton<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            read_error_logged: false,
        }
    }
}

impl<P: InputPin> ButtonPort for BootButton<P> {
    fn is_pressed(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => low,
            Err(_) => {
                // A pin that cannot be read counts as released.
                if !self.read_error_logged {
                    warn!("Button: GPIO read failed, treating as released");
                    self.read_error_logged = true;
                }
                false
            }
        }
    }
}
