//! Pin abstractions plus console and Raspberry Pi implementations.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// BCM number of the button input (physical pin 22).
pub const DEFAULT_BUTTON_PIN: u8 = 25;
/// BCM number of the lightbox mode input (physical pin 8).
pub const DEFAULT_LIGHT_PIN: u8 = 14;

pub trait OutputPin: Send {
    fn set_high(&mut self);
    fn set_low(&mut self);
}

pub trait InputPin: Send {
    fn is_high(&self) -> bool;
}

/// Output pin that only logs level changes.
pub struct ConsoleOutputPin {
    name: String,
}

impl ConsoleOutputPin {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl OutputPin for ConsoleOutputPin {
    fn set_high(&mut self) {
        tracing::debug!("[{}] HIGH", self.name);
    }

    fn set_low(&mut self) {
        tracing::debug!("[{}] LOW", self.name);
    }
}

/// Button driven by Enter on stdin. Reads high for one poll per line.
pub struct ConsoleButton {
    pressed: Arc<AtomicBool>,
}

impl ConsoleButton {
    /// Start a background reader on stdin.
    pub fn spawn() -> Self {
        let pressed = Arc::new(AtomicBool::new(false));
        let flag = pressed.clone();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                if line.is_err() {
                    break;
                }
                flag.store(true, Ordering::SeqCst);
            }
        });
        Self { pressed }
    }
}

impl InputPin for ConsoleButton {
    fn is_high(&self) -> bool {
        self.pressed.swap(false, Ordering::SeqCst)
    }
}

#[cfg(feature = "rpi")]
pub mod rpi {
    use crate::error::{PanelError, Result};
    use rppal::gpio::Gpio;

    pub struct RpiOutputPin(rppal::gpio::OutputPin);

    pub struct RpiInputPin(rppal::gpio::InputPin);

    impl super::OutputPin for RpiOutputPin {
        fn set_high(&mut self) {
            self.0.set_high();
        }

        fn set_low(&mut self) {
            self.0.set_low();
        }
    }

    impl super::InputPin for RpiInputPin {
        fn is_high(&self) -> bool {
            self.0.is_high()
        }
    }

    /// Claim the button (pulled down) and light (initially low) pins by BCM number.
    pub fn open(button_pin: u8, light_pin: u8) -> Result<(RpiInputPin, RpiOutputPin)> {
        let gpio = Gpio::new().map_err(|e| PanelError::Gpio(e.to_string()))?;
        let button = gpio
            .get(button_pin)
            .map_err(|e| PanelError::Gpio(format!("pin {}: {}", button_pin, e)))?
            .into_input_pulldown();
        let light = gpio
            .get(light_pin)
            .map_err(|e| PanelError::Gpio(format!("pin {}: {}", light_pin, e)))?
            .into_output_low();

        Ok((RpiInputPin(button), RpiOutputPin(light)))
    }
}
