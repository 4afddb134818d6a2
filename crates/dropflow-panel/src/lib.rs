//! dropflow front panel
//!
//! A push button toggles the game server and a lightbox shows its state:
//! off, on, or flashing while an operation is in flight.
//!
//! # Features
//!
//! - `rpi`: drive real GPIO pins through `rppal`. Without it the panel
//!   reads presses from stdin (Enter) and logs the light pin.

pub mod button;
pub mod controller;
pub mod error;
pub mod hardware;
pub mod indicator;

pub use button::{PanelOptions, run, watch_button};
pub use controller::{Controller, PanelState};
pub use error::{PanelError, Result};
pub use hardware::{ConsoleButton, ConsoleOutputPin, InputPin, OutputPin};
pub use indicator::{CyclingIndicator, Indicator, IndicatorState};
