#![no_std]

mod identity;
mod request;
mod speed;
mod tacho;

pub use identity::DeviceIdentity;
pub use request::{Direction, Request, RequestConvError};
pub use speed::{SpeedCommand, SpeedOutOfRange, SpeedReading};
pub use tacho::TachoReading;

/// Number of fan channels driven by the controller.
pub const FAN_COUNT: usize = 4;

/// Raw tachometer counts are multiplied by this to get the reported value.
pub const TACHO_SCALE: u16 = 27;

/// Every control transfer is given this long to complete.
pub const TRANSFER_TIMEOUT_MS: u64 = 5000;

/// Speed the firmware applies at power-on and on watchdog expiry.
pub const DEFAULT_FAN_SPEED: u8 = 240;

/// The firmware restores [`DEFAULT_FAN_SPEED`] when no speed command
/// arrived for this many seconds.
pub const WATCHDOG_SECS: u16 = 128;

/// Interface number of the device's single (dummy HID) interface.
pub const INTERFACE_NUMBER: u8 = 0;
