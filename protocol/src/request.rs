use thiserror::Error as ThisError;

const DIR_OUT: u8 = 0x00;
const DIR_IN: u8 = 0x80;
const TYPE_VENDOR: u8 = 0x40;
const RECIPIENT_DEVICE: u8 = 0x00;

/// Data stage direction of a control transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Host to device.
    Out,
    /// Device to host.
    In,
}

/// Vendor requests understood by the firmware.
///
/// All of them target the whole device, carry `wValue = 0`, `wIndex = 0`
/// and move exactly [`crate::FAN_COUNT`] bytes, one per fan channel.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(strum::EnumIter))]
pub enum Request {
    // Writes the PWM compare value of every channel.
    SetSpeed = 0x01,
    // Reads back the PWM compare value of every channel.
    GetSpeed = 0x02,
    // Reads the tachometer pulses counted during the last second.
    GetTacho = 0x03,
}

impl Request {
    pub const VALUE: u16 = 0;
    pub const INDEX: u16 = 0;

    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Request::SetSpeed => Direction::Out,
            Request::GetSpeed | Request::GetTacho => Direction::In,
        }
    }

    /// The `bmRequestType` byte: vendor class, device recipient and the
    /// direction of the request.
    #[must_use]
    pub const fn request_type(self) -> u8 {
        let direction = match self.direction() {
            Direction::Out => DIR_OUT,
            Direction::In => DIR_IN,
        };

        direction | TYPE_VENDOR | RECIPIENT_DEVICE
    }
}

impl From<Request> for u8 {
    fn from(value: Request) -> Self {
        value as Self
    }
}

impl TryFrom<u8> for Request {
    type Error = RequestConvError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Request::SetSpeed),
            0x02 => Ok(Request::GetSpeed),
            0x03 => Ok(Request::GetTacho),
            _ => Err(RequestConvError(value)),
        }
    }
}

#[derive(Clone, Copy, Debug, ThisError)]
#[cfg_attr(test, derive(PartialEq))]
#[error("unknown vendor request code {0:#04x}")]
pub struct RequestConvError(pub u8);
