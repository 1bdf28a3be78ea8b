use core::ops::Index;

use thiserror::Error as ThisError;

use crate::FAN_COUNT;

/// PWM compare values reported by the device, in channel order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpeedReading([u8; FAN_COUNT]);

impl SpeedReading {
    #[inline]
    #[must_use]
    pub fn channels(&self) -> [u8; FAN_COUNT] {
        self.0
    }
}

impl From<[u8; FAN_COUNT]> for SpeedReading {
    fn from(raw: [u8; FAN_COUNT]) -> Self {
        Self(raw)
    }
}

impl Index<usize> for SpeedReading {
    type Output = u8;

    fn index(&self, channel: usize) -> &Self::Output {
        &self.0[channel]
    }
}

/// A validated set of speeds, ready to be written to the device.
///
/// Values are the PWM compare registers of the four channels, so the
/// whole byte range is meaningful: `0` stops the fan, `255` is full speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpeedCommand([u8; FAN_COUNT]);

impl SpeedCommand {
    #[must_use]
    pub const fn new(fans: [u8; FAN_COUNT]) -> Self {
        Self(fans)
    }

    /// Same speed on every channel.
    #[must_use]
    pub const fn uniform(speed: u8) -> Self {
        Self([speed; FAN_COUNT])
    }

    /// Payload of the `SetSpeed` request.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; FAN_COUNT] {
        &self.0
    }
}

impl From<SpeedCommand> for SpeedReading {
    fn from(value: SpeedCommand) -> Self {
        Self(value.0)
    }
}

impl TryFrom<[i32; FAN_COUNT]> for SpeedCommand {
    type Error = SpeedOutOfRange;

    fn try_from(fans: [i32; FAN_COUNT]) -> Result<Self, Self::Error> {
        let mut bytes = [0; FAN_COUNT];

        for (channel, (byte, value)) in bytes.iter_mut().zip(fans).enumerate() {
            *byte = u8::try_from(value).map_err(|_| SpeedOutOfRange { channel, value })?;
        }

        Ok(Self(bytes))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("fan {} speed {value} is outside 0..=255", channel + 1)]
pub struct SpeedOutOfRange {
    /// Zero based channel index.
    pub channel: usize,
    pub value: i32,
}
