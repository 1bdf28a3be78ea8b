use core::ops::Index;

use crate::{FAN_COUNT, TACHO_SCALE};

/// Tachometer values in channel order, already scaled by [`TACHO_SCALE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TachoReading([u16; FAN_COUNT]);

impl TachoReading {
    #[inline]
    #[must_use]
    pub fn channels(&self) -> [u16; FAN_COUNT] {
        self.0
    }
}

/// Scales the raw per-second pulse counts sent by the device.
///
/// `255 * 27` still fits a `u16`, so no channel can overflow.
impl From<[u8; FAN_COUNT]> for TachoReading {
    fn from(raw: [u8; FAN_COUNT]) -> Self {
        Self(raw.map(|count| u16::from(count) * TACHO_SCALE))
    }
}

impl Index<usize> for TachoReading {
    type Output = u16;

    fn index(&self, channel: usize) -> &Self::Output {
        &self.0[channel]
    }
}
