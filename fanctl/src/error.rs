use std::time::Duration;

use protocol::{DeviceIdentity, Request, SpeedOutOfRange};
use thiserror::Error as ThisError;

use crate::transport::Location;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Copy, Debug, ThisError)]
pub enum Error {
    #[error("no USB device matches {0}")]
    DeviceNotFound(DeviceIdentity),
    #[error("{count} USB devices match {identity}, select one with a bus and address")]
    AmbiguousDevice {
        identity: DeviceIdentity,
        count: usize,
    },
    #[error("{request:?} control transfer failed")]
    Transfer {
        request: Request,
        #[source]
        source: TransferError,
    },
    #[error("invalid argument")]
    InvalidArgument(#[from] SpeedOutOfRange),
    #[error("transfer timeout {0:?} is outside 1ms..={max}ms", max = u32::MAX)]
    InvalidTimeout(Duration),
    #[error("unable to open device at {location}")]
    Open {
        location: Location,
        #[source]
        source: rusb::Error,
    },
    #[error("unable to claim interface {interface}")]
    Claim {
        interface: u8,
        #[source]
        source: rusb::Error,
    },
    #[error("unable to release interface {interface}")]
    Release {
        interface: u8,
        #[source]
        source: rusb::Error,
    },
    #[error("USB access failed")]
    Usb(#[source] rusb::Error),
}

impl Error {
    pub(crate) fn transfer(request: Request, source: impl Into<TransferError>) -> Self {
        Self::Transfer {
            request,
            source: source.into(),
        }
    }

    /// Whether this is a transfer that ran out of its time budget.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Transfer {
                source: TransferError::Usb(rusb::Error::Timeout),
                ..
            }
        )
    }
}

/// Why a single control transfer did not go through.
#[derive(Clone, Copy, Debug, ThisError)]
pub enum TransferError {
    #[error(transparent)]
    Usb(#[from] rusb::Error),
    #[error("short transfer, {actual} of {expected} bytes")]
    Short { actual: usize, expected: usize },
}
