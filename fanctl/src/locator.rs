use protocol::DeviceIdentity;
use rusb::{DeviceHandle, UsbContext};
use tracing::instrument;

use crate::{
    ClientConfig, FanController,
    error::{Error, Result},
    exactly_one::{ExactlyOneError, ExactlyOneIter},
    transport::{Candidate, Location},
};

/// Finds the one device on the bus with a given identity.
///
/// Several devices sharing the identity is an error unless a [`Location`]
/// narrows the search down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceLocator {
    identity: DeviceIdentity,
    location: Option<Location>,
}

impl DeviceLocator {
    #[must_use]
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            identity,
            location: None,
        }
    }

    /// Only accept the device at `location`.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    ///
    /// # Errors
    ///
    /// [`Error::DeviceNotFound`] when nothing matches and
    /// [`Error::AmbiguousDevice`] when more than one device does.
    pub fn find<D>(&self, devices: impl IntoIterator<Item = D>) -> Result<D>
    where
        D: Candidate,
    {
        devices
            .into_iter()
            .filter(|device| self.accepts(device))
            .exactly_one()
            .map_err(|e| match e {
                ExactlyOneError::Zero => Error::DeviceNotFound(self.identity),
                ExactlyOneError::MoreThanOne(count) => Error::AmbiguousDevice {
                    identity: self.identity,
                    count,
                },
            })
    }

    /// Finds the device, opens it and wraps it in a [`FanController`].
    ///
    /// # Errors
    #[instrument(skip_all, fields(identity = %self.identity), err(Debug))]
    pub fn locate<D>(
        &self,
        devices: impl IntoIterator<Item = D>,
        config: ClientConfig,
    ) -> Result<FanController<D::Transport>>
    where
        D: Candidate,
    {
        let device = self.find(devices)?;
        let location = device.location();
        tracing::info!("found fan controller at {location}");

        let transport = device
            .open()
            .map_err(|source| Error::Open { location, source })?;

        FanController::open(transport, config)
    }

    /// [`DeviceLocator::locate`] over every device libusb can see.
    ///
    /// # Errors
    pub fn locate_usb<C>(
        &self,
        context: &C,
        config: ClientConfig,
    ) -> Result<FanController<DeviceHandle<C>>>
    where
        C: UsbContext,
    {
        let devices = context.devices().map_err(Error::Usb)?;
        self.locate(devices.iter(), config)
    }

    fn accepts<D>(&self, device: &D) -> bool
    where
        D: Candidate,
    {
        let location = device.location();

        match device.identity() {
            Ok(identity) if identity == self.identity => {
                self.location.is_none_or(|wanted| wanted == location)
            }
            Ok(_) => false,
            Err(e) => {
                tracing::warn!("skipping device at {location}: {e}");
                false
            }
        }
    }
}
