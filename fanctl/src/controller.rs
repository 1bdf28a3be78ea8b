use std::{mem, time::Duration};

use protocol::{
    FAN_COUNT, INTERFACE_NUMBER, Request, SpeedCommand, SpeedReading, TRANSFER_TIMEOUT_MS,
    TachoReading,
};
use tracing::instrument;

use crate::{
    error::{Error, Result, TransferError},
    transport::ControlTransport,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Time budget of every control transfer.
    pub timeout: Duration,
    /// Claim the interface so no other client can talk to the device
    /// while this one is open.
    pub exclusive: bool,
    pub interface: u8,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(TRANSFER_TIMEOUT_MS),
            exclusive: true,
            interface: INTERFACE_NUMBER,
        }
    }
}

/// An opened fan controller.
///
/// Every operation is one blocking control transfer. The interface claim,
/// if any, is released by [`FanController::close`] or, failing that, on drop.
#[derive(Debug)]
pub struct FanController<T>
where
    T: ControlTransport,
{
    transport: T,
    config: ClientConfig,
    claimed: bool,
    detached_kernel_driver: bool,
}

impl<T> FanController<T>
where
    T: ControlTransport,
{
    /// Wraps an opened device, claiming its interface when
    /// [`ClientConfig::exclusive`] is set.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidTimeout`] if the timeout does not fit
    /// libusb's millisecond range, where `0` means wait forever, and with
    /// [`Error::Claim`] if the interface is held elsewhere.
    #[instrument(skip_all, fields(exclusive = config.exclusive), err(Debug))]
    pub fn open(transport: T, config: ClientConfig) -> Result<Self> {
        if !(1..=u128::from(u32::MAX)).contains(&config.timeout.as_millis()) {
            return Err(Error::InvalidTimeout(config.timeout));
        }

        let mut controller = Self {
            transport,
            config,
            claimed: false,
            detached_kernel_driver: false,
        };

        if config.exclusive {
            controller.claim()?;
        }

        Ok(controller)
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current PWM compare value of every channel.
    ///
    /// # Errors
    #[instrument(skip(self), err(Debug))]
    pub fn speed(&self) -> Result<SpeedReading> {
        self.read(Request::GetSpeed).map(SpeedReading::from)
    }

    /// Tachometer value of every channel.
    ///
    /// # Errors
    #[instrument(skip(self), err(Debug))]
    pub fn tacho(&self) -> Result<TachoReading> {
        self.read(Request::GetTacho).map(TachoReading::from)
    }

    /// Validates the four speeds and writes them to the device.
    ///
    /// # Errors
    ///
    /// Any value outside `0..=255` fails with [`Error::InvalidArgument`]
    /// before anything is sent.
    #[instrument(skip(self), err(Debug))]
    pub fn set_speed(&self, fan1: i32, fan2: i32, fan3: i32, fan4: i32) -> Result<()> {
        let command = SpeedCommand::try_from([fan1, fan2, fan3, fan4])?;
        self.apply(command)
    }

    /// # Errors
    #[instrument(skip(self), err(Debug))]
    pub fn apply(&self, command: SpeedCommand) -> Result<()> {
        self.write(Request::SetSpeed, command.as_bytes())
    }

    /// Releases the interface and gives the device back to its kernel driver.
    ///
    /// # Errors
    pub fn close(mut self) -> Result<()> {
        let interface = self.config.interface;
        self.release()
            .map_err(|source| Error::Release { interface, source })
    }

    fn read(&self, request: Request) -> Result<[u8; FAN_COUNT]> {
        let mut buf = [0; FAN_COUNT];

        let len = self
            .transport
            .read_control(
                request.request_type(),
                request.into(),
                Request::VALUE,
                Request::INDEX,
                &mut buf,
                self.config.timeout,
            )
            .map_err(|e| Error::transfer(request, e))?;

        if len != FAN_COUNT {
            return Err(Error::transfer(request, short(len)));
        }

        tracing::debug!("{request:?} read {buf:?}");
        Ok(buf)
    }

    fn write(&self, request: Request, data: &[u8; FAN_COUNT]) -> Result<()> {
        tracing::debug!("{request:?} writing {data:?}");

        let len = self
            .transport
            .write_control(
                request.request_type(),
                request.into(),
                Request::VALUE,
                Request::INDEX,
                data,
                self.config.timeout,
            )
            .map_err(|e| Error::transfer(request, e))?;

        if len != FAN_COUNT {
            return Err(Error::transfer(request, short(len)));
        }

        Ok(())
    }

    fn claim(&mut self) -> Result<()> {
        let interface = self.config.interface;
        let claim_err = |source: rusb::Error| Error::Claim { interface, source };

        // Querying kernel drivers is not supported on every platform.
        match self.transport.kernel_driver_active(interface) {
            Ok(true) => {
                self.transport
                    .detach_kernel_driver(interface)
                    .map_err(claim_err)?;
                self.detached_kernel_driver = true;
            }
            Ok(false) | Err(rusb::Error::NotSupported) => (),
            Err(e) => return Err(claim_err(e)),
        }

        self.transport
            .claim_interface(interface)
            .map_err(claim_err)?;
        self.claimed = true;

        tracing::debug!("claimed interface {interface}");
        Ok(())
    }

    fn release(&mut self) -> rusb::Result<()> {
        let interface = self.config.interface;

        let released = if mem::take(&mut self.claimed) {
            self.transport.release_interface(interface)
        } else {
            Ok(())
        };

        let attached = if mem::take(&mut self.detached_kernel_driver) {
            self.transport.attach_kernel_driver(interface)
        } else {
            Ok(())
        };

        released.and(attached)
    }
}

impl<T> Drop for FanController<T>
where
    T: ControlTransport,
{
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("releasing interface {}: {e}", self.config.interface);
        }
    }
}

fn short(actual: usize) -> TransferError {
    TransferError::Short {
        actual,
        expected: FAN_COUNT,
    }
}
