use std::{fmt, time::Duration};

use protocol::DeviceIdentity;
use rusb::{Device, DeviceHandle, UsbContext};

/// The synchronous USB operations the controller needs from an opened device.
///
/// Mirrors the [`DeviceHandle`] API so the real handle implements it
/// directly and tests can swap in a simulated device.
pub trait ControlTransport {
    /// Device-to-host control transfer, returns the number of bytes read.
    ///
    /// # Errors
    fn read_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> rusb::Result<usize>;

    /// Host-to-device control transfer, returns the number of bytes written.
    ///
    /// # Errors
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &[u8],
        timeout: Duration,
    ) -> rusb::Result<usize>;

    /// # Errors
    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool>;

    /// # Errors
    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()>;

    /// # Errors
    fn attach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()>;

    /// # Errors
    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()>;

    /// # Errors
    fn release_interface(&mut self, interface: u8) -> rusb::Result<()>;
}

impl<C> ControlTransport for DeviceHandle<C>
where
    C: UsbContext,
{
    fn read_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> rusb::Result<usize> {
        DeviceHandle::read_control(self, request_type, request, value, index, buf, timeout)
    }

    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &[u8],
        timeout: Duration,
    ) -> rusb::Result<usize> {
        DeviceHandle::write_control(self, request_type, request, value, index, buf, timeout)
    }

    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool> {
        DeviceHandle::kernel_driver_active(self, interface)
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::detach_kernel_driver(self, interface)
    }

    fn attach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::attach_kernel_driver(self, interface)
    }

    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::claim_interface(self, interface)
    }

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::release_interface(self, interface)
    }
}

/// Where a device sits in the USB topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub bus: u8,
    pub address: u8,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bus {:03} address {:03}", self.bus, self.address)
    }
}

/// An enumerated, not yet opened, USB device.
pub trait Candidate {
    type Transport: ControlTransport;

    /// # Errors
    ///
    /// Fails when the device descriptor cannot be read.
    fn identity(&self) -> rusb::Result<DeviceIdentity>;

    fn location(&self) -> Location;

    /// # Errors
    fn open(&self) -> rusb::Result<Self::Transport>;
}

impl<C> Candidate for Device<C>
where
    C: UsbContext,
{
    type Transport = DeviceHandle<C>;

    fn identity(&self) -> rusb::Result<DeviceIdentity> {
        let desc = self.device_descriptor()?;
        Ok(DeviceIdentity::new(desc.vendor_id(), desc.product_id()))
    }

    fn location(&self) -> Location {
        Location {
            bus: self.bus_number(),
            address: self.address(),
        }
    }

    fn open(&self) -> rusb::Result<Self::Transport> {
        Device::open(self)
    }
}

#[cfg(test)]
mod tests {
    use protocol::Request;
    use rusb::{Direction, Recipient, RequestType};

    use super::Location;

    #[test]
    fn test_request_type_matches_libusb() {
        assert_eq!(
            Request::SetSpeed.request_type(),
            rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device)
        );
        assert_eq!(
            Request::GetSpeed.request_type(),
            rusb::request_type(Direction::In, RequestType::Vendor, Recipient::Device)
        );
        assert_eq!(
            Request::GetTacho.request_type(),
            rusb::request_type(Direction::In, RequestType::Vendor, Recipient::Device)
        );
    }

    #[test]
    fn test_location_display() {
        let location = Location { bus: 1, address: 12 };
        assert_eq!(location.to_string(), "bus 001 address 012");
    }
}
