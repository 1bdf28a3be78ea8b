//! Simulated fan controller behaving like the device firmware.

use std::{cell::RefCell, rc::Rc, thread, time::Duration};

use protocol::{DEFAULT_FAN_SPEED, DeviceIdentity, FAN_COUNT, Request};

use crate::transport::{Candidate, ControlTransport, Location};

const TYPE_MASK: u8 = 0x60;
const TYPE_VENDOR: u8 = 0x40;

/// A control transfer as seen by the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorded {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub data: Vec<u8>,
    pub timeout: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Every transfer stalls.
    Stall,
    /// Every transfer blocks for its whole timeout, then times out.
    Hang,
    /// Transfers move only this many bytes.
    Short(usize),
}

#[derive(Debug)]
pub struct SimState {
    pub speeds: [u8; FAN_COUNT],
    pub tacho_counts: [u8; FAN_COUNT],
    pub transfers: Vec<Recorded>,
    pub fault: Option<Fault>,
    pub kernel_driver_active: bool,
    pub claimed: bool,
    pub claim_error: Option<rusb::Error>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            speeds: [DEFAULT_FAN_SPEED; FAN_COUNT],
            tacho_counts: [0; FAN_COUNT],
            transfers: Vec::new(),
            fault: None,
            kernel_driver_active: false,
            claimed: false,
            claim_error: None,
        }
    }
}

/// Cheaply cloneable handle, clones share the same device state.
#[derive(Clone, Debug, Default)]
pub struct SimulatedFan(Rc<RefCell<SimState>>);

impl SimulatedFan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fault(fault: Fault) -> Self {
        let fan = Self::new();
        fan.0.borrow_mut().fault = Some(fault);
        fan
    }

    pub fn state(&self) -> std::cell::RefMut<'_, SimState> {
        self.0.borrow_mut()
    }

    pub fn transfers(&self) -> Vec<Recorded> {
        self.0.borrow().transfers.clone()
    }

    fn record(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) {
        self.0.borrow_mut().transfers.push(Recorded {
            request_type,
            request,
            value,
            index,
            data: data.to_vec(),
            timeout,
        });
    }

    fn fault(&self) -> Option<Fault> {
        self.0.borrow().fault
    }
}

impl ControlTransport for SimulatedFan {
    fn read_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> rusb::Result<usize> {
        self.record(request_type, request, value, index, &[], timeout);

        let data = match (request_type & TYPE_MASK, Request::try_from(request)) {
            (TYPE_VENDOR, Ok(Request::GetSpeed)) => self.0.borrow().speeds,
            (TYPE_VENDOR, Ok(Request::GetTacho)) => self.0.borrow().tacho_counts,
            // Unhandled requests return no data.
            _ => return Ok(0),
        };

        let len = match self.fault() {
            Some(Fault::Stall) => return Err(rusb::Error::Pipe),
            Some(Fault::Hang) => {
                thread::sleep(timeout);
                return Err(rusb::Error::Timeout);
            }
            Some(Fault::Short(len)) => len.min(buf.len()),
            None => buf.len().min(FAN_COUNT),
        };

        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
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
        self.record(request_type, request, value, index, buf, timeout);

        let len = match self.fault() {
            Some(Fault::Stall) => return Err(rusb::Error::Pipe),
            Some(Fault::Hang) => {
                thread::sleep(timeout);
                return Err(rusb::Error::Timeout);
            }
            Some(Fault::Short(len)) => len.min(buf.len()),
            None => buf.len(),
        };

        let is_set_speed = request_type & TYPE_MASK == TYPE_VENDOR
            && matches!(Request::try_from(request), Ok(Request::SetSpeed));

        if let (true, Ok(speeds)) = (is_set_speed, <[u8; FAN_COUNT]>::try_from(&buf[..len])) {
            self.0.borrow_mut().speeds = speeds;
        }

        Ok(len)
    }

    fn kernel_driver_active(&self, _interface: u8) -> rusb::Result<bool> {
        Ok(self.0.borrow().kernel_driver_active)
    }

    fn detach_kernel_driver(&mut self, _interface: u8) -> rusb::Result<()> {
        self.0.borrow_mut().kernel_driver_active = false;
        Ok(())
    }

    fn attach_kernel_driver(&mut self, _interface: u8) -> rusb::Result<()> {
        self.0.borrow_mut().kernel_driver_active = true;
        Ok(())
    }

    fn claim_interface(&mut self, _interface: u8) -> rusb::Result<()> {
        let mut state = self.0.borrow_mut();

        if let Some(err) = state.claim_error {
            return Err(err);
        }

        if state.claimed {
            return Err(rusb::Error::Busy);
        }

        state.claimed = true;
        Ok(())
    }

    fn release_interface(&mut self, _interface: u8) -> rusb::Result<()> {
        let mut state = self.0.borrow_mut();

        if !state.claimed {
            return Err(rusb::Error::NotFound);
        }

        state.claimed = false;
        Ok(())
    }
}

/// An enumerated simulated device.
#[derive(Clone, Debug)]
pub struct SimulatedCandidate {
    pub identity: Option<DeviceIdentity>,
    pub location: Location,
    pub device: SimulatedFan,
}

impl SimulatedCandidate {
    pub fn new(identity: DeviceIdentity, bus: u8, address: u8) -> Self {
        Self {
            identity: Some(identity),
            location: Location { bus, address },
            device: SimulatedFan::new(),
        }
    }

    /// A device whose descriptor cannot be read.
    pub fn unreadable(bus: u8, address: u8) -> Self {
        Self {
            identity: None,
            location: Location { bus, address },
            device: SimulatedFan::new(),
        }
    }
}

impl Candidate for SimulatedCandidate {
    type Transport = SimulatedFan;

    fn identity(&self) -> rusb::Result<DeviceIdentity> {
        self.identity.ok_or(rusb::Error::Io)
    }

    fn location(&self) -> Location {
        self.location
    }

    fn open(&self) -> rusb::Result<Self::Transport> {
        Ok(self.device.clone())
    }
}
