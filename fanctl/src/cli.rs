use std::{
    io::{self, Write},
    num::ParseIntError,
    time::Duration,
};

use anyhow::Context as _;
use clap::{ArgAction, Parser};
use protocol::{DEFAULT_FAN_SPEED, DeviceIdentity, FAN_COUNT, TRANSFER_TIMEOUT_MS, WATCHDOG_SECS};
use thiserror::Error as ThisError;

use crate::{
    AnyResult, ClientConfig, ControlTransport, DeviceLocator, Error, FanController, Location,
};

/// Set and read the fan speeds of the four-channel USB fan controller.
///
/// With a single SPEED every fan gets it, with four each fan gets its own.
/// The current speeds and tachometer values are printed afterwards.
#[derive(Debug, Parser)]
#[command(name = "fanctl", version, about)]
pub struct Args {
    /// Fan speed, 0 (stopped) to 255 (full). Omit to only read the device.
    #[arg(value_name = "SPEED", allow_negative_numbers = true)]
    pub speeds: Vec<i32>,

    /// USB vendor ID, in hex.
    #[arg(long, value_parser = parse_hex, default_value = "16c0")]
    pub vendor_id: u16,

    /// USB product ID, in hex.
    #[arg(long, value_parser = parse_hex, default_value = "05df")]
    pub product_id: u16,

    /// Bus number of the device to use when several are plugged in.
    #[arg(long, requires = "address")]
    pub bus: Option<u8>,

    /// Address of the device to use when several are plugged in.
    #[arg(long, requires = "bus")]
    pub address: Option<u8>,

    /// Do not claim the device interface, letting other programs use it
    /// concurrently.
    #[arg(long)]
    pub shared: bool,

    /// Timeout of each USB transfer, in milliseconds.
    #[arg(
        long,
        value_name = "MS",
        default_value_t = TRANSFER_TIMEOUT_MS,
        value_parser = clap::value_parser!(u64).range(1..=u64::from(u32::MAX)),
    )]
    pub timeout_ms: u64,

    /// Log to the systemd journal instead of stderr.
    #[arg(long)]
    pub journald: bool,

    /// Increase logging verbosity, may be repeated.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    #[must_use]
    pub fn locator(&self) -> DeviceLocator {
        let locator = DeviceLocator::new(DeviceIdentity::new(self.vendor_id, self.product_id));

        match (self.bus, self.address) {
            (Some(bus), Some(address)) => locator.at(Location { bus, address }),
            _ => locator,
        }
    }

    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            exclusive: !self.shared,
            ..ClientConfig::default()
        }
    }

    /// Per-channel speeds to set, if any.
    ///
    /// # Errors
    pub fn speeds(&self) -> Result<Option<[i32; FAN_COUNT]>, SpeedCountError> {
        match *self.speeds.as_slice() {
            [] => Ok(None),
            [speed] => Ok(Some([speed; FAN_COUNT])),
            [f1, f2, f3, f4] => Ok(Some([f1, f2, f3, f4])),
            _ => Err(SpeedCountError(self.speeds.len())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("expected 0, 1 or {FAN_COUNT} speeds, got {0}")]
pub struct SpeedCountError(pub usize);

/// # Errors
pub fn run(args: &Args) -> AnyResult<()> {
    let speeds = args.speeds()?;

    let context = rusb::Context::new()
        .map_err(Error::Usb)
        .context("unable to initialize libusb")?;

    let controller = args
        .locator()
        .locate_usb(&context, args.client_config())
        .context("opening fan controller")?;

    report(&controller, speeds, &mut io::stdout().lock())?;
    controller.close()?;

    Ok(())
}

/// Applies `speeds`, if any, then prints the speed and tacho readings.
///
/// # Errors
pub fn report<T, W>(
    controller: &FanController<T>,
    speeds: Option<[i32; FAN_COUNT]>,
    out: &mut W,
) -> AnyResult<()>
where
    T: ControlTransport,
    W: Write,
{
    if let Some([f1, f2, f3, f4]) = speeds {
        controller.set_speed(f1, f2, f3, f4)?;
        tracing::info!(
            "device returns to speed {DEFAULT_FAN_SPEED} if no new speed arrives within {WATCHDOG_SECS}s"
        );
    }

    writeln!(out, "{:?}", controller.speed()?.channels())?;
    writeln!(out, "{:?}", controller.tacho()?.channels())?;

    Ok(())
}

/// Process exit status for a failed [`run`].
#[must_use]
pub fn exit_code(error: &anyhow::Error) -> u8 {
    if error.downcast_ref::<SpeedCountError>().is_some() {
        return 2;
    }

    match error.downcast_ref::<Error>() {
        Some(Error::InvalidArgument(_) | Error::InvalidTimeout(_)) => 2,
        Some(Error::DeviceNotFound(_) | Error::AmbiguousDevice { .. }) => 3,
        Some(Error::Transfer { .. }) => 4,
        _ => 1,
    }
}

fn parse_hex(value: &str) -> Result<u16, ParseIntError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    u16::from_str_radix(digits, 16)
}
