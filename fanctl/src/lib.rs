pub mod cli;
mod controller;
mod error;
mod exactly_one;
mod locator;
pub mod logging;
#[cfg(test)]
mod testing;
mod transport;

pub use anyhow::Result as AnyResult;
pub use controller::{ClientConfig, FanController};
pub use error::{Error, Result, TransferError};
pub use locator::DeviceLocator;
pub use protocol;
pub use transport::{Candidate, ControlTransport, Location};
