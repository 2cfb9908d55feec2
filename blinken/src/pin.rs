//! The hardware side of the LED. Implementations live outside this crate.

use std::io;

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("gpio {0} is already in use")]
	Busy(u32),
	#[error("gpio i/o error")]
	Io(#[from] io::Error),
}

/// An acquired output line.
pub trait OutputPin: Send + 'static {
	/// Drives the line high (`true`) or low (`false`).
	fn set_level(&mut self, on: bool) -> Result<(), Error>;

	fn on(&mut self) -> Result<(), Error> {
		self.set_level(true)
	}

	fn off(&mut self) -> Result<(), Error> {
		self.set_level(false)
	}

	/// Hands the line back to the system.
	fn release(self) -> Result<(), Error>
	where
		Self: Sized;
}

/// Source of output lines.
pub trait Gpio {
	type Pin: OutputPin;

	/// Requests `line` exclusively, configures it as an output driven at
	/// `initial` and makes it visible to other tools on the system.
	fn acquire(&self, line: u32, initial: bool) -> Result<Self::Pin, Error>;
}
