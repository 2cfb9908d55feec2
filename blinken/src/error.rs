use crate::{pin, registry};
use std::io;

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("failed to acquire gpio {gpio}")]
	PinAcquire {
		gpio: u32,
		#[source]
		source: pin::Error,
	},
	#[error("failed to register attribute group {name}")]
	Register {
		name: String,
		#[source]
		source: registry::Error,
	},
	#[error("failed to start the flash task")]
	TaskStart(#[source] io::Error),
	#[error("failed to drive gpio")]
	PinWrite(#[source] pin::Error),
	#[error("failed to release gpio")]
	PinRelease(#[source] pin::Error),
}

/// Broad classes of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// The pin or the attribute namespace could not be obtained.
	ResourceAcquisition,
	/// The blink worker could not be started.
	TaskStart,
	/// Driving or releasing an acquired pin failed.
	PinIo,
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::PinAcquire { .. } | Self::Register { .. } => ErrorKind::ResourceAcquisition,
			Self::TaskStart(_) => ErrorKind::TaskStart,
			Self::PinWrite(_) | Self::PinRelease(_) => ErrorKind::PinIo,
		}
	}
}
