//! GPIO lines through the legacy `/sys/class/gpio` interface.
//!
//! Exporting a line makes it show up as `gpio<N>/` for other tools while
//! it is held.

use blinken::pin::{Error, Gpio, OutputPin};
use log::{debug, warn};
use std::{
	fs, io,
	path::{Path, PathBuf},
};

pub(crate) struct SysfsGpio {
	root: PathBuf,
}

impl SysfsGpio {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}
}

fn unexport(root: &Path, line: u32) -> io::Result<()> {
	fs::write(root.join("unexport"), line.to_string())
}

impl Gpio for SysfsGpio {
	type Pin = SysfsPin;

	fn acquire(&self, line: u32, initial: bool) -> Result<SysfsPin, Error> {
		debug!("exporting gpio {line} from {}", self.root.display());

		fs::write(self.root.join("export"), line.to_string()).map_err(|err| {
			if err.kind() == io::ErrorKind::ResourceBusy {
				Error::Busy(line)
			} else {
				Error::Io(err)
			}
		})?;

		let dir = self.root.join(format!("gpio{line}"));

		// "high"/"low" switch to output and set the level in one write
		let direction = if initial { "high" } else { "low" };
		if let Err(err) = fs::write(dir.join("direction"), direction) {
			if let Err(err) = unexport(&self.root, line) {
				warn!("failed to unexport gpio {line}: {err}");
			}
			return Err(err.into());
		}

		Ok(SysfsPin {
			line,
			root: self.root.clone(),
			value: dir.join("value"),
			exported: true,
		})
	}
}

/// An exported line. Dropping it without [`OutputPin::release`] unexports
/// it all the same.
pub(crate) struct SysfsPin {
	line: u32,
	root: PathBuf,
	value: PathBuf,
	exported: bool,
}

impl OutputPin for SysfsPin {
	fn set_level(&mut self, on: bool) -> Result<(), Error> {
		fs::write(&self.value, if on { "1" } else { "0" })?;
		Ok(())
	}

	fn release(mut self) -> Result<(), Error> {
		debug!("unexporting gpio {}", self.line);
		self.exported = false;
		unexport(&self.root, self.line)?;
		Ok(())
	}
}

impl Drop for SysfsPin {
	fn drop(&mut self) {
		if self.exported {
			warn!("gpio {} dropped without release; unexporting", self.line);
			if let Err(err) = unexport(&self.root, self.line) {
				warn!("failed to unexport gpio {}: {err}", self.line);
			}
		}
	}
}
