//! The `mode` and `blinkPeriod` attributes.
//!
//! Writes are tolerant: every write is accepted in full by the I/O layer,
//! even when the value is unusable. Whether the value took effect is
//! reported separately through [`Outcome`] and a debug log record.

use crate::{mode::Mode, state::ConfigState};
use log::debug;
use std::sync::Arc;

/// Result of writing to an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Store {
	/// Bytes accepted from the writer. Always the full input length.
	pub consumed: usize,
	pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	/// The value was valid and is now in effect.
	Applied,
	/// The value was malformed or out of range; nothing changed.
	Ignored,
}

impl Store {
	fn new(buf: &[u8], applied: bool) -> Self {
		Self {
			consumed: buf.len(),
			outcome: if applied {
				Outcome::Applied
			} else {
				Outcome::Ignored
			},
		}
	}
}

/// A named configuration field readable and writable from the outside.
pub trait Attribute: Send + Sync {
	/// The name the attribute is published under.
	fn name(&self) -> &'static str;

	/// Renders the current value, newline terminated.
	fn show(&self) -> String;

	/// Parses and applies a write.
	fn store(&self, buf: &[u8]) -> Store;
}

/// Strips a single trailing `\n` or `\r\n`.
fn strip_line_terminator(buf: &[u8]) -> &[u8] {
	let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
	buf.strip_suffix(b"\r").unwrap_or(buf)
}

/// Scans a leading unsigned decimal the way `sscanf("%u")` would.
///
/// Leading whitespace and a sign are skipped over; no digits at all yields
/// zero. Returns `None` for negative or overflowing values.
fn scan_unsigned(buf: &[u8]) -> Option<u32> {
	let start = buf
		.iter()
		.position(|b| !b.is_ascii_whitespace())
		.unwrap_or(buf.len());
	let buf = &buf[start..];

	let (negative, buf) = match buf.split_first() {
		Some((b'-', rest)) => (true, rest),
		Some((b'+', rest)) => (false, rest),
		_ => (false, buf),
	};

	let mut value: u32 = 0;
	for digit in buf.iter().take_while(|b| b.is_ascii_digit()) {
		value = value.checked_mul(10)?.checked_add(u32::from(digit - b'0'))?;
	}

	if negative && value != 0 {
		None
	} else {
		Some(value)
	}
}

pub struct ModeAttribute {
	state: Arc<ConfigState>,
}

impl ModeAttribute {
	pub fn new(state: Arc<ConfigState>) -> Self {
		Self { state }
	}
}

impl Attribute for ModeAttribute {
	fn name(&self) -> &'static str {
		"mode"
	}

	fn show(&self) -> String {
		format!("{}\n", self.state.mode())
	}

	fn store(&self, buf: &[u8]) -> Store {
		match Mode::parse(strip_line_terminator(buf)) {
			Some(mode) => {
				self.state.set_mode(mode);
				Store::new(buf, true)
			}
			None => {
				debug!(
					"ignoring unrecognized mode: {:?}",
					String::from_utf8_lossy(buf)
				);
				Store::new(buf, false)
			}
		}
	}
}

pub struct PeriodAttribute {
	state: Arc<ConfigState>,
}

impl PeriodAttribute {
	pub fn new(state: Arc<ConfigState>) -> Self {
		Self { state }
	}
}

impl Attribute for PeriodAttribute {
	fn name(&self) -> &'static str {
		"blinkPeriod"
	}

	fn show(&self) -> String {
		format!("{}\n", self.state.period_ms())
	}

	fn store(&self, buf: &[u8]) -> Store {
		let applied = scan_unsigned(buf).is_some_and(|period| self.state.set_period_ms(period));

		if !applied {
			debug!(
				"ignoring out of range blink period: {:?}",
				String::from_utf8_lossy(buf)
			);
		}

		Store::new(buf, applied)
	}
}
