use core::fmt;

/// The operating mode of the LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Mode {
	/// The LED is held low.
	Off = 0,
	/// The LED is held high.
	On = 1,
	/// The LED toggles every half period.
	#[default]
	Flash = 2,
}

impl Mode {
	/// Parses one of the literal tokens `on`, `off` or `flash`.
	///
	/// The match is exact; case and surrounding whitespace matter.
	pub fn parse(token: &[u8]) -> Option<Self> {
		match token {
			b"off" => Some(Self::Off),
			b"on" => Some(Self::On),
			b"flash" => Some(Self::Flash),
			_ => None,
		}
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Off => "off",
			Self::On => "on",
			Self::Flash => "flash",
		}
	}

	pub(crate) const fn from_raw(raw: u8) -> Self {
		match raw {
			0 => Self::Off,
			1 => Self::On,
			_ => Self::Flash,
		}
	}
}

impl fmt::Display for Mode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<Mode> for u8 {
	#[inline]
	fn from(value: Mode) -> Self {
		value as u8
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_exact_tokens() {
		assert_eq!(Mode::parse(b"off"), Some(Mode::Off));
		assert_eq!(Mode::parse(b"on"), Some(Mode::On));
		assert_eq!(Mode::parse(b"flash"), Some(Mode::Flash));
	}

	#[test]
	fn rejects_everything_else() {
		for token in ["", "o", "ON", "blink", "flash ", "onn", "of"] {
			assert_eq!(Mode::parse(token.as_bytes()), None, "{token:?}");
		}
	}

	#[test]
	fn raw_value_survives_conversion() {
		for mode in [Mode::Off, Mode::On, Mode::Flash] {
			assert_eq!(Mode::from_raw(mode.into()), mode);
			assert_eq!(mode.to_string(), mode.as_str());
		}
	}
}
