//! The record shared between the attribute handlers and the blink worker.
//!
//! Every field has exactly one writer, so each one is a plain atomic and no
//! lock is taken. Readers may see a mode or period change up to one tick
//! before or after the worker acts on it.

use crate::mode::Mode;
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

/// GPIO line driven when none is configured.
pub const DEFAULT_GPIO: u32 = 504;
/// Blink period used when none is configured.
pub const DEFAULT_PERIOD_MS: u32 = 1000;
/// Exclusive lower bound of an accepted period.
pub const MIN_PERIOD_MS: u32 = 1;
/// Inclusive upper bound of an accepted period.
pub const MAX_PERIOD_MS: u32 = 10_000;

/// Returns whether `period_ms` lies within `(1, 10000]`.
#[inline]
pub const fn period_in_range(period_ms: u32) -> bool {
	period_ms > MIN_PERIOD_MS && period_ms <= MAX_PERIOD_MS
}

#[derive(Debug)]
pub struct ConfigState {
	mode: AtomicU8,
	period_ms: AtomicU32,
	output_level: AtomicBool,
}

impl ConfigState {
	/// Creates the state in flash mode with the LED level low.
	///
	/// The supervisor drives the pin high when acquiring it, so until the
	/// first tick `output_level()` reads `false` while the pin is high. The
	/// first flash tick then writes `true`.
	///
	/// `period_ms` is taken as-is; callers validate it beforehand.
	pub fn new(period_ms: u32) -> Self {
		Self {
			mode: AtomicU8::new(Mode::Flash.into()),
			period_ms: AtomicU32::new(period_ms),
			output_level: AtomicBool::new(false),
		}
	}

	pub fn mode(&self) -> Mode {
		Mode::from_raw(self.mode.load(Ordering::Relaxed))
	}

	pub fn set_mode(&self, mode: Mode) {
		self.mode.store(mode.into(), Ordering::Relaxed);
	}

	pub fn period_ms(&self) -> u32 {
		self.period_ms.load(Ordering::Relaxed)
	}

	/// Stores `period_ms` if it is in range. Returns whether it was stored.
	pub fn set_period_ms(&self, period_ms: u32) -> bool {
		if period_in_range(period_ms) {
			self.period_ms.store(period_ms, Ordering::Relaxed);
			true
		} else {
			false
		}
	}

	/// The level most recently computed by the worker.
	pub fn output_level(&self) -> bool {
		self.output_level.load(Ordering::Relaxed)
	}

	/// Computes and stores the level for the next tick.
	pub(crate) fn advance(&self) -> bool {
		let level = match self.mode() {
			Mode::Flash => !self.output_level(),
			Mode::On => true,
			Mode::Off => false,
		};

		self.output_level.store(level, Ordering::Relaxed);
		level
	}

	/// Only called once the worker is stopped.
	pub(crate) fn force_output_level(&self, level: bool) {
		self.output_level.store(level, Ordering::Relaxed);
	}
}

impl Default for ConfigState {
	fn default() -> Self {
		Self::new(DEFAULT_PERIOD_MS)
	}
}
