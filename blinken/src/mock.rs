//! Recording GPIO used by the worker and supervisor tests.

use crate::pin::{Error, Gpio, OutputPin};
use std::{
	io,
	sync::{Arc, Mutex},
	time::Instant,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
	Acquire { line: u32, level: bool },
	Set { at: Instant, level: bool },
	Release,
}

#[derive(Clone, Default)]
pub(crate) struct MockGpio {
	events: Arc<Mutex<Vec<Event>>>,
	busy: bool,
	/// Writes beyond this count fail.
	write_budget: Option<usize>,
}

impl MockGpio {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn busy() -> Self {
		Self {
			busy: true,
			..Self::default()
		}
	}

	pub fn failing_after(writes: usize) -> Self {
		Self {
			write_budget: Some(writes),
			..Self::default()
		}
	}

	pub fn events(&self) -> Vec<Event> {
		self.events.lock().unwrap().clone()
	}

	pub fn levels(&self) -> Vec<bool> {
		self.sets().into_iter().map(|(_, level)| level).collect()
	}

	pub fn sets(&self) -> Vec<(Instant, bool)> {
		self.events()
			.into_iter()
			.filter_map(|event| match event {
				Event::Set { at, level } => Some((at, level)),
				_ => None,
			})
			.collect()
	}

	pub fn released(&self) -> bool {
		self.events().contains(&Event::Release)
	}
}

impl Gpio for MockGpio {
	type Pin = MockPin;

	fn acquire(&self, line: u32, initial: bool) -> Result<MockPin, Error> {
		if self.busy {
			return Err(Error::Busy(line));
		}

		self.events.lock().unwrap().push(Event::Acquire {
			line,
			level: initial,
		});

		Ok(MockPin {
			events: self.events.clone(),
			write_budget: self.write_budget,
		})
	}
}

pub(crate) struct MockPin {
	events: Arc<Mutex<Vec<Event>>>,
	write_budget: Option<usize>,
}

impl OutputPin for MockPin {
	fn set_level(&mut self, on: bool) -> Result<(), Error> {
		match &mut self.write_budget {
			Some(0) => return Err(io::Error::other("mock pin write failure").into()),
			Some(n) => *n -= 1,
			None => {}
		}

		self.events.lock().unwrap().push(Event::Set {
			at: Instant::now(),
			level: on,
		});
		Ok(())
	}

	fn release(self) -> Result<(), Error> {
		self.events.lock().unwrap().push(Event::Release);
		Ok(())
	}
}
