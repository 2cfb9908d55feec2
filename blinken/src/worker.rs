//! The periodic task driving the pin.

use crate::{
	error::Error,
	pin::{self, OutputPin},
	state::ConfigState,
};
use async_io::Timer;
use async_std::{
	channel::{self, Receiver, Sender},
	task::{self, JoinHandle},
};
use futures::{FutureExt, select};
use log::{debug, error, info};
use std::{
	sync::{
		Arc, Mutex, PoisonError,
		atomic::{AtomicU8, Ordering},
	},
	time::Duration,
};

/// A pin shared between the worker and whoever started it.
pub type SharedPin<P> = Arc<Mutex<P>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerStatus {
	Running = 0,
	/// A stop was requested; the worker exits at the end of its current tick.
	Stopping = 1,
	Stopped = 2,
}

impl WorkerStatus {
	const fn from_raw(raw: u8) -> Self {
		match raw {
			0 => Self::Running,
			1 => Self::Stopping,
			_ => Self::Stopped,
		}
	}
}

/// Handle to a running flash task.
pub struct BlinkWorker {
	status: Arc<AtomicU8>,
	stop: Sender<()>,
	handle: JoinHandle<Result<(), pin::Error>>,
}

impl BlinkWorker {
	/// Starts the flash task. The first tick happens immediately.
	pub fn spawn<P: OutputPin>(state: Arc<ConfigState>, pin: SharedPin<P>) -> Result<Self, Error> {
		let status = Arc::new(AtomicU8::new(WorkerStatus::Running as u8));
		let (stop, stopped) = channel::bounded(1);

		let handle = task::Builder::new()
			.name("led-flash".to_string())
			.spawn(run(state, pin, status.clone(), stopped))
			.map_err(Error::TaskStart)?;

		Ok(Self {
			status,
			stop,
			handle,
		})
	}

	pub fn status(&self) -> WorkerStatus {
		WorkerStatus::from_raw(self.status.load(Ordering::Acquire))
	}

	/// Asks the task to stop and waits until it has.
	///
	/// A sleeping task wakes up immediately; no further pin writes happen.
	/// If the task had already died on a pin write, that error is returned.
	pub async fn stop(self) -> Result<(), Error> {
		// a task that already stopped on its own stays Stopped
		let _ = self.status.compare_exchange(
			WorkerStatus::Running as u8,
			WorkerStatus::Stopping as u8,
			Ordering::AcqRel,
			Ordering::Acquire,
		);
		self.stop.close();

		self.handle.await.map_err(Error::PinWrite)
	}
}

async fn run<P: OutputPin>(
	state: Arc<ConfigState>,
	pin: SharedPin<P>,
	status: Arc<AtomicU8>,
	stopped: Receiver<()>,
) -> Result<(), pin::Error> {
	info!("flash task has started running");

	let result = flash(&state, &pin, &status, &stopped).await;
	status.store(WorkerStatus::Stopped as u8, Ordering::Release);

	match &result {
		Ok(()) => info!("flash task has run to completion"),
		Err(err) => error!("flash task stopped after failing to drive the pin: {err:?}"),
	}

	result
}

async fn flash<P: OutputPin>(
	state: &ConfigState,
	pin: &Mutex<P>,
	status: &AtomicU8,
	stopped: &Receiver<()>,
) -> Result<(), pin::Error> {
	while status.load(Ordering::Acquire) == WorkerStatus::Running as u8 {
		let level = state.advance();
		pin.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.set_level(level)?;

		let half_period = Duration::from_millis(u64::from(state.period_ms() / 2));

		select! {
			_ = Timer::after(half_period).fuse() => {},
			_ = stopped.recv().fuse() => {
				debug!("flash task woken by stop request");
				break;
			},
		}
	}

	Ok(())
}
