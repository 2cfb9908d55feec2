//! Startup and shutdown sequencing.

use crate::{
	attr::{ModeAttribute, PeriodAttribute},
	error::Error,
	pin::{Gpio, OutputPin},
	registry::{AttributeGroup, Registry},
	state::{ConfigState, DEFAULT_GPIO, DEFAULT_PERIOD_MS},
	worker::{BlinkWorker, SharedPin, WorkerStatus},
};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, PoisonError};

/// Startup parameters. Both are expected to be validated already.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
	pub gpio: u32,
	pub period_ms: u32,
}

impl Settings {
	/// The attribute group name, e.g. `led504`.
	pub fn group_name(&self) -> String {
		format!("led{}", self.gpio)
	}
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			gpio: DEFAULT_GPIO,
			period_ms: DEFAULT_PERIOD_MS,
		}
	}
}

/// Owns a running LED: the pin, the published attributes and the worker.
///
/// Call [`Supervisor::shutdown`] to take the LED down. Dropping a supervisor
/// only stops the worker; the attributes stay published and the pin keeps
/// its last level until the pin implementation itself lets go of the line.
pub struct Supervisor<R: Registry, P: OutputPin> {
	name: String,
	state: Arc<ConfigState>,
	registry: R,
	pin: SharedPin<P>,
	worker: BlinkWorker,
}

impl<R: Registry, P: OutputPin> Supervisor<R, P> {
	/// Acquires the pin (driven high), publishes the attributes and starts
	/// the worker. Anything already set up is undone if a later step fails.
	pub fn start<G>(gpio: &G, registry: R, settings: Settings) -> Result<Self, Error>
	where
		G: Gpio<Pin = P>,
	{
		Self::start_with(gpio, registry, settings, BlinkWorker::spawn)
	}

	pub(crate) fn start_with<G, S>(
		gpio: &G,
		registry: R,
		settings: Settings,
		spawn: S,
	) -> Result<Self, Error>
	where
		G: Gpio<Pin = P>,
		S: FnOnce(Arc<ConfigState>, SharedPin<P>) -> Result<BlinkWorker, Error>,
	{
		info!("initializing led on gpio {}", settings.gpio);

		let pin = gpio
			.acquire(settings.gpio, true)
			.map_err(|source| Error::PinAcquire {
				gpio: settings.gpio,
				source,
			})?;

		let state = Arc::new(ConfigState::new(settings.period_ms));
		let name = settings.group_name();

		let group = AttributeGroup::new(name.as_str())
			.with(PeriodAttribute::new(state.clone()))
			.with(ModeAttribute::new(state.clone()));

		if let Err(source) = registry.register(group) {
			error!("failed to register attribute group {name}: {source}");
			release(pin);
			return Err(Error::Register { name, source });
		}

		let pin = Arc::new(Mutex::new(pin));

		let worker = match spawn(state.clone(), pin.clone()) {
			Ok(worker) => worker,
			Err(err) => {
				error!("failed to create the flash task: {err}");
				registry.unregister(&name);
				if let Some(pin) = reclaim(pin) {
					release(pin);
				}
				return Err(err);
			}
		};

		debug!("published attribute group {name}");

		Ok(Self {
			name,
			state,
			registry,
			pin,
			worker,
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn state(&self) -> &Arc<ConfigState> {
		&self.state
	}

	pub fn status(&self) -> WorkerStatus {
		self.worker.status()
	}

	/// Stops the worker, removes the attributes, turns the LED off and
	/// releases the pin, in that order.
	///
	/// Every step runs even if an earlier one failed; the first error is
	/// returned.
	pub async fn shutdown(self) -> Result<(), Error> {
		let Self {
			name,
			state,
			registry,
			pin,
			worker,
		} = self;

		let stopped = worker.stop().await;
		registry.unregister(&name);
		state.force_output_level(false);

		let result = match reclaim(pin) {
			Some(mut pin) => {
				let off = pin.off().map_err(Error::PinWrite);
				let released = pin.release().map_err(Error::PinRelease);
				off.and(released)
			}
			None => Err(Error::PinRelease(
				std::io::Error::other("gpio still shared after the flash task stopped").into(),
			)),
		};

		let result = stopped.and(result);

		match &result {
			Ok(()) => info!("{name} shut down"),
			Err(err) => warn!("{name} shut down with errors: {err}"),
		}

		result
	}
}

/// Takes the pin back once the worker no longer holds it.
fn reclaim<P>(pin: SharedPin<P>) -> Option<P> {
	Arc::try_unwrap(pin)
		.ok()
		.map(|pin| pin.into_inner().unwrap_or_else(PoisonError::into_inner))
}

fn release<P: OutputPin>(pin: P) {
	if let Err(err) = pin.release() {
		warn!("failed to release gpio while unwinding: {err}");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		ErrorKind,
		mock::{Event, MockGpio},
		registry::{self, Namespace},
	};
	use async_std::task;
	use std::time::{Duration, Instant};

	struct Full;

	impl Registry for Full {
		fn register(&self, group: AttributeGroup) -> Result<(), registry::Error> {
			Err(registry::Error::Exists(group.name))
		}

		fn unregister(&self, _name: &str) {}
	}

	fn settings(period_ms: u32) -> Settings {
		Settings {
			gpio: 17,
			period_ms,
		}
	}

	#[test]
	fn default_settings() {
		let settings = Settings::default();
		assert_eq!(settings.gpio, 504);
		assert_eq!(settings.period_ms, 1000);
		assert_eq!(settings.group_name(), "led504");
	}

	#[async_std::test]
	async fn starts_and_shuts_down() {
		let gpio = MockGpio::new();
		let ns = Namespace::new();

		let led = Supervisor::start(&gpio, ns.clone(), settings(40)).unwrap();
		assert_eq!(led.name(), "led17");
		assert_eq!(led.status(), WorkerStatus::Running);
		assert_eq!(ns.show("led17/mode").unwrap(), "flash\n");
		assert_eq!(ns.show("led17/blinkPeriod").unwrap(), "40\n");

		task::sleep(Duration::from_millis(70)).await;
		let state = led.state().clone();
		led.shutdown().await.unwrap();

		assert!(!ns.contains("led17"));
		assert!(!state.output_level());

		let events = gpio.events();
		assert_eq!(events.first(), Some(&Event::Acquire { line: 17, level: true }));
		assert_eq!(events.last(), Some(&Event::Release));
		assert_eq!(gpio.levels().last(), Some(&false));
	}

	#[async_std::test]
	async fn attribute_writes_reach_the_pin() {
		let gpio = MockGpio::new();
		let ns = Namespace::new();
		let led = Supervisor::start(&gpio, ns.clone(), settings(20)).unwrap();

		ns.store("led17/mode", b"on\n").unwrap();
		task::sleep(Duration::from_millis(50)).await;

		assert!(led.state().output_level());
		assert_eq!(gpio.levels().last(), Some(&true));

		led.shutdown().await.unwrap();
	}

	#[async_std::test]
	async fn shutdown_during_long_sleep_is_prompt() {
		let gpio = MockGpio::new();
		let led = Supervisor::start(&gpio, Namespace::new(), settings(10_000)).unwrap();

		task::sleep(Duration::from_millis(20)).await;
		let begin = Instant::now();
		led.shutdown().await.unwrap();

		assert!(begin.elapsed() < Duration::from_secs(1));
		// first tick, then the forced low level
		assert_eq!(gpio.levels(), [true, false]);
		assert!(gpio.released());
	}

	#[test]
	fn acquire_failure_publishes_nothing() {
		let gpio = MockGpio::busy();
		let ns = Namespace::new();

		let err = Supervisor::start(&gpio, ns.clone(), settings(1000))
			.err()
			.unwrap();

		assert_eq!(err.kind(), ErrorKind::ResourceAcquisition);
		assert!(matches!(err, Error::PinAcquire { gpio: 17, .. }));
		assert!(ns.list().is_empty());
		assert!(gpio.events().is_empty());
	}

	#[test]
	fn register_failure_releases_the_pin() {
		let gpio = MockGpio::new();

		let err = Supervisor::start(&gpio, Full, settings(1000)).err().unwrap();

		assert_eq!(err.kind(), ErrorKind::ResourceAcquisition);
		assert!(matches!(err, Error::Register { ref name, .. } if name == "led17"));
		assert_eq!(
			gpio.events(),
			[Event::Acquire { line: 17, level: true }, Event::Release]
		);
	}

	#[test]
	fn second_instance_on_same_line_is_rejected() {
		let ns = Namespace::new();
		let first = MockGpio::new();
		let second = MockGpio::new();

		let _led = Supervisor::start(&first, ns.clone(), settings(1000)).unwrap();
		let err = Supervisor::start(&second, ns.clone(), settings(1000))
			.err()
			.unwrap();

		assert!(matches!(err, Error::Register { .. }));
		assert!(second.released());
		assert_eq!(ns.show("led17/mode").unwrap(), "flash\n");
	}

	#[test]
	fn task_start_failure_unwinds_everything() {
		let gpio = MockGpio::new();
		let ns = Namespace::new();

		let err = Supervisor::start_with(&gpio, ns.clone(), settings(1000), |_, _| {
			Err(Error::TaskStart(std::io::Error::other("no threads left")))
		})
		.err()
		.unwrap();

		assert_eq!(err.kind(), ErrorKind::TaskStart);
		assert!(ns.list().is_empty());
		assert_eq!(
			gpio.events(),
			[Event::Acquire { line: 17, level: true }, Event::Release]
		);
	}

	#[async_std::test]
	async fn worker_failure_surfaces_at_shutdown() {
		let gpio = MockGpio::failing_after(1);
		let led = Supervisor::start(&gpio, Namespace::new(), settings(20)).unwrap();

		task::sleep(Duration::from_millis(60)).await;
		assert_eq!(led.status(), WorkerStatus::Stopped);

		let err = led.shutdown().await.unwrap_err();
		assert!(matches!(err, Error::PinWrite(_)));
		assert!(gpio.released());
	}
}
