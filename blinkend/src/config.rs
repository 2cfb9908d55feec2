use crate::Error;
use blinken::{Settings, state::period_in_range};
use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub(crate) struct Config {
	#[envconfig(from = "LED_GPIO", default = "504")]
	pub gpio: u32,
	#[envconfig(from = "LED_BLINK_PERIOD", default = "1000")]
	pub blink_period: u32,
	#[envconfig(from = "GPIO_SYSFS_ROOT", default = "/sys/class/gpio")]
	pub gpio_sysfs_root: String,
	#[envconfig(from = "LED_SOCKET", default = "/run/ebb.sock")]
	pub socket: String,
	#[envconfig(from = "USE_JOURNALD", default = "0")]
	#[allow(unused)]
	pub use_journald: u8,
	#[envconfig(from = "LEVEL", default = "info")]
	pub log_level: String,
	#[envconfig(from = "VERBOSE", default = "0")]
	pub verbose: u8,
}

impl Config {
	/// The controller settings, once the initial period has been checked.
	pub fn settings(&self) -> Result<Settings, Error> {
		if !period_in_range(self.blink_period) {
			return Err(Error::InvalidPeriod(self.blink_period));
		}

		Ok(Settings {
			gpio: self.gpio,
			period_ms: self.blink_period,
		})
	}
}
