mod config;
mod server;
mod sysfs;

use self::{config::Config, sysfs::SysfsGpio};
use async_std::channel;
use blinken::{Namespace, Supervisor};
use envconfig::Envconfig;
use log::{error, info, warn};
use std::{io, path::Path, str::FromStr};

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
	#[error("i/o error")]
	Io(#[from] io::Error),
	#[error("failed to read configuration from the environment")]
	Config(#[from] envconfig::Error),
	#[error("invalid LEVEL: {0}")]
	LogLevel(String),
	#[error("initial blink period of {0}ms is out of range (must be 2..=10000)")]
	InvalidPeriod(u32),
	#[error("failed to install signal handler")]
	Signal(#[from] ctrlc::Error),
	#[error("led controller error")]
	Led(#[from] blinken::Error),
}

fn init_logging(config: &Config) -> Result<(), Error> {
	let log_level = log::LevelFilter::from_str(&config.log_level)
		.map_err(|_| Error::LogLevel(config.log_level.clone()))?;

	log::set_max_level(log_level);

	#[cfg(all(not(feature = "journald"), not(feature = "stderr")))]
	compile_error!("one of 'journald' and/or 'stderr' must be specified as features");

	#[allow(unused)]
	let should_fallback = true;

	#[cfg(feature = "journald")]
	let should_fallback = {
		if config.use_journald != 0 {
			systemd_journal_logger::JournalLog::default()
				.with_extra_fields(vec![("VERSION", env!("CARGO_PKG_VERSION"))])
				.with_syslog_identifier("blinkend".to_string())
				.install()
				.expect("failed to start journald logger");
			false
		} else {
			true
		}
	};

	#[cfg(feature = "stderr")]
	if should_fallback {
		let mut slog = stderrlog::new();

		if config.verbose == 0 {
			slog.module(module_path!()).module("blinken");
		}

		slog.show_module_names(true)
			.verbosity(log_level)
			.timestamp(stderrlog::Timestamp::Millisecond)
			.init()
			.expect("failed to start stderr logger");
	}

	Ok(())
}

#[async_std::main]
async fn main() -> Result<(), Error> {
	let config = Config::init_from_env()?;
	init_logging(&config)?;

	info!("starting blinkend version {}", env!("CARGO_PKG_VERSION"));

	let settings = config.settings()?;

	let (shutdown, shutdown_requested) = channel::bounded(1);
	ctrlc::set_handler(move || {
		if shutdown.try_send(()).is_err() {
			warn!("shutdown already in progress");
		}
	})?;

	let namespace = Namespace::new();
	let gpio = SysfsGpio::new(&config.gpio_sysfs_root);
	let led = Supervisor::start(&gpio, namespace.clone(), settings)?;

	let socket = Path::new(&config.socket);
	let listener = match server::bind(socket).await {
		Ok(listener) => listener,
		Err(err) => {
			error!("failed to bind attribute socket {}: {err}", config.socket);
			led.shutdown().await?;
			return Err(err.into());
		}
	};

	info!(
		"led {} running; attributes published on {}",
		led.name(),
		config.socket
	);

	let served = server::serve(listener, namespace, shutdown_requested).await;
	if let Err(err) = &served {
		error!("attribute server stopped: {err:?}");
	}

	info!("shutting down {}", led.name());
	led.shutdown().await?;

	if let Err(err) = async_std::fs::remove_file(socket).await {
		warn!("failed to remove socket file {}: {err}", config.socket);
	}

	served?;
	info!("goodbye");
	Ok(())
}
