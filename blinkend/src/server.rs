//! Publishes the attribute namespace on a Unix socket.
//!
//! One request per line:
//!
//! - `list` returns every attribute path, space separated
//! - `show <group>/<attr>` returns the attribute's value
//! - `store <group>/<attr> <value>` writes `<value>` plus a newline, the way
//!   `echo` into a sysfs file would, and returns `ok`
//!
//! Failures are reported as `error: <reason>`. Every response ends in a
//! newline. A request longer than [`MAX_REQUEST_LEN`] bytes is answered
//! with `error: request too long` and the connection is closed.

use async_std::{
	channel::Receiver,
	fs,
	io::{BufReader, ErrorKind},
	os::unix::net::{UnixListener, UnixStream},
	prelude::*,
	task,
};
use blinken::{Namespace, Outcome};
use futures::{FutureExt, select};
use log::{debug, error, info, trace, warn};
use std::{io, os::unix::fs::PermissionsExt, path::Path};

/// Longest accepted request line, newline excluded. One page, like a sysfs
/// store.
pub(crate) const MAX_REQUEST_LEN: usize = 4096;

/// Binds `path`, replacing a stale socket file left from an earlier run.
pub(crate) async fn bind(path: &Path) -> io::Result<UnixListener> {
	match fs::remove_file(path).await {
		Ok(()) => {
			debug!("removed existing socket file: {}", path.display());
		}
		Err(e) if e.kind() == ErrorKind::NotFound => {
			debug!("no existing socket file to clean: {}", path.display());
		}
		Err(e) => {
			warn!("failed to remove existing socket file: {e}");
			return Err(e);
		}
	}

	let listener = UnixListener::bind(path).await?;
	debug!("setting permissions for socket: {}", path.display());
	fs::set_permissions(path, fs::Permissions::from_mode(0o660)).await?;
	info!("listening on {}", path.display());

	Ok(listener)
}

/// Accepts connections until `shutdown` fires or is closed.
pub(crate) async fn serve(
	listener: UnixListener,
	namespace: Namespace,
	shutdown: Receiver<()>,
) -> io::Result<()> {
	loop {
		select! {
			accepted = listener.accept().fuse() => {
				let (stream, _) = accepted?;
				debug!("accepted attribute connection");

				let namespace = namespace.clone();
				task::spawn(async move {
					if let Err(err) = handle_connection(stream, namespace).await {
						error!("attribute connection encountered error: {err:?}");
					}
				});
			},
			_ = shutdown.recv().fuse() => {
				debug!("attribute server shutting down");
				return Ok(());
			},
		}
	}
}

async fn handle_connection(stream: UnixStream, namespace: Namespace) -> io::Result<()> {
	let mut reader = BufReader::new(stream.clone());
	let mut writer = stream;
	let mut buf = Vec::new();

	loop {
		buf.clear();
		let read = (&mut reader)
			.take(MAX_REQUEST_LEN as u64 + 1)
			.read_until(b'\n', &mut buf)
			.await?;

		if read == 0 {
			return Ok(());
		}

		let line = match buf.strip_suffix(b"\n") {
			Some(line) => line,
			None if buf.len() > MAX_REQUEST_LEN => {
				warn!("closing attribute connection after an oversized request");
				writer.write_all(b"error: request too long\n").await?;
				return Ok(());
			}
			// last request, unterminated
			None => &buf[..],
		};

		let line = String::from_utf8_lossy(line);
		trace!("request: {line:?}");
		let response = respond(&namespace, &line);
		writer.write_all(response.as_bytes()).await?;
	}
}

fn respond(namespace: &Namespace, line: &str) -> String {
	let line = line.trim_end_matches('\r');
	let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

	match command {
		"list" => {
			let mut paths = namespace.list().join(" ");
			paths.push('\n');
			paths
		}
		"show" => match namespace.show(rest) {
			Ok(value) => value,
			Err(err) => format!("error: {err}\n"),
		},
		"store" => {
			let (path, value) = rest.split_once(' ').unwrap_or((rest, ""));
			let mut buf = Vec::with_capacity(value.len() + 1);
			buf.extend_from_slice(value.as_bytes());
			buf.push(b'\n');

			match namespace.store(path, &buf) {
				Ok(store) => {
					if store.outcome == Outcome::Ignored {
						debug!("write to {path} left it unchanged: {value:?}");
					}
					"ok\n".to_string()
				}
				Err(err) => format!("error: {err}\n"),
			}
		}
		"" => "error: empty request\n".to_string(),
		unknown => format!("error: unknown command: {unknown}\n"),
	}
}
